#![forbid(unsafe_code)]

//! The undo command.
//!
//! When undo rebases an inverse it steps over the batches it produced itself
//! together with the user batches those reverted, the same way redo treats
//! its own pairs (see [`crate::rebase`]). Redo results are real edits and
//! are rebased through.

use std::fmt;

use rewind_core::{Batch, BatchId, Document, DocumentModel, Operation, Selection, TransformEngine};

use crate::config::UndoConfig;
use crate::error::UndoError;
use crate::rebase::{Reverted, revert_item};
use crate::stack::CommandStack;

/// Reverts user batches, newest first.
pub struct UndoCommand<O> {
    stack: CommandStack<O>,
    strong_side: bool,
}

impl<O: Operation> UndoCommand<O> {
    #[must_use]
    pub fn new(max_depth: usize, strong_side: bool) -> Self {
        Self {
            stack: CommandStack::new(max_depth),
            strong_side,
        }
    }

    #[must_use]
    pub fn from_config(config: &UndoConfig) -> Self {
        Self::new(config.max_depth, config.strong_side)
    }

    #[must_use]
    pub fn stack(&self) -> &CommandStack<O> {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut CommandStack<O> {
        &mut self.stack
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.stack.is_enabled()
    }

    /// Record a batch for later undo.
    pub fn push(&mut self, batch: Batch<O>, selection: Selection) {
        self.stack.push(batch, selection);
        self.stack.refresh_availability();
    }

    /// Undo the most recent batch.
    ///
    /// Returns `Ok(None)` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Fails if the inverse cannot be rebased or applied. The document is
    /// unchanged, and the popped entry is gone.
    pub fn execute<M, E>(
        &mut self,
        doc: &mut Document<M>,
        engine: &E,
    ) -> Result<Option<Reverted<O>>, UndoError>
    where
        M: DocumentModel<Op = O>,
        E: TransformEngine<O> + ?Sized,
    {
        let Some(item) = self.stack.pop() else {
            self.stack.refresh_availability();
            return Ok(None);
        };
        self.revert(doc, engine, &item).map(Some)
    }

    /// Undo a specific batch, wherever it sits on the stack.
    ///
    /// # Errors
    ///
    /// [`UndoError::NotOnStack`] if `id` is not on the stack, otherwise as
    /// [`execute`](Self::execute).
    pub fn execute_batch<M, E>(
        &mut self,
        doc: &mut Document<M>,
        engine: &E,
        id: BatchId,
    ) -> Result<Reverted<O>, UndoError>
    where
        M: DocumentModel<Op = O>,
        E: TransformEngine<O> + ?Sized,
    {
        let item = self.stack.remove(id).ok_or(UndoError::NotOnStack(id))?;
        self.revert(doc, engine, &item)
    }

    fn revert<M, E>(
        &mut self,
        doc: &mut Document<M>,
        engine: &E,
        item: &crate::stack::StackItem<O>,
    ) -> Result<Reverted<O>, UndoError>
    where
        M: DocumentModel<Op = O>,
        E: TransformEngine<O> + ?Sized,
    {
        let span = tracing::debug_span!(
            "undo.execute",
            batch = %item.batch.id(),
            deltas = item.batch.deltas().len(),
            version = tracing::field::Empty,
            result = tracing::field::Empty,
        );
        let _guard = span.enter();

        let stack = &self.stack;
        let outcome = revert_item(doc, engine, item, self.strong_side, |id| {
            stack.partner(id)
        });
        self.stack.refresh_availability();
        span.record("version", doc.version());
        match outcome {
            Ok(reverted) => {
                self.stack
                    .track_synthesized(reverted.batch.id(), reverted.reverted);
                span.record("result", "ok");
                tracing::debug!(
                    target: "rewind.undo",
                    created = %reverted.batch.id(),
                    "undo applied"
                );
                Ok(reverted)
            }
            Err(err) => {
                span.record("result", "error");
                tracing::warn!(target: "rewind.undo", error = %err, "undo failed");
                Err(err.into())
            }
        }
    }
}

impl<O> fmt::Debug for UndoCommand<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoCommand")
            .field("stack", &self.stack)
            .field("strong_side", &self.strong_side)
            .finish()
    }
}
