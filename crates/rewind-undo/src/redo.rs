#![forbid(unsafe_code)]

//! The redo command.
//!
//! Redo entries are inverse batches produced by undo. When redo rebases one,
//! it steps over the batches it produced itself together with the undo
//! batches those reverted, since each such pair cancels out (see
//! [`crate::rebase`]).

use std::fmt;

use rewind_core::{Batch, Document, DocumentModel, Operation, Selection, TransformEngine};

use crate::config::UndoConfig;
use crate::error::UndoError;
use crate::rebase::{Reverted, revert_item};
use crate::stack::CommandStack;

/// Re-applies undone batches, most recently undone first.
pub struct RedoCommand<O> {
    stack: CommandStack<O>,
    strong_side: bool,
}

impl<O: Operation> RedoCommand<O> {
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

    /// Record an undo result for later redo.
    pub fn push(&mut self, batch: Batch<O>, selection: Selection) {
        self.stack.push(batch, selection);
        self.stack.refresh_availability();
    }

    /// Redo the most recently undone batch.
    ///
    /// Returns `Ok(None)` when there is nothing to redo.
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

        let span = tracing::debug_span!(
            "redo.execute",
            batch = %item.batch.id(),
            deltas = item.batch.deltas().len(),
            version = tracing::field::Empty,
            result = tracing::field::Empty,
        );
        let _guard = span.enter();

        let stack = &self.stack;
        let outcome = revert_item(doc, engine, &item, self.strong_side, |id| {
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
                    target: "rewind.redo",
                    created = %reverted.batch.id(),
                    "redo applied"
                );
                Ok(Some(reverted))
            }
            Err(err) => {
                span.record("result", "error");
                tracing::warn!(target: "rewind.redo", error = %err, "redo failed");
                Err(err.into())
            }
        }
    }
}

impl<O> fmt::Debug for RedoCommand<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedoCommand")
            .field("stack", &self.stack)
            .field("strong_side", &self.strong_side)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::UndoCommand;
    use rewind_core::text::{TextBuffer, TextOp, TextTransform};
    use rewind_core::BatchType;

    struct Editor {
        doc: Document<TextBuffer>,
        undo: UndoCommand<TextOp>,
        redo: RedoCommand<TextOp>,
    }

    impl Editor {
        fn new() -> Self {
            Self {
                doc: Document::new(TextBuffer::from("")),
                undo: UndoCommand::new(0, true),
                redo: RedoCommand::new(0, true),
            }
        }

        fn type_at(&mut self, position: usize, text: &str) {
            self.doc
                .apply_single(BatchType::Undoable, TextOp::insert(0, position, text))
                .unwrap();
            for record in self.doc.drain_commits() {
                self.undo.push(record.batch, record.selection_before);
            }
        }

        fn undo(&mut self) {
            let reverted = self.undo.execute(&mut self.doc, &TextTransform).unwrap().unwrap();
            self.doc.drain_commits();
            self.redo.push(reverted.batch, reverted.selection_before);
        }

        fn redo(&mut self) {
            self.redo.execute(&mut self.doc, &TextTransform).unwrap().unwrap();
            self.doc.drain_commits();
        }
    }

    #[test]
    fn empty_stack_is_a_noop() {
        let mut editor = Editor::new();
        assert!(editor
            .redo
            .execute(&mut editor.doc, &TextTransform)
            .unwrap()
            .is_none());
        assert!(!editor.redo.is_enabled());
    }

    #[test]
    fn undo_undo_redo_redo_restores_sequential_typing() {
        let mut editor = Editor::new();
        editor.type_at(0, "A");
        editor.type_at(1, "B");
        editor.undo();
        editor.undo();
        assert_eq!(editor.doc.model().as_str(), "");
        editor.redo();
        assert_eq!(editor.doc.model().as_str(), "A");
        editor.redo();
        assert_eq!(editor.doc.model().as_str(), "AB");
        assert!(!editor.redo.is_enabled());
    }

    #[test]
    fn redo_results_are_tracked_with_their_undo_batch() {
        let mut editor = Editor::new();
        editor.type_at(0, "x");
        editor.undo();
        let undo_batch = editor.redo.stack().peek().map(|i| i.batch.id()).unwrap();
        editor.redo();
        assert!(editor.redo.stack().excludes(undo_batch));
    }
}
