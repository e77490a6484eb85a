#![forbid(unsafe_code)]

//! Wiring between a [`Document`] and the undo/redo commands.
//!
//! The manager pulls commit records from the document and decides where
//! each batch goes:
//!
//! ```text
//!  user edit ──────► Undo stack ──undo()──► inverse ──► Redo stack
//!  transparent edit  (history only)                        │
//!  undo/redo result  (already placed)         redo() ◄─────┘
//!                                               │
//!                                               └─► Undo stack (if redo_is_undoable)
//! ```
//!
//! New user edits clear the redo stack unless configured otherwise.

use std::fmt;

use rewind_core::{BatchId, BatchType, Document, DocumentModel, Operation, TransformEngine};

use crate::config::UndoConfig;
use crate::error::UndoError;
use crate::redo::RedoCommand;
use crate::undo::UndoCommand;

/// Paired undo and redo commands for one document.
pub struct UndoManager<O> {
    undo: UndoCommand<O>,
    redo: RedoCommand<O>,
    config: UndoConfig,
}

impl<O: Operation> Default for UndoManager<O> {
    fn default() -> Self {
        Self::new(UndoConfig::default())
    }
}

impl<O: Operation> UndoManager<O> {
    #[must_use]
    pub fn new(config: UndoConfig) -> Self {
        Self {
            undo: UndoCommand::from_config(&config),
            redo: RedoCommand::from_config(&config),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &UndoConfig {
        &self.config
    }

    #[must_use]
    pub fn undo_command(&self) -> &UndoCommand<O> {
        &self.undo
    }

    #[must_use]
    pub fn redo_command(&self) -> &RedoCommand<O> {
        &self.redo
    }

    /// Number of entries on the undo stack.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.stack().len()
    }

    /// Number of entries on the redo stack.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.stack().len()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.stack().is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.stack().is_empty()
    }

    /// Take every pending commit record from `doc` onto the stacks, then
    /// forget synthesized pairs older than anything left to revert.
    pub fn sync<M>(&mut self, doc: &mut Document<M>)
    where
        M: DocumentModel<Op = O>,
    {
        if doc.take_reset() {
            tracing::info!("document reset, dropping undo history");
            self.clear();
            self.undo.stack_mut().forget_synthesized();
            self.redo.stack_mut().forget_synthesized();
        }

        for record in doc.drain_commits() {
            let id = record.batch.id();
            if self.undo.stack().is_synthesized(id) || self.redo.stack().is_synthesized(id) {
                continue;
            }
            if record.batch.kind() == BatchType::Transparent {
                tracing::trace!(batch = %id, "transparent batch kept out of undo");
                continue;
            }
            self.undo.push(record.batch, record.selection_before);
            if self.config.clear_redo_on_edit && !self.redo.stack().is_empty() {
                tracing::debug!(batch = %id, "new edit discards redo stack");
                self.redo.stack_mut().clear_stack();
            }
        }

        let floor = [
            self.undo.stack().oldest_batch(),
            self.redo.stack().oldest_batch(),
        ]
        .into_iter()
        .flatten()
        .min();
        let pruned = self.undo.stack_mut().prune_synthesized(floor)
            + self.redo.stack_mut().prune_synthesized(floor);
        if pruned > 0 {
            tracing::trace!(pruned, "forgot unreachable synthesized batches");
        }

        self.undo.stack_mut().refresh_availability();
        self.redo.stack_mut().refresh_availability();
    }

    /// Undo the most recent edit. Returns the inverse batch id, or `None`
    /// when there was nothing to undo.
    ///
    /// # Errors
    ///
    /// See [`UndoCommand::execute`].
    pub fn undo<M, E>(
        &mut self,
        doc: &mut Document<M>,
        engine: &E,
    ) -> Result<Option<BatchId>, UndoError>
    where
        M: DocumentModel<Op = O>,
        E: TransformEngine<O> + ?Sized,
    {
        self.sync(doc);
        let Some(reverted) = self.undo.execute(doc, engine)? else {
            return Ok(None);
        };
        let id = reverted.batch.id();
        self.redo.push(reverted.batch, reverted.selection_before);
        Ok(Some(id))
    }

    /// Undo a specific edit still on the undo stack.
    ///
    /// # Errors
    ///
    /// See [`UndoCommand::execute_batch`].
    pub fn undo_batch<M, E>(
        &mut self,
        doc: &mut Document<M>,
        engine: &E,
        batch: BatchId,
    ) -> Result<BatchId, UndoError>
    where
        M: DocumentModel<Op = O>,
        E: TransformEngine<O> + ?Sized,
    {
        self.sync(doc);
        let reverted = self.undo.execute_batch(doc, engine, batch)?;
        let id = reverted.batch.id();
        self.redo.push(reverted.batch, reverted.selection_before);
        Ok(id)
    }

    /// Redo the most recently undone edit. Returns the new batch id, or
    /// `None` when there was nothing to redo.
    ///
    /// # Errors
    ///
    /// See [`RedoCommand::execute`].
    pub fn redo<M, E>(
        &mut self,
        doc: &mut Document<M>,
        engine: &E,
    ) -> Result<Option<BatchId>, UndoError>
    where
        M: DocumentModel<Op = O>,
        E: TransformEngine<O> + ?Sized,
    {
        self.sync(doc);
        let Some(reverted) = self.redo.execute(doc, engine)? else {
            return Ok(None);
        };
        let id = reverted.batch.id();
        if self.config.redo_is_undoable {
            self.undo.push(reverted.batch, reverted.selection_before);
        }
        Ok(Some(id))
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo.stack_mut().clear_stack();
        self.redo.stack_mut().clear_stack();
        self.undo.stack_mut().refresh_availability();
        self.redo.stack_mut().refresh_availability();
    }
}

impl<O> fmt::Debug for UndoManager<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoManager")
            .field("undo", &self.undo)
            .field("redo", &self.redo)
            .field("config", &self.config)
            .finish()
    }
}
