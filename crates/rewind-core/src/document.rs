#![forbid(unsafe_code)]

//! The editable document: model, version counter, history and selection.
//!
//! All mutation goes through a [`Transaction`]. A document hands committed
//! batches to the outside world in two ways:
//!
//! - a pull-based commit log ([`Document::drain_commits`]), consumed by the
//!   undo manager;
//! - push-based listeners ([`Document::subscribe`]), called once per commit.
//!
//! Listeners never observe a half-applied transaction.

use std::fmt;
use std::ops::Range;

use crate::batch::{Batch, BatchId, BatchType};
use crate::delta::Delta;
use crate::error::{DocumentError, ModelError, Result};
use crate::history::History;
use crate::operation::{Operation, Version};
use crate::selection::Selection;
use crate::transaction::Transaction;

/// Content that operations are applied to.
///
/// `Clone` is required so a transaction can checkpoint the model and restore
/// it on rollback.
pub trait DocumentModel: Clone {
    type Op: Operation;

    /// Apply one operation to the content.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the operation does not fit the content.
    fn apply(&mut self, op: &Self::Op) -> std::result::Result<(), ModelError>;
}

/// One committed batch, emitted after its transaction commits.
#[derive(Debug, Clone)]
pub struct CommitRecord<O> {
    pub batch: Batch<O>,
    /// Selection when the transaction started.
    pub selection_before: Selection,
    /// Selection when the transaction committed.
    pub selection_after: Selection,
    /// Version slots occupied by the batch's deltas.
    pub versions: Range<Version>,
}

pub(crate) type Listener<O> = Box<dyn FnMut(&CommitRecord<O>) + Send>;

/// A versioned document.
pub struct Document<M: DocumentModel> {
    pub(crate) model: M,
    pub(crate) version: Version,
    pub(crate) history: History<M::Op>,
    pub(crate) selection: Selection,
    pub(crate) next_batch: u64,
    pub(crate) commits: Vec<CommitRecord<M::Op>>,
    pub(crate) listeners: Vec<Listener<M::Op>>,
    reset_pending: bool,
}

impl<M: DocumentModel> Document<M> {
    /// Create a document at version 0 with an empty history.
    #[must_use]
    pub fn new(model: M) -> Self {
        Self {
            model,
            version: 0,
            history: History::new(),
            selection: Selection::default(),
            next_batch: 1,
            commits: Vec::new(),
            listeners: Vec::new(),
            reset_pending: false,
        }
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Current version: total version slots consumed so far.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    #[must_use]
    pub fn history(&self) -> &History<M::Op> {
        &self.history
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Replace the selection outside of any edit.
    ///
    /// Cursor movement is not an edit: no history entry, no version bump, no
    /// commit record.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Open a transaction.
    ///
    /// Changes become visible to listeners on [`Transaction::commit`]; dropping
    /// the guard without committing rolls every change back.
    pub fn transaction(&mut self) -> Transaction<'_, M> {
        Transaction::new(self)
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns; the document is left untouched in that
    /// case.
    pub fn run_atomic<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_, M>) -> std::result::Result<T, E>,
    {
        let mut tx = self.transaction();
        let value = f(&mut tx)?;
        tx.commit();
        Ok(value)
    }

    /// Apply `deltas` as one committed batch of the given kind.
    ///
    /// Each delta is positioned at the then-current version, so callers may
    /// leave base versions at zero.
    ///
    /// # Errors
    ///
    /// Fails if the model rejects an operation; nothing is applied then.
    pub fn apply_batch(&mut self, kind: BatchType, deltas: Vec<Delta<M::Op>>) -> Result<BatchId> {
        self.run_atomic(|tx| {
            let batch = tx.begin_batch(kind);
            for delta in deltas {
                tx.apply_delta(batch, delta)?;
            }
            Ok::<_, DocumentError>(batch)
        })
    }

    /// Apply a single operation at the current version as its own batch.
    ///
    /// # Errors
    ///
    /// Fails if the model rejects the operation.
    pub fn apply_single(&mut self, kind: BatchType, op: M::Op) -> Result<BatchId> {
        self.apply_batch(kind, vec![Delta::from_operations(vec![op])])
    }

    /// Take every commit record produced since the last drain.
    pub fn drain_commits(&mut self) -> Vec<CommitRecord<M::Op>> {
        std::mem::take(&mut self.commits)
    }

    /// Number of undrained commit records.
    #[must_use]
    pub fn pending_commits(&self) -> usize {
        self.commits.len()
    }

    /// Register a listener called once per committed batch.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&CommitRecord<M::Op>) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Replace the content wholesale, for example after a reload.
    ///
    /// History, selection and undrained commits are discarded. The version
    /// counter keeps counting so stale operations are still rejected. Undo
    /// wiring picks up the reset through [`take_reset`](Self::take_reset).
    pub fn reset(&mut self, model: M) {
        tracing::info!(version = self.version, "document reset");
        self.model = model;
        self.history = History::starting_at(self.version);
        self.selection = Selection::default();
        self.commits.clear();
        self.reset_pending = true;
    }

    /// Whether [`reset`](Self::reset) was called since the last check.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_pending)
    }

    pub(crate) fn allocate_batch_id(&mut self) -> BatchId {
        let id = BatchId::new(self.next_batch);
        self.next_batch += 1;
        id
    }

    /// Apply operations to the model, advancing the version.
    ///
    /// Does not touch history; callers record the delta on success.
    pub(crate) fn apply_to_model(&mut self, ops: &[M::Op]) -> Result<()> {
        for op in ops {
            if op.base_version() != self.version {
                return Err(DocumentError::VersionMismatch {
                    expected: self.version,
                    actual: op.base_version(),
                });
            }
            self.model
                .apply(op)
                .map_err(|source| DocumentError::Model {
                    version: self.version,
                    source,
                })?;
            self.version += op.length();
        }
        Ok(())
    }

    pub(crate) fn notify(&mut self, records: &[CommitRecord<M::Op>]) {
        for record in records {
            for listener in &mut self.listeners {
                listener(record);
            }
        }
    }
}

impl<M: DocumentModel + fmt::Debug> fmt::Debug for Document<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("model", &self.model)
            .field("version", &self.version)
            .field("history", &self.history)
            .field("selection", &self.selection)
            .field("pending_commits", &self.commits.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
