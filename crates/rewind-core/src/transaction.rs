#![forbid(unsafe_code)]

//! Commit-or-rollback guard over a [`Document`].
//!
//! A transaction checkpoints the document when it opens. Every change made
//! through it (model edits, version bumps, history entries, selection) is
//! either published together by [`Transaction::commit`] or undone when the
//! guard is dropped. Batch ids handed out by a rolled back transaction are
//! not reused.

use std::fmt;

use crate::batch::{Batch, BatchId, BatchType};
use crate::delta::Delta;
use crate::document::{CommitRecord, Document, DocumentModel};
use crate::error::{DocumentError, Result};
use crate::history::History;
use crate::operation::Version;
use crate::selection::Selection;

struct Checkpoint<M> {
    model: M,
    version: Version,
    history_len: usize,
    selection: Selection,
}

/// RAII transaction guard. See the [module docs](self).
pub struct Transaction<'a, M: DocumentModel> {
    doc: &'a mut Document<M>,
    checkpoint: Option<Checkpoint<M>>,
    batches: Vec<Batch<M::Op>>,
}

impl<'a, M: DocumentModel> Transaction<'a, M> {
    pub(crate) fn new(doc: &'a mut Document<M>) -> Self {
        let checkpoint = Checkpoint {
            model: doc.model.clone(),
            version: doc.version,
            history_len: doc.history.len(),
            selection: doc.selection.clone(),
        };
        Self {
            doc,
            checkpoint: Some(checkpoint),
            batches: Vec::new(),
        }
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.doc.version
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.doc.model
    }

    #[must_use]
    pub fn history(&self) -> &History<M::Op> {
        &self.doc.history
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.doc.selection
    }

    /// Selection at the moment the transaction opened.
    #[must_use]
    pub fn selection_before(&self) -> &Selection {
        self.checkpoint
            .as_ref()
            .map_or(&self.doc.selection, |cp| &cp.selection)
    }

    /// Open a new batch in this transaction.
    pub fn begin_batch(&mut self, kind: BatchType) -> BatchId {
        let id = self.doc.allocate_batch_id();
        tracing::trace!(batch = %id, ?kind, "batch opened");
        self.batches.push(Batch::new(id, kind));
        id
    }

    /// A batch opened in this transaction.
    #[must_use]
    pub fn batch(&self, id: BatchId) -> Option<&Batch<M::Op>> {
        self.batches.iter().find(|batch| batch.id() == id)
    }

    /// Apply one operation as its own delta in `batch`.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::UnknownBatch`] if `batch` was not opened here.
    /// - [`DocumentError::VersionMismatch`] if `op` does not target the
    ///   current version.
    /// - [`DocumentError::Model`] if the model rejects it.
    pub fn apply_operation(&mut self, batch: BatchId, op: M::Op) -> Result<()> {
        let idx = self.batch_index(batch)?;
        self.doc.apply_to_model(std::slice::from_ref(&op))?;
        self.record(idx, Delta::from_operations(vec![op]))
    }

    /// Position `delta` at the current version and apply it in `batch`.
    ///
    /// Empty deltas are ignored.
    ///
    /// # Errors
    ///
    /// Same as [`apply_operation`](Self::apply_operation). A failure midway
    /// leaves the transaction dirty; drop it to roll back.
    pub fn apply_delta(&mut self, batch: BatchId, mut delta: Delta<M::Op>) -> Result<()> {
        let idx = self.batch_index(batch)?;
        if delta.is_empty() {
            return Ok(());
        }
        delta.set_base_version(self.doc.version);
        self.doc.apply_to_model(delta.operations())?;
        tracing::debug!(
            batch = %batch,
            base = delta.base_version(),
            ops = delta.len(),
            "delta applied"
        );
        self.record(idx, delta)
    }

    /// Replace the selection. Never fails; does not touch history or
    /// version.
    pub fn set_selection(&mut self, selection: Selection) {
        self.doc.selection = selection;
    }

    /// Publish every change made in this transaction.
    ///
    /// Each non-empty batch becomes one [`CommitRecord`] in the commit log,
    /// and listeners are notified after all records are appended.
    pub fn commit(mut self) {
        let Some(checkpoint) = self.checkpoint.take() else {
            return;
        };
        let batches = std::mem::take(&mut self.batches);
        let records: Vec<_> = batches
            .into_iter()
            .filter(|batch| !batch.is_empty())
            .map(|batch| {
                let start = batch.first_version().unwrap_or(checkpoint.version);
                let end = batch
                    .deltas()
                    .last()
                    .map_or(start, Delta::end_version);
                CommitRecord {
                    batch,
                    selection_before: checkpoint.selection.clone(),
                    selection_after: self.doc.selection.clone(),
                    versions: start..end,
                }
            })
            .collect();
        tracing::trace!(
            batches = records.len(),
            version = self.doc.version,
            "transaction committed"
        );
        self.doc.notify(&records);
        self.doc.commits.extend(records);
    }

    /// Discard every change made in this transaction.
    pub fn rollback(self) {
        drop(self);
    }

    fn batch_index(&self, id: BatchId) -> Result<usize> {
        self.batches
            .iter()
            .position(|batch| batch.id() == id)
            .ok_or(DocumentError::UnknownBatch(id))
    }

    fn record(&mut self, idx: usize, delta: Delta<M::Op>) -> Result<()> {
        let batch = &mut self.batches[idx];
        batch.add_delta(delta)?;
        if let Some(stamped) = batch.deltas().last() {
            self.doc.history.append(stamped.clone())?;
        }
        Ok(())
    }
}

impl<M: DocumentModel> Drop for Transaction<'_, M> {
    fn drop(&mut self) {
        let Some(checkpoint) = self.checkpoint.take() else {
            return;
        };
        let dirty = self.doc.version != checkpoint.version
            || self.doc.selection != checkpoint.selection
            || self.batches.iter().any(|batch| !batch.is_empty());
        if dirty {
            tracing::warn!(
                from = self.doc.version,
                to = checkpoint.version,
                batches = self.batches.len(),
                "transaction rolled back"
            );
        }
        self.doc.model = checkpoint.model;
        self.doc.version = checkpoint.version;
        self.doc.history.truncate(checkpoint.history_len);
        self.doc.selection = checkpoint.selection;
    }
}

impl<M: DocumentModel> fmt::Debug for Transaction<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("version", &self.doc.version)
            .field("batches", &self.batches.len())
            .field("open", &self.checkpoint.is_some())
            .finish()
    }
}
