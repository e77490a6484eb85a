#![forbid(unsafe_code)]

//! Batches: the unit of undo.
//!
//! A batch groups every delta produced by one user-visible action. Undo and
//! redo always operate on whole batches.

use std::fmt;

use crate::delta::Delta;
use crate::error::{DocumentError, Result};
use crate::operation::{Operation, Version};

/// Identity of a batch, issued by the owning [`Document`](crate::Document).
///
/// Ids are never reused within a document, even across rolled back
/// transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchId(pub u64);

impl BatchId {
    /// Create a batch id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch#{}", self.0)
    }
}

/// Whether a batch is offered for undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BatchType {
    /// Regular user edit, pushed onto the undo stack.
    #[default]
    Undoable,
    /// Recorded in history and rebased through, never undone on its own.
    ///
    /// Used for collaborator changes and programmatic fix-ups.
    Transparent,
}

/// Ordered group of deltas treated as one undoable unit.
#[derive(Clone, PartialEq)]
pub struct Batch<O> {
    id: BatchId,
    kind: BatchType,
    deltas: Vec<Delta<O>>,
}

impl<O: Operation> Batch<O> {
    /// Create an empty batch.
    #[must_use]
    pub fn new(id: BatchId, kind: BatchType) -> Self {
        Self {
            id,
            kind,
            deltas: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> BatchId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> BatchType {
        self.kind
    }

    /// Deltas in application order.
    #[must_use]
    pub fn deltas(&self) -> &[Delta<O>] {
        &self.deltas
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.iter().all(Delta::is_empty)
    }

    /// Total number of operations across all deltas.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.deltas.iter().map(Delta::len).sum()
    }

    /// Version the first delta was applied at, if any.
    #[must_use]
    pub fn first_version(&self) -> Option<Version> {
        self.deltas.first().map(Delta::base_version)
    }

    /// Append a delta, stamping this batch as its owner.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::DeltaAlreadyOwned`] if the delta belongs to
    /// another batch.
    pub fn add_delta(&mut self, mut delta: Delta<O>) -> Result<()> {
        match delta.owner() {
            Some(owner) if owner != self.id => {
                return Err(DocumentError::DeltaAlreadyOwned {
                    owner,
                    batch: self.id,
                });
            }
            _ => {}
        }
        delta.set_owner(self.id);
        self.deltas.push(delta);
        Ok(())
    }
}

impl<O: fmt::Debug> fmt::Debug for Batch<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("deltas", &self.deltas.len())
            .finish()
    }
}
