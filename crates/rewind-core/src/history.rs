#![forbid(unsafe_code)]

//! Append-only log of applied deltas.
//!
//! # Invariants
//!
//! 1. Every stored delta has an owning batch.
//! 2. Deltas are contiguous: each one starts at the previous one's
//!    `end_version`, so the log is totally ordered with no overlap.
//! 3. Entries are never mutated or removed, except by transaction rollback
//!    truncating back to a checkpoint.

use std::fmt;
use std::iter::FusedIterator;

use crate::delta::Delta;
use crate::error::{DocumentError, Result};
use crate::operation::{Operation, Version};

/// Ordered, append-only sequence of applied deltas.
#[derive(Clone)]
pub struct History<O> {
    deltas: Vec<Delta<O>>,
    start: Version,
}

impl<O: Operation> Default for History<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Operation> History<O> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            deltas: Vec::new(),
            start: 0,
        }
    }

    /// Empty history whose first delta must start at `version`.
    #[must_use]
    pub fn starting_at(version: Version) -> Self {
        Self {
            deltas: Vec::new(),
            start: version,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Version the next delta must start at.
    #[must_use]
    pub fn end_version(&self) -> Version {
        self.deltas.last().map_or(self.start, Delta::end_version)
    }

    /// Record an applied delta.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::UnownedDelta`] if the delta has no batch.
    /// - [`DocumentError::HistoryGap`] if it does not start at
    ///   [`end_version`](Self::end_version).
    pub fn append(&mut self, delta: Delta<O>) -> Result<()> {
        if delta.owner().is_none() {
            return Err(DocumentError::UnownedDelta);
        }
        let expected = self.end_version();
        if delta.base_version() != expected {
            return Err(DocumentError::HistoryGap {
                expected,
                actual: delta.base_version(),
            });
        }
        self.deltas.push(delta);
        Ok(())
    }

    /// All deltas whose base version is `>= version`, ascending.
    ///
    /// The iterator is lazy, finite and restartable (`Clone`).
    #[must_use]
    pub fn deltas_from(&self, version: Version) -> DeltasFrom<'_, O> {
        let first = self
            .deltas
            .partition_point(|delta| delta.base_version() < version);
        DeltasFrom {
            inner: self.deltas[first..].iter(),
        }
    }

    /// The delta starting exactly at `version`, if one does.
    #[must_use]
    pub fn delta_at(&self, version: Version) -> Option<&Delta<O>> {
        self.deltas
            .binary_search_by_key(&version, Delta::base_version)
            .ok()
            .map(|idx| &self.deltas[idx])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Delta<O>> {
        self.deltas.iter()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.deltas.truncate(len);
    }
}

impl<O> fmt::Debug for History<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("start", &self.start)
            .field("deltas", &self.deltas.len())
            .finish()
    }
}

/// Iterator returned by [`History::deltas_from`].
#[derive(Debug)]
pub struct DeltasFrom<'a, O> {
    inner: std::slice::Iter<'a, Delta<O>>,
}

impl<O> Clone for DeltasFrom<'_, O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, O> Iterator for DeltasFrom<'a, O> {
    type Item = &'a Delta<O>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<O> ExactSizeIterator for DeltasFrom<'_, O> {}
impl<O> FusedIterator for DeltasFrom<'_, O> {}
