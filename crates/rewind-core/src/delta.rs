#![forbid(unsafe_code)]

//! Deltas: contiguous runs of operations.
//!
//! A delta occupies the version range `[base_version, end_version)`. Its
//! operations are numbered contiguously: each one starts where the previous
//! one ended.

use std::fmt;

use crate::batch::BatchId;
use crate::operation::{Operation, Version};

/// Ordered list of operations applied as one contiguous version run.
#[derive(Clone, PartialEq)]
pub struct Delta<O> {
    operations: Vec<O>,
    position: Version,
    owner: Option<BatchId>,
}

impl<O: Operation> Delta<O> {
    /// Build a delta from operations, positioned at the first one's base
    /// version.
    ///
    /// The operations are re-numbered contiguously from that base.
    #[must_use]
    pub fn from_operations(operations: Vec<O>) -> Self {
        let position = operations.first().map_or(0, Operation::base_version);
        let mut delta = Self {
            operations,
            position,
            owner: None,
        };
        delta.set_base_version(position);
        delta
    }

    /// An empty delta positioned at `version`.
    #[must_use]
    pub fn empty_at(version: Version) -> Self {
        Self {
            operations: Vec::new(),
            position: version,
            owner: None,
        }
    }

    #[must_use]
    pub fn operations(&self) -> &[O] {
        &self.operations
    }

    #[must_use]
    pub fn into_operations(self) -> Vec<O> {
        self.operations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Batch this delta belongs to, once recorded.
    #[must_use]
    pub const fn owner(&self) -> Option<BatchId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: BatchId) {
        self.owner = Some(owner);
    }

    /// Version of the first operation (or the position of an empty delta).
    #[must_use]
    pub fn base_version(&self) -> Version {
        self.operations
            .first()
            .map_or(self.position, Operation::base_version)
    }

    /// Number of version slots consumed.
    #[must_use]
    pub fn span(&self) -> u64 {
        self.operations.iter().map(Operation::length).sum()
    }

    /// First version after this delta.
    #[must_use]
    pub fn end_version(&self) -> Version {
        self.base_version() + self.span()
    }

    /// Re-position the delta so it starts at `version`.
    pub fn set_base_version(&mut self, version: Version) {
        self.position = version;
        let mut next = version;
        for op in &mut self.operations {
            op.set_base_version(next);
            next += op.length();
        }
    }

    /// The inverse delta, positioned right after this one.
    ///
    /// Operations are reversed in order and individually. The result has no
    /// owner; `self` is left untouched.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let end = self.end_version();
        let operations = self.operations.iter().rev().map(Operation::reversed).collect();
        let mut inverse = Self {
            operations,
            position: end,
            owner: None,
        };
        inverse.set_base_version(end);
        inverse
    }

    /// Append an operation at the end of the run.
    pub fn push(&mut self, mut op: O) {
        op.set_base_version(self.end_version());
        self.operations.push(op);
    }
}

impl<O: fmt::Debug> fmt::Debug for Delta<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delta")
            .field("position", &self.position)
            .field("owner", &self.owner)
            .field("operations", &self.operations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{TextEdit, TextOp};

    fn sample() -> Delta<TextOp> {
        Delta::from_operations(vec![TextOp::insert(4, 0, "ab"), TextOp::delete(9, 1, "b")])
    }

    #[test]
    fn from_operations_renumbers_contiguously() {
        let delta = sample();
        assert_eq!(delta.base_version(), 4);
        assert_eq!(delta.operations()[1].base_version(), 5);
        assert_eq!(delta.span(), 2);
        assert_eq!(delta.end_version(), 6);
    }

    #[test]
    fn empty_delta_keeps_position() {
        let delta: Delta<TextOp> = Delta::empty_at(11);
        assert!(delta.is_empty());
        assert_eq!(delta.base_version(), 11);
        assert_eq!(delta.end_version(), 11);
    }

    #[test]
    fn reversed_is_positioned_at_end_and_inverted() {
        let delta = sample();
        let inverse = delta.reversed();
        assert_eq!(inverse.base_version(), 6);
        assert_eq!(inverse.end_version(), 8);
        assert_eq!(inverse.owner(), None);
        assert_eq!(
            inverse.operations()[0].edit(),
            &TextEdit::Insert {
                position: 1,
                text: "b".into()
            }
        );
        assert_eq!(
            inverse.operations()[1].edit(),
            &TextEdit::Delete {
                position: 0,
                text: "ab".into()
            }
        );
        // Original untouched.
        assert_eq!(delta.base_version(), 4);
        assert_eq!(delta.operations()[0].edit(), sample().operations()[0].edit());
    }

    #[test]
    fn double_reverse_restores_operations() {
        let delta = sample();
        let mut twice = delta.reversed().reversed();
        twice.set_base_version(delta.base_version());
        assert_eq!(twice.operations(), delta.operations());
    }

    #[test]
    fn push_appends_at_end_version() {
        let mut delta = Delta::empty_at(3);
        delta.push(TextOp::insert(0, 0, "x"));
        delta.push(TextOp::insert(0, 1, "y"));
        assert_eq!(delta.operations()[0].base_version(), 3);
        assert_eq!(delta.operations()[1].base_version(), 4);
        assert_eq!(delta.end_version(), 5);
    }
}
