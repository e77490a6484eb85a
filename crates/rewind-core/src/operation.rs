#![forbid(unsafe_code)]

//! The atomic edit primitive.
//!
//! Operations are opaque to the undo engine. It only needs to know where an
//! operation sits in the version sequence and how to build its inverse; what
//! the operation actually does to the document is the business of the
//! [`DocumentModel`](crate::DocumentModel) that applies it.

use std::fmt;

/// Document version: the number of version slots consumed since creation.
pub type Version = u64;

/// An atomic, replayable edit.
///
/// # Invariants
///
/// - Applying `op` and then `op.reversed()` restores the prior model state.
/// - `op.reversed().reversed() == op` up to the base version.
/// - Once applied, an operation is never mutated; history keeps its own copy.
pub trait Operation: Clone + fmt::Debug + PartialEq {
    /// Version of the document this operation expects to be applied to.
    fn base_version(&self) -> Version;

    /// Re-target the operation at another document version.
    fn set_base_version(&mut self, version: Version);

    /// Number of version slots this operation consumes.
    fn length(&self) -> u64 {
        1
    }

    /// The logical inverse of this operation.
    ///
    /// The returned operation keeps the same base version; callers that
    /// position it (see [`Delta::reversed`](crate::Delta::reversed)) re-number
    /// it afterwards.
    fn reversed(&self) -> Self;
}
