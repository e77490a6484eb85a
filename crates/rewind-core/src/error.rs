#![forbid(unsafe_code)]

//! Error types for document mutation and transformation.

use thiserror::Error;

use crate::batch::BatchId;
use crate::operation::Version;

pub type Result<T> = std::result::Result<T, DocumentError>;

/// Failure reported by a [`DocumentModel`](crate::DocumentModel) while
/// applying an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ModelError {
    pub message: String,
}

impl ModelError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by a [`TransformEngine`](crate::TransformEngine).
///
/// Engines are expected to be total over well-formed input, so any of these
/// aborts the enclosing transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("transform not supported for operation kind: {kind}")]
    Unsupported { kind: String },

    #[error("invalid transform input: {message}")]
    Invalid { message: String },
}

impl TransformError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Errors raised while mutating a [`Document`](crate::Document).
///
/// All of them are programmer errors from the point of view of the undo
/// engine: they abort the transaction and leave the document untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("operation expects version {actual} but document is at version {expected}")]
    VersionMismatch { expected: Version, actual: Version },

    #[error("history gap: next delta must start at {expected}, got {actual}")]
    HistoryGap { expected: Version, actual: Version },

    #[error("delta has no owning batch")]
    UnownedDelta,

    #[error("unknown batch: {0}")]
    UnknownBatch(BatchId),

    #[error("delta already owned by {owner}, cannot add it to {batch}")]
    DeltaAlreadyOwned { owner: BatchId, batch: BatchId },

    #[error("model rejected operation at version {version}: {source}")]
    Model {
        version: Version,
        #[source]
        source: ModelError,
    },

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
}
