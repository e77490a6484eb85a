#![forbid(unsafe_code)]

//! Error types for undo/redo commands and configuration loading.

use rewind_core::{BatchId, DocumentError};
use thiserror::Error;

/// Failure while running an undo or redo command.
///
/// The document is always left as it was before the command started. The
/// stack entry that was being reverted is not put back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UndoError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("{0} is not on the undo stack")]
    NotOnStack(BatchId),
}

/// Errors from loading an [`UndoConfig`](crate::UndoConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Invalid(Vec<String>),
}
