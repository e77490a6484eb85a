#![forbid(unsafe_code)]

//! Versioned document model for rebasing undo/redo.
//!
//! Every mutation of a [`Document`] is a sequence of atomic, replayable
//! [`Operation`]s, grouped into [`Delta`]s (contiguous version runs) and
//! [`Batch`]es (the unit of undo). Applied deltas land in an append-only
//! [`History`] that the undo engine walks to rebase inverse edits through
//! whatever happened since.
//!
//! # Layering
//!
//! ```text
//! Operation ─► Delta ─► Batch ─► History ─► Document
//!                                             │
//!                           Transaction ◄─────┘  (commit or rollback)
//! ```
//!
//! The [`TransformEngine`] trait is the seam for operation-specific rebasing.
//! The [`text`] module provides a complete plain-text catalogue.

pub mod batch;
pub mod delta;
pub mod document;
pub mod error;
pub mod history;
pub mod operation;
pub mod selection;
pub mod text;
pub mod transaction;
pub mod transform;

pub use batch::{Batch, BatchId, BatchType};
pub use delta::Delta;
pub use document::{CommitRecord, Document, DocumentModel};
pub use error::{DocumentError, ModelError, Result, TransformError};
pub use history::{DeltasFrom, History};
pub use operation::{Operation, Version};
pub use selection::{Range, Selection};
pub use transaction::Transaction;
pub use transform::TransformEngine;
