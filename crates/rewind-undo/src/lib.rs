#![forbid(unsafe_code)]

//! Rebasing undo/redo for [`rewind_core`] documents.
//!
//! Undo does not assume the document still looks like it did when an edit
//! was made. It reverses the stored batch and rebases the inverse through
//! every history delta recorded since, so collaborator changes and other
//! edits survive the undo.
//!
//! # Quick Start
//!
//! ```
//! use rewind_core::text::{TextBuffer, TextOp, TextTransform};
//! use rewind_core::{BatchType, Document};
//! use rewind_undo::{UndoConfig, UndoManager};
//!
//! let mut doc = Document::new(TextBuffer::from("world"));
//! let mut undo = UndoManager::new(UndoConfig::default());
//!
//! doc.apply_single(BatchType::Undoable, TextOp::insert(0, 5, "!"))?;
//! // A collaborator edit lands afterwards.
//! doc.apply_single(BatchType::Transparent, TextOp::insert(0, 0, "hello "))?;
//!
//! undo.undo(&mut doc, &TextTransform)?;
//! assert_eq!(doc.model().as_str(), "hello world");
//! undo.redo(&mut doc, &TextTransform)?;
//! assert_eq!(doc.model().as_str(), "hello world!");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`stack`]: [`CommandStack`] shared by both commands
//! - [`rebase`]: inverse computation through history
//! - [`undo`] / [`redo`]: the two commands
//! - [`manager`]: routing of committed batches onto the stacks
//! - [`config`]: [`UndoConfig`] and its loaders

pub mod config;
pub mod error;
pub mod manager;
pub mod rebase;
pub mod redo;
pub mod stack;
pub mod undo;

pub use config::UndoConfig;
pub use error::{ConfigError, UndoError};
pub use manager::UndoManager;
pub use rebase::{Reverted, rebase, revert_item};
pub use redo::RedoCommand;
pub use stack::{CommandStack, StackItem};
pub use undo::UndoCommand;
