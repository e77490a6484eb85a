#![forbid(unsafe_code)]

//! Plain-text reference catalogue.
//!
//! A minimal [`DocumentModel`] over a `String` with two reversible
//! operations, plus the [`TextTransform`] engine that rebases them. Positions
//! are character offsets, not bytes.
//!
//! ```
//! use rewind_core::text::{TextBuffer, TextOp};
//! use rewind_core::{BatchType, Document};
//!
//! let mut doc = Document::new(TextBuffer::from("world"));
//! doc.apply_single(BatchType::Undoable, TextOp::insert(0, 0, "hello "))?;
//! assert_eq!(doc.model().as_str(), "hello world");
//! # Ok::<(), rewind_core::DocumentError>(())
//! ```

mod transform;

pub use transform::TextTransform;

use std::fmt;

use crate::document::DocumentModel;
use crate::error::ModelError;
use crate::operation::{Operation, Version};

/// A single text edit at a character offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum TextEdit {
    /// Insert `text` so that it starts at `position`.
    Insert { position: usize, text: String },
    /// Remove `text`, which must currently start at `position`.
    Delete { position: usize, text: String },
}

impl TextEdit {
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::Insert { position, .. } | Self::Delete { position, .. } => *position,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Insert { text, .. } | Self::Delete { text, .. } => text,
        }
    }

    /// Length of the affected text in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    /// The edit that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            Self::Insert { position, text } => Self::Delete {
                position: *position,
                text: text.clone(),
            },
            Self::Delete { position, text } => Self::Insert {
                position: *position,
                text: text.clone(),
            },
        }
    }
}

impl fmt::Display for TextEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert { position, text } => write!(f, "+{position}:{text:?}"),
            Self::Delete { position, text } => write!(f, "-{position}:{text:?}"),
        }
    }
}

/// A [`TextEdit`] bound to the version it applies at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextOp {
    base_version: Version,
    edit: TextEdit,
}

impl TextOp {
    #[must_use]
    pub const fn new(base_version: Version, edit: TextEdit) -> Self {
        Self { base_version, edit }
    }

    #[must_use]
    pub fn insert(base_version: Version, position: usize, text: impl Into<String>) -> Self {
        Self::new(
            base_version,
            TextEdit::Insert {
                position,
                text: text.into(),
            },
        )
    }

    #[must_use]
    pub fn delete(base_version: Version, position: usize, text: impl Into<String>) -> Self {
        Self::new(
            base_version,
            TextEdit::Delete {
                position,
                text: text.into(),
            },
        )
    }

    #[must_use]
    pub const fn edit(&self) -> &TextEdit {
        &self.edit
    }

    #[must_use]
    pub fn into_edit(self) -> TextEdit {
        self.edit
    }
}

impl Operation for TextOp {
    fn base_version(&self) -> Version {
        self.base_version
    }

    fn set_base_version(&mut self, version: Version) {
        self.base_version = version;
    }

    fn reversed(&self) -> Self {
        Self::new(self.base_version, self.edit.inverse())
    }
}

/// String content addressed by character offset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }

    fn byte_offset(&self, position: usize) -> Option<usize> {
        if position == 0 {
            return Some(0);
        }
        self.text
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(self.text.len()))
            .nth(position)
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_owned(),
        }
    }
}

impl From<String> for TextBuffer {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl DocumentModel for TextBuffer {
    type Op = TextOp;

    fn apply(&mut self, op: &TextOp) -> Result<(), ModelError> {
        let len = self.char_len();
        match op.edit() {
            TextEdit::Insert { position, text } => {
                let at = self.byte_offset(*position).ok_or_else(|| {
                    ModelError::new(format!("insert at {position} past end ({len} chars)"))
                })?;
                self.text.insert_str(at, text);
            }
            TextEdit::Delete { position, text } => {
                let n = text.chars().count();
                let start = self.byte_offset(*position);
                let end = self.byte_offset(position + n);
                let (Some(start), Some(end)) = (start, end) else {
                    return Err(ModelError::new(format!(
                        "delete of {n} chars at {position} past end ({len} chars)"
                    )));
                };
                if &self.text[start..end] != text {
                    return Err(ModelError::new(format!(
                        "delete at {position} expected {text:?}, found {:?}",
                        &self.text[start..end]
                    )));
                }
                self.text.replace_range(start..end, "");
            }
        }
        Ok(())
    }
}
