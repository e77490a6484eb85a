#![forbid(unsafe_code)]

//! Cursor and selection snapshots.

/// A selected span of character offsets. `start == end` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    #[must_use]
    pub const fn is_caret(&self) -> bool {
        self.start == self.end
    }
}

/// Full selection state: one or more ranges plus direction.
///
/// Restored as-is by undo and redo; cloning is the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    pub ranges: Vec<Range>,
    pub backward: bool,
}

impl Selection {
    /// A single caret at `offset`.
    #[must_use]
    pub fn caret(offset: usize) -> Self {
        Self {
            ranges: vec![Range::caret(offset)],
            backward: false,
        }
    }

    /// A single forward range.
    #[must_use]
    pub fn range(start: usize, end: usize) -> Self {
        Self {
            ranges: vec![Range::new(start, end)],
            backward: false,
        }
    }

    #[must_use]
    pub fn backward(mut self) -> Self {
        self.backward = true;
        self
    }

    /// The primary range, if any.
    #[must_use]
    pub fn primary(&self) -> Option<Range> {
        self.ranges.first().copied()
    }
}
