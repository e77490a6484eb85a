#![forbid(unsafe_code)]

//! Undo/redo configuration.
//!
//! Loadable from TOML or JSON; every field has a default so partial files
//! are fine.
//!
//! ```toml
//! max_depth = 250
//! strong_side = true
//! redo_is_undoable = false
//! clear_redo_on_edit = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted `max_depth`.
pub const MAX_DEPTH_LIMIT: usize = 1_000_000;

/// Behaviour knobs for [`UndoManager`](crate::UndoManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoConfig {
    /// Maximum entries per stack; oldest entries are evicted (0 = unlimited).
    pub max_depth: usize,
    /// Whether reverted edits win position ties against later edits.
    pub strong_side: bool,
    /// Whether a redo can itself be undone again.
    pub redo_is_undoable: bool,
    /// Whether a fresh edit discards the redo stack.
    pub clear_redo_on_edit: bool,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            strong_side: true,
            redo_is_undoable: false,
            clear_redo_on_edit: true,
        }
    }
}

impl UndoConfig {
    /// Create a configuration with a custom depth.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// No depth limit.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    #[must_use]
    pub fn with_strong_side(mut self, strong: bool) -> Self {
        self.strong_side = strong;
        self
    }

    #[must_use]
    pub fn with_redo_is_undoable(mut self, undoable: bool) -> Self {
        self.redo_is_undoable = undoable;
        self
    }

    #[must_use]
    pub fn with_clear_redo_on_edit(mut self, clear: bool) -> Self {
        self.clear_redo_on_edit = clear;
        self
    }

    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_depth > MAX_DEPTH_LIMIT {
            errors.push(format!(
                "max_depth must be <= {MAX_DEPTH_LIMIT} (0 = unlimited), got {}",
                self.max_depth
            ));
        }
        errors
    }

    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}
