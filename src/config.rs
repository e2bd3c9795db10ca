//! Editor configuration

use crate::error::Result;
use crate::layout::LayoutConstraints;
use crate::pagination::PaginationConfig;
use serde::{Deserialize, Serialize};

/// Default undo history depth
pub const DEFAULT_UNDO_DEPTH: usize = 100;

/// Everything an [`Editor`](crate::Editor) is configured with.
///
/// Every field has a default, so a partial JSON object is enough:
///
/// ```
/// let config = paged_editor::EditorConfig::from_json(r#"{"undoDepth": 5}"#).unwrap();
/// assert_eq!(config.undo_depth, 5);
/// assert_eq!(config.pagination.split_threshold, 864.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub layout: LayoutConstraints,
    pub pagination: PaginationConfig,
    pub undo_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConstraints::default(),
            pagination: PaginationConfig::default(),
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
