//! Pagination thresholds and policies

use serde::{Deserialize, Serialize};

/// Bottom edge past which continuous detection flags a page
pub const CONTINUOUS_THRESHOLD: f32 = 890.0;

/// Bottom edge past which a block is moved by the sweep
pub const SPLIT_THRESHOLD: f32 = 864.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationConfig {
    /// Threshold for the last-child check run after every edit
    pub continuous_threshold: f32,
    /// Threshold for the full scan run by the sweep
    pub split_threshold: f32,
    /// Renumber pages 1..=n after a sweep or an appended page
    pub maintain_ordinals: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            continuous_threshold: CONTINUOUS_THRESHOLD,
            split_threshold: SPLIT_THRESHOLD,
            maintain_ordinals: true,
        }
    }
}
