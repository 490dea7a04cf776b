//! Queue configuration

use serde::{Deserialize, Serialize};

/// Tuning knobs for a queue instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Capacity of the per-transfer progress channel. A slow consumer makes
    /// the source back off instead of dropping reports.
    pub progress_buffer: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            progress_buffer: 100,
        }
    }
}

impl QueueConfig {
    /// Clamp values to workable minimums.
    pub fn sanitized(mut self) -> Self {
        if self.progress_buffer == 0 {
            self.progress_buffer = 1;
        }
        self
    }
}
