//! Error handling for Taskline

use thiserror::Error;

/// Main error type for Taskline
#[derive(Debug, Error)]
pub enum TasklineError {
    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),
}
