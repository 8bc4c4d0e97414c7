//! Completion failure for a run.

use thiserror::Error;

/// What a failed run rejects with: the message the execution context
/// recorded, verbatim.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RunError {
    pub message: String,
}

impl RunError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ProjectResult<T> = Result<T, RunError>;
