//! Errors surfaced to callers of the engine.

use thiserror::Error;

use mediaq_core::{CoreError, TaskId};

/// Engine errors.
///
/// Only `Validation` and `Submission` come out of `Session::submit`; polling
/// problems end up as a task's failure reason instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// User input rejected before any remote call.
    #[error("validation error: {0}")]
    Validation(String),

    /// The remote service refused or failed the job creation.
    #[error("submission failed: {0}")]
    Submission(String),

    /// The id was already issued in this session.
    #[error("duplicate task: {0}")]
    DuplicateTask(TaskId),

    /// Task not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(message) => Self::Validation(message),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_become_validation() {
        let err = EngineError::from(CoreError::InvalidInput("Please enter a URL".into()));
        assert!(matches!(err, EngineError::Validation(ref m) if m == "Please enter a URL"));

        let err = EngineError::from(CoreError::UnknownQuality {
            kind: "audio".into(),
            quality: "720p".into(),
        });
        assert!(matches!(err, EngineError::Validation(ref m) if m == "Invalid quality '720p' for audio"));
    }
}
