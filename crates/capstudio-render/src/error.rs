//! Error types for render jobs.

use capstudio_engine::EngineError;
use capstudio_models::ValidationError;
use thiserror::Error;

use crate::sources::SourceError;

/// Result type for render operations.
pub type StudioResult<T> = Result<T, StudioError>;

/// Errors surfaced by the render job controller.
///
/// All engine/IO failures are terminal for the current job and are never
/// retried automatically; the user must resubmit.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Invalid caption: {0}")]
    Validation(#[from] ValidationError),

    #[error("A render job is already running")]
    Busy,

    #[error("Studio has been disposed")]
    Disposed,

    #[error("Engine load failed: {message}")]
    EngineLoad { message: String },

    #[error("Render engine failed: {message}")]
    RenderEngine {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Render cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine filesystem error: {0}")]
    EngineIo(String),

    /// Collaborator failure, passed through without reinterpretation.
    #[error("{0}")]
    Source(SourceError),
}

impl From<EngineError> for StudioError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::LoadFailed { message } => StudioError::EngineLoad { message },
            EngineError::ExecFailed {
                message,
                stderr,
                exit_code,
            } => StudioError::RenderEngine {
                message,
                stderr,
                exit_code,
            },
            EngineError::Terminated => StudioError::Cancelled,
            EngineError::Io(e) => StudioError::Io(e),
            other => StudioError::EngineIo(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_mapping() {
        let err: StudioError = EngineError::load_failed("fetch failed").into();
        assert!(matches!(err, StudioError::EngineLoad { .. }));

        let err: StudioError = EngineError::exec_failed("bad filter", None, Some(1)).into();
        assert!(matches!(
            err,
            StudioError::RenderEngine {
                exit_code: Some(1),
                ..
            }
        ));

        let err: StudioError = EngineError::Terminated.into();
        assert!(matches!(err, StudioError::Cancelled));
    }

    #[test]
    fn test_source_error_passes_through_display() {
        let inner: SourceError = "premium subscription required".into();
        let err = StudioError::Source(inner);
        assert_eq!(err.to_string(), "premium subscription required");
    }
}
