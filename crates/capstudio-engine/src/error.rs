//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while loading or driving the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine load failed: {message}")]
    LoadFailed { message: String },

    #[error("Engine exec failed: {message}")]
    ExecFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Engine terminated")]
    Terminated,

    #[error("File not found in engine filesystem: {0}")]
    FileNotFound(String),

    #[error("Invalid engine file name: {0}")]
    InvalidFileName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl EngineError {
    /// Create a load failure error.
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::LoadFailed {
            message: message.into(),
        }
    }

    /// Create an exec failure error.
    pub fn exec_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ExecFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}
