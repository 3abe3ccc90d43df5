//! Errors of the replay shell.

use layoutkit_core::TransformError;
use thiserror::Error;

/// Replay shell errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid script: {0}")]
    Script(String),
    #[error("Engine error: {0}")]
    Engine(#[from] TransformError),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Script(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
