use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort the whole run (startup, configuration, request parsing).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("{0}")]
    Request(#[from] JobError),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Per-job failures. These never escape the job runner; each one becomes a
/// failed `JobResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No matching stream: {0}")]
    NoMatchingStream(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("Convert failed: {0}")]
    ConvertFailed(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),
}

impl JobError {
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::InvalidRequest(_) => "InvalidRequest",
            JobError::NoMatchingStream(_) => "NoMatchingStream",
            JobError::FetchFailed(_) => "FetchFailed",
            JobError::TranscodeFailed(_) => "TranscodeFailed",
            JobError::ConvertFailed(_) => "ConvertFailed",
            JobError::PathNotFound(_) => "PathNotFound",
        }
    }
}

/// Opaque failure reported by an external collaborator (yt-dlp, ffmpeg, or a
/// test double). Executors map it onto the matching `JobError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

impl From<String> for CollaboratorError {
    fn from(message: String) -> Self {
        CollaboratorError(message)
    }
}

impl From<&str> for CollaboratorError {
    fn from(message: &str) -> Self {
        CollaboratorError(message.to_string())
    }
}
