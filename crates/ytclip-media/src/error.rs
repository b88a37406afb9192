//! Error types for media operations.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while driving the external media tool.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("Command failed: {message}")]
    CommandFailed {
        message: String,
        /// Combined stdout + stderr of the failed process
        output: String,
        exit_code: Option<i32>,
    },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("All {attempts} invocation strategies failed: {last}")]
    StrategiesExhausted {
        attempts: usize,
        last: Box<MediaError>,
    },

    #[error("No invocation strategy applicable to this configuration")]
    NoApplicableStrategy,

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Could not find a duration in yt-dlp output")]
    DurationNotFound,

    #[error("Unsupported format ID: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid cookies file {path}: {reason}")]
    InvalidCookies { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a command failure error.
    pub fn command_failed(
        message: impl Into<String>,
        output: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::CommandFailed {
            message: message.into(),
            output: output.into(),
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    pub fn invalid_duration(message: impl Into<String>) -> Self {
        Self::InvalidDuration(message.into())
    }

    /// Captured tool output carried by this error, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            MediaError::CommandFailed { output, .. } => Some(output),
            MediaError::StrategiesExhausted { last, .. } => last.output(),
            _ => None,
        }
    }

    /// Whether the error came from the per-attempt timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            MediaError::Timeout(_) => true,
            MediaError::StrategiesExhausted { last, .. } => last.is_timeout(),
            _ => false,
        }
    }
}
