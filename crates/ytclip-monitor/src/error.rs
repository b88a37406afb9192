//! Monitor error types.

use std::time::Duration;

use thiserror::Error;
use ytclip_media::MediaError;

/// Result type for monitoring operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("cookie content is empty")]
    EmptyContent,

    #[error("failed to load cookies: {0}")]
    CookieLoad(#[from] MediaError),

    #[error("ntfy server URL not configured")]
    MissingServerUrl,

    #[error("notification topic is required")]
    MissingTopic,

    #[error("ntfy notifications are disabled")]
    NotificationsDisabled,

    #[error("invalid notification header: {0}")]
    InvalidHeader(String),

    #[error("failed to send notification: {0}")]
    Network(#[from] reqwest::Error),

    #[error("ntfy server returned status {0}")]
    UnexpectedStatus(u16),

    #[error("test video URL is not configured")]
    MissingTestUrl,

    #[error("API validation failed: {0}")]
    ProbeFailed(String),

    #[error("API validation timed out after {} seconds", .0.as_secs())]
    ProbeTimeout(Duration),

    #[error("API validation panicked: {0}")]
    ProbePanicked(String),
}

impl MonitorError {
    pub fn probe_failed(msg: impl Into<String>) -> Self {
        Self::ProbeFailed(msg.into())
    }
}
