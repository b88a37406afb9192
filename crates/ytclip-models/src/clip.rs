//! Clip requests and their validation.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a clip request is rejected before a job is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("Invalid time format. Use HH:MM:SS.")]
    InvalidTime,

    #[error("End time must be after start time.")]
    EmptyRange,

    #[error("Invalid format. Must be a numeric value.")]
    InvalidFormat,
}

/// A request to cut `[from, to]` out of a video in a given yt-dlp format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRequest {
    pub url: String,
    pub from: String,
    pub to: String,
    /// Numeric yt-dlp format ID
    pub format: String,
}

impl ClipRequest {
    pub fn new(
        url: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            from: from.into(),
            to: to.into(),
            format: format.into(),
        }
    }

    /// Validate every field, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_valid_youtube_url(&self.url) {
            return Err(ValidationError::InvalidUrl);
        }

        let (Some(from), Some(to)) = (clock_seconds(&self.from), clock_seconds(&self.to)) else {
            return Err(ValidationError::InvalidTime);
        };
        if to <= from {
            return Err(ValidationError::EmptyRange);
        }

        if !is_valid_format_id(&self.format) {
            return Err(ValidationError::InvalidFormat);
        }

        Ok(())
    }
}

fn clock_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-1]?[0-9]|2[0-3]):([0-5][0-9]):([0-5][0-9])$").expect("valid clock regex")
    })
}

/// Check `HH:MM:SS` with hour 0-23 and minute/second 0-59.
pub fn is_valid_time_format(time: &str) -> bool {
    clock_seconds(time).is_some()
}

fn clock_seconds(time: &str) -> Option<u32> {
    let caps = clock_regex().captures(time)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    Some(part(1)? * 3600 + part(2)? * 60 + part(3)?)
}

/// Format IDs are non-empty runs of ASCII digits.
pub fn is_valid_format_id(format: &str) -> bool {
    !format.is_empty() && format.bytes().all(|b| b.is_ascii_digit())
}

/// Accept `youtube.com/watch?v=<id>` and `youtu.be/<id>` over http(s).
pub fn is_valid_youtube_url(url: &str) -> bool {
    extract_video_id(url).is_some()
}

/// Extract the video ID from a watch or short-link URL.
pub fn extract_video_id(url: &str) -> Option<&str> {
    let rest = url
        .trim()
        .strip_prefix("https://")
        .or_else(|| url.trim().strip_prefix("http://"))?;
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let segment = if let Some(query) = rest.strip_prefix("youtube.com/watch?v=") {
        query
    } else {
        rest.strip_prefix("youtu.be/")?
    };

    let id_len = segment
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(segment.len());
    (id_len > 0).then(|| &segment[..id_len])
}
