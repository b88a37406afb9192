//! Shared data models for the YTClipper service.
//!
//! This crate provides Serde-serializable types for:
//! - Clip jobs and their lifecycle state machine
//! - Format listings derived from yt-dlp output
//! - Session cookie metadata
//! - Clip request validation

pub mod clip;
pub mod cookie;
pub mod env;
pub mod format;
pub mod job;

pub use clip::{ClipRequest, ValidationError};
pub use cookie::{CookieInfo, ESTIMATED_COOKIE_NAME, TRACKED_COOKIE_NAME};
pub use format::{FormatRecord, FormatType, BITRATE_NOT_AVAILABLE};
pub use job::{Job, JobId, JobStatus, TransitionError};
