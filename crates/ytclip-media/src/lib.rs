//! yt-dlp integration for YTClipper.
//!
//! This crate provides:
//! - Parsers for format listings and durations
//! - Fallback invocation strategies with identity rotation
//! - Scoped cookie files for authenticated attempts
//! - A process runner with per-attempt timeouts
//! - The [`VideoSource`] trait and its yt-dlp implementation

pub mod config;
pub mod cookies;
pub mod error;
pub mod identity;
pub mod invocation;
pub mod parser;
pub mod runner;
pub mod strategy;
pub mod ytdlp;

pub use config::YtDlpConfig;
pub use cookies::{is_valid_netscape_cookies, CookieSource, ScopedCookieFile};
pub use error::{MediaError, MediaResult};
pub use identity::{
    FixedIdentity, IdentitySelector, RandomIdentity, RoundRobinIdentity, DEFAULT_USER_AGENTS,
};
pub use invocation::InvocationEngine;
pub use parser::{extract_bitrate, extract_duration_substring, parse_duration, parse_formats};
pub use runner::{CommandRunner, ProcessOutput, ProcessRunner};
pub use strategy::{default_strategies, Strategy, StrategyInputs};
pub use ytdlp::{check_dependencies, CutRequest, VideoSource, YtDlpClient};
