//! yt-dlp invocation configuration.

use std::path::PathBuf;
use std::time::Duration;

use ytclip_models::env;

use crate::cookies::CookieSource;

/// yt-dlp invocation configuration.
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Path or name of the yt-dlp binary
    pub binary: String,
    /// Per-attempt timeout for listing and duration queries
    pub command_timeout: Duration,
    /// Per-attempt timeout for downloads
    pub download_timeout: Duration,
    /// `--max-filesize` cap for downloaded clips
    pub clip_size_limit_mb: u64,
    pub proxy: Option<String>,
    pub cookies_file: Option<PathBuf>,
    pub cookies_content: Option<String>,
    /// Fixed user agent; disables rotation when set
    pub user_agent: Option<String>,
    pub user_agent_rotation: bool,
    pub extractor_retries: u32,
    /// Base pacing between requests, in seconds
    pub sleep_interval: u32,
    /// How long a scoped cookie file outlives its attempt
    pub cookie_cleanup_delay: Duration,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            command_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(600),
            clip_size_limit_mb: 300,
            proxy: None,
            cookies_file: None,
            cookies_content: None,
            user_agent: None,
            user_agent_rotation: true,
            extractor_retries: 3,
            sleep_interval: 2,
            cookie_cleanup_delay: Duration::from_secs(30),
        }
    }
}

impl YtDlpConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            binary: env::string_or("YT_DLP_PATH", &defaults.binary),
            command_timeout: Duration::from_secs(env::parse_or(
                "YT_DLP_COMMAND_TIMEOUT_IN_SECONDS",
                60,
            )),
            download_timeout: Duration::from_secs(env::parse_or(
                "YT_DLP_DOWNLOAD_TIMEOUT_IN_SECONDS",
                600,
            )),
            clip_size_limit_mb: env::parse_or("YT_DLP_CLIP_SIZE_LIMIT_IN_MB", 300),
            proxy: env::string("YT_DLP_PROXY"),
            cookies_file: env::string("YT_DLP_COOKIES_FILE").map(PathBuf::from),
            cookies_content: env::string("YT_DLP_COOKIES_CONTENT"),
            user_agent: env::string("YT_DLP_USER_AGENT"),
            user_agent_rotation: env::flag("YT_DLP_ENABLE_USER_AGENT_ROTATION", true),
            extractor_retries: env::parse_or("YT_DLP_EXTRACTOR_RETRIES", 3),
            sleep_interval: env::parse_or("YT_DLP_SLEEP_INTERVAL", 2),
            cookie_cleanup_delay: Duration::from_secs(env::parse_or(
                "YT_DLP_COOKIE_CLEANUP_DELAY_IN_SECONDS",
                30,
            )),
        }
    }

    /// The configured credential source.
    pub fn cookie_source(&self) -> CookieSource {
        CookieSource::from_parts(self.cookies_content.clone(), self.cookies_file.clone())
    }

    /// Clip size cap in bytes.
    pub fn max_filesize_bytes(&self) -> u64 {
        self.clip_size_limit_mb * 1024 * 1024
    }
}
