//! Cookie monitor configuration.

use std::time::Duration;

use ytclip_models::env;

#[derive(Debug, Clone)]
pub struct CookieMonitorConfig {
    pub enabled: bool,
    pub interval: Duration,
    /// Notify with high priority when expiry is this close
    pub warning_threshold: chrono::Duration,
    /// Notify with max priority when expiry is this close
    pub urgent_threshold: chrono::Duration,
    pub ntfy_topic: String,
    /// Probe the upstream with the cookies on every check
    pub api_validation_enabled: bool,
    pub test_video_url: Option<String>,
    pub api_validation_timeout: Duration,
}

impl Default for CookieMonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(24 * 3600),
            warning_threshold: chrono::Duration::days(30),
            urgent_threshold: chrono::Duration::days(7),
            ntfy_topic: "ytclipper-cookies".to_string(),
            api_validation_enabled: false,
            test_video_url: None,
            api_validation_timeout: Duration::from_secs(30),
        }
    }
}

impl CookieMonitorConfig {
    pub fn from_env() -> Self {
        let interval_hours: u64 = env::parse_or("COOKIE_MONITOR_INTERVAL_HOURS", 24u64).max(1);

        Self {
            enabled: env::flag("COOKIE_MONITOR_ENABLED", true),
            interval: Duration::from_secs(interval_hours * 3600),
            warning_threshold: chrono::Duration::days(env::parse_or(
                "COOKIE_MONITOR_WARNING_THRESHOLD_DAYS",
                30,
            )),
            urgent_threshold: chrono::Duration::days(env::parse_or(
                "COOKIE_MONITOR_URGENT_THRESHOLD_DAYS",
                7,
            )),
            ntfy_topic: env::string_or("COOKIE_MONITOR_NTFY_TOPIC", "ytclipper-cookies"),
            api_validation_enabled: env::flag("COOKIE_MONITOR_API_VALIDATION_ENABLED", false),
            test_video_url: env::string("COOKIE_MONITOR_TEST_VIDEO_URL"),
            api_validation_timeout: Duration::from_secs(env::parse_or(
                "COOKIE_MONITOR_API_VALIDATION_TIMEOUT_SECONDS",
                30,
            )),
        }
    }
}
