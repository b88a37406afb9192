//! API configuration.

use std::path::PathBuf;

use ytclip_models::env;

/// Credentials for HTTP basic auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Debug mode (verbose logging defaults)
    pub debug: bool,
    /// Sustained requests per second per client IP
    pub rate_limit_rps: u32,
    pub rate_limit_burst: u32,
    /// Basic auth, disabled when unset
    pub auth: Option<BasicAuthConfig>,
    pub static_dir: PathBuf,
    pub metrics_enabled: bool,
    /// Max request body size
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            debug: true,
            rate_limit_rps: 5,
            rate_limit_burst: 20,
            auth: None,
            static_dir: PathBuf::from("./static"),
            metrics_enabled: true,
            max_body_size: 64 * 1024,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let auth = match (env::string("AUTH_USERNAME"), env::string("AUTH_PASSWORD")) {
            (Some(username), Some(password)) => Some(BasicAuthConfig { username, password }),
            _ => None,
        };

        Self {
            host: env::string_or("HOST", "0.0.0.0"),
            port: env::parse_or("PORT", 8080),
            debug: env::flag("DEBUG", true),
            rate_limit_rps: env::parse_or("RATE_LIMITER_RATE", 5),
            rate_limit_burst: env::parse_or("RATE_LIMITER_BURST", 20),
            auth,
            static_dir: PathBuf::from(env::string_or("STATIC_DIR", "./static")),
            metrics_enabled: env::flag("METRICS_ENABLED", true),
            max_body_size: 64 * 1024,
        }
    }
}
