//! Cookie health monitoring for YTClipper.
//!
//! - [`NtfyClient`]: push notifications behind the [`Notifier`] trait
//! - [`CookieNotifier`]: graded warning/urgent/expired messages
//! - [`CookieMonitor`]: periodic expiry checks with optional live validation

pub mod config;
pub mod cookie_monitor;
pub mod error;
pub mod notifications;
pub mod ntfy;

pub use config::CookieMonitorConfig;
pub use cookie_monitor::{classify, parse_expiration, CookieMonitor, HealthOutcome};
pub use error::{MonitorError, MonitorResult};
pub use notifications::CookieNotifier;
pub use ntfy::{Notification, Notifier, NtfyClient, NtfyConfig, Priority};
