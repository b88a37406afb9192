//! Graded cookie-health notifications.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::{MonitorError, MonitorResult};
use crate::ntfy::{Notification, Notifier, Priority};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Builds and sends cookie notifications to one ntfy topic.
#[derive(Clone)]
pub struct CookieNotifier {
    notifier: Arc<dyn Notifier>,
    topic: String,
}

impl CookieNotifier {
    pub fn new(notifier: Arc<dyn Notifier>, topic: impl Into<String>) -> Self {
        Self {
            notifier,
            topic: topic.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_enabled()
    }

    pub async fn send(&self, notification: &Notification) -> MonitorResult<()> {
        self.notifier.send(notification).await
    }

    /// Sends the startup test message. Errors when notifications are disabled.
    pub async fn send_test(&self) -> MonitorResult<()> {
        if !self.notifier.is_enabled() {
            return Err(MonitorError::NotificationsDisabled);
        }
        self.send(&self.test()).await
    }

    pub fn warning(&self, cookie: &str, remaining: Duration, expires_at: DateTime<Utc>) -> Notification {
        self.alert(
            "🟡 YouTube Cookie Warning",
            format!(
                "YouTube cookie '{}' will expire in {} days\n\nExpiration: {}\n\nPlease update your cookies soon to avoid disruption.",
                cookie,
                remaining.num_days(),
                expires_at.format(DATE_FORMAT)
            ),
            &["cookie", "youtube", "warning"],
        )
    }

    pub fn urgent(&self, cookie: &str, remaining: Duration, expires_at: DateTime<Utc>) -> Notification {
        self.critical(
            "🔴 URGENT: YouTube Cookie Expiring",
            format!(
                "⚠️ YouTube cookie '{}' expires in {} hours!\n\nExpiration: {}\n\n🚨 ACTION REQUIRED: Update cookies immediately to prevent service disruption.",
                cookie,
                remaining.num_hours(),
                expires_at.format(DATE_FORMAT)
            ),
            &["cookie", "youtube", "urgent"],
        )
    }

    pub fn expired(&self, cookie: &str, expired_at: DateTime<Utc>) -> Notification {
        self.critical(
            "❌ YouTube Cookie EXPIRED",
            format!(
                "💥 YouTube cookie '{}' has EXPIRED!\n\nExpired: {}\n\n🛠️ SERVICE DISRUPTION: downloads now fall back to anonymous strategies. Update cookies to restore full functionality.",
                cookie,
                expired_at.format(DATE_FORMAT)
            ),
            &["cookie", "youtube", "expired"],
        )
    }

    pub fn api_validation_failed(&self, error: &MonitorError) -> Notification {
        self.critical(
            "🚫 YouTube Cookie Validation Failed",
            format!(
                "A live request with the configured cookies failed.\n\nError: {}\n\nCookies may be revoked or blocked. Export fresh cookies to restore authenticated downloads.",
                error
            ),
            &["cookie", "youtube", "api-validation"],
        )
    }

    pub fn healthy(&self, cookie: &str, remaining: Duration) -> Notification {
        Notification {
            topic: self.topic.clone(),
            title: "✅ YouTube Cookie Healthy".to_string(),
            message: format!(
                "YouTube cookie '{}' is healthy\n\nExpires in {} days\n\nNo action required.",
                cookie,
                remaining.num_days()
            ),
            priority: Priority::Low,
            tags: tags(&["cookie", "youtube", "healthy"], &[]),
        }
    }

    pub fn test(&self) -> Notification {
        Notification {
            topic: self.topic.clone(),
            title: "🧪 Cookie Monitoring Test".to_string(),
            message: "Cookie monitoring is working correctly!\n\nThis is a test notification to verify your cookie monitoring configuration.".to_string(),
            priority: Priority::Low,
            tags: tags(&["cookie", "test", "monitoring"], &[]),
        }
    }

    fn alert(&self, title: &str, message: String, base: &[&str]) -> Notification {
        Notification {
            topic: self.topic.clone(),
            title: title.to_string(),
            message,
            priority: Priority::High,
            tags: tags(base, &["alert", "ytclipper"]),
        }
    }

    fn critical(&self, title: &str, message: String, base: &[&str]) -> Notification {
        Notification {
            topic: self.topic.clone(),
            title: title.to_string(),
            message,
            priority: Priority::Max,
            tags: tags(base, &["critical", "ytclipper"]),
        }
    }
}

fn tags(base: &[&str], extra: &[&str]) -> Vec<String> {
    base.iter().chain(extra).map(|t| t.to_string()).collect()
}
