//! ntfy push-notification client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::info;
use ytclip_models::env;

use crate::error::{MonitorError, MonitorResult};

/// ntfy message priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Min,
    Low,
    #[default]
    Default,
    High,
    Max,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Min => "min",
            Priority::Low => "low",
            Priority::Default => "default",
            Priority::High => "high",
            Priority::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: String,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub tags: Vec<String>,
}

/// Outbound notification transport.
///
/// Delivery is best-effort: callers log failures and move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> MonitorResult<()>;

    fn is_enabled(&self) -> bool;
}

/// ntfy configuration.
#[derive(Debug, Clone, Default)]
pub struct NtfyConfig {
    pub enabled: bool,
    pub server_url: Option<String>,
}

impl NtfyConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env::flag("NTFY_ENABLED", false),
            server_url: env::string("NTFY_SERVER_URL"),
        }
    }
}

/// POSTs notifications to `<server>/<topic>`.
#[derive(Debug, Clone)]
pub struct NtfyClient {
    http: Client,
    config: NtfyConfig,
}

impl NtfyClient {
    pub fn new(config: NtfyConfig) -> MonitorResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("ytclipper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    fn headers(notification: &Notification) -> MonitorResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        // Titles carry emoji, so accept raw UTF-8 bytes.
        let title = HeaderValue::from_bytes(notification.title.as_bytes())
            .map_err(|_| MonitorError::InvalidHeader(notification.title.clone()))?;
        headers.insert("title", title);
        headers.insert("priority", HeaderValue::from_static(notification.priority.as_str()));

        if !notification.tags.is_empty() {
            let tags = notification.tags.join(",");
            let value = HeaderValue::from_str(&tags).map_err(|_| MonitorError::InvalidHeader(tags))?;
            headers.insert("tags", value);
        }

        Ok(headers)
    }
}

#[async_trait]
impl Notifier for NtfyClient {
    async fn send(&self, notification: &Notification) -> MonitorResult<()> {
        if !self.config.enabled {
            info!(title = %notification.title, "Ntfy notifications disabled, skipping notification");
            return Ok(());
        }

        let server = self
            .config
            .server_url
            .as_deref()
            .ok_or(MonitorError::MissingServerUrl)?;
        if notification.topic.is_empty() {
            return Err(MonitorError::MissingTopic);
        }

        let url = format!("{}/{}", server.trim_end_matches('/'), notification.topic);
        info!(topic = %notification.topic, title = %notification.title, "Sending ntfy notification");

        let response = self
            .http
            .post(&url)
            .headers(Self::headers(notification)?)
            .body(notification.message.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::UnexpectedStatus(status.as_u16()));
        }

        metrics::counter!("ytclip_notifications_sent_total", "priority" => notification.priority.as_str())
            .increment(1);
        info!(topic = %notification.topic, "Sent ntfy notification");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}
