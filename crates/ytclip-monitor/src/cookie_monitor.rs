//! Periodic session-cookie health checks.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use ytclip_media::{CookieSource, VideoSource};
use ytclip_models::{CookieInfo, ESTIMATED_COOKIE_NAME, TRACKED_COOKIE_NAME};

use crate::config::CookieMonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::notifications::CookieNotifier;
use crate::ntfy::Notification;

/// Assumed lifetime when the tracked cookie is missing from the file.
const ESTIMATED_LIFETIME_DAYS: i64 = 6 * 30;

/// Result of one health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthOutcome {
    NotConfigured,
    Healthy,
    Warning,
    Urgent,
    Expired,
    ApiValidationFailed,
}

impl HealthOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthOutcome::NotConfigured => "not_configured",
            HealthOutcome::Healthy => "healthy",
            HealthOutcome::Warning => "warning",
            HealthOutcome::Urgent => "urgent",
            HealthOutcome::Expired => "expired",
            HealthOutcome::ApiValidationFailed => "api_validation_failed",
        }
    }
}

/// Read the tracked cookie's expiry from Netscape cookie content.
///
/// Falls back to an estimate of `now` + six months when the cookie is absent.
pub fn parse_expiration(content: &str, now: DateTime<Utc>) -> MonitorResult<CookieInfo> {
    if content.trim().is_empty() {
        return Err(MonitorError::EmptyContent);
    }

    let tracked = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .find_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 || !fields[5].contains(TRACKED_COOKIE_NAME) {
                return None;
            }
            let epoch: i64 = fields[4].parse().ok()?;
            let expires_at = DateTime::from_timestamp(epoch, 0)?;
            Some((fields[5].to_string(), expires_at))
        });

    match tracked {
        Some((name, expires_at)) => Ok(CookieInfo {
            name,
            expires_at,
            is_valid: now < expires_at,
        }),
        None => {
            warn!("{} cookie not found, estimating 6 months expiration", TRACKED_COOKIE_NAME);
            Ok(CookieInfo {
                name: ESTIMATED_COOKIE_NAME.to_string(),
                expires_at: now + Duration::days(ESTIMATED_LIFETIME_DAYS),
                is_valid: true,
            })
        }
    }
}

/// Grade time-to-expiry against the urgent and warning thresholds.
pub fn classify(remaining: Duration, warning: Duration, urgent: Duration) -> HealthOutcome {
    if remaining <= Duration::zero() {
        HealthOutcome::Expired
    } else if remaining <= urgent {
        HealthOutcome::Urgent
    } else if remaining <= warning {
        HealthOutcome::Warning
    } else {
        HealthOutcome::Healthy
    }
}

/// Watches the configured cookies and notifies before they lapse.
#[derive(Clone)]
pub struct CookieMonitor {
    config: CookieMonitorConfig,
    cookies: CookieSource,
    notifier: CookieNotifier,
    probe: Arc<dyn VideoSource>,
    enabled: Arc<AtomicBool>,
}

impl CookieMonitor {
    pub fn new(
        config: CookieMonitorConfig,
        cookies: CookieSource,
        notifier: CookieNotifier,
        probe: Arc<dyn VideoSource>,
    ) -> Self {
        let enabled = Arc::new(AtomicBool::new(config.enabled));
        Self {
            config,
            cookies,
            notifier,
            probe,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        info!(enabled, "Cookie monitor toggled");
    }

    pub fn config(&self) -> &CookieMonitorConfig {
        &self.config
    }

    /// Start the periodic check loop.
    pub fn spawn(&self) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.run().await })
    }

    /// Send the startup test notification, then check on every tick while enabled.
    pub async fn run(&self) {
        info!(
            interval_hours = self.config.interval.as_secs() / 3600,
            enabled = self.is_enabled(),
            "Starting cookie monitor"
        );

        if self.is_enabled() && self.notifier.is_enabled() {
            match self.notifier.send_test().await {
                Ok(()) => info!("Sent cookie monitor test notification"),
                Err(e) => warn!("Failed to send cookie monitor test notification: {}", e),
            }
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if !self.is_enabled() {
                debug!("Cookie monitor disabled, skipping check");
                continue;
            }

            match self.check_health().await {
                Ok(outcome) => debug!(outcome = outcome.as_str(), "Cookie health check finished"),
                Err(e) => error!("Cookie health check failed: {}", e),
            }
        }
    }

    /// Evaluate the cookies once and send whatever notification the result calls for.
    pub async fn check_health(&self) -> MonitorResult<HealthOutcome> {
        info!("Checking cookie health");

        let Some(content) = self.cookies.read_content().await? else {
            info!("No cookies configured, anonymous strategies only");
            return Ok(HealthOutcome::NotConfigured);
        };

        let now = Utc::now();
        let cookie = parse_expiration(&content, now)?;
        let remaining = cookie.expires_at - now;

        info!(
            cookie = %cookie.name,
            expires_at = %cookie.expires_at.to_rfc3339(),
            remaining_hours = remaining.num_hours(),
            "Cookie expiry"
        );

        if self.config.api_validation_enabled {
            info!("Performing API validation for cookie health");
            if let Err(e) = self.validate_with_api().await {
                error!("API validation failed: {}", e);
                self.notify(self.notifier.api_validation_failed(&e)).await;
                warn!("Skipping time-based notifications due to API validation failure");
                return Ok(self.record(HealthOutcome::ApiValidationFailed));
            }
            info!("API validation successful");
        }

        let outcome = classify(
            remaining,
            self.config.warning_threshold,
            self.config.urgent_threshold,
        );

        match outcome {
            HealthOutcome::Expired => {
                self.notify(self.notifier.expired(&cookie.name, cookie.expires_at))
                    .await
            }
            HealthOutcome::Urgent => {
                self.notify(self.notifier.urgent(&cookie.name, remaining, cookie.expires_at))
                    .await
            }
            HealthOutcome::Warning => {
                self.notify(self.notifier.warning(&cookie.name, remaining, cookie.expires_at))
                    .await
            }
            _ => info!(remaining_days = remaining.num_days(), "Cookie is healthy"),
        }

        Ok(self.record(outcome))
    }

    /// Fetch the test video's duration with the live invocation chain.
    ///
    /// The probe runs on its own task so a panic becomes an error. It is
    /// aborted when the timeout elapses.
    pub async fn validate_with_api(&self) -> MonitorResult<()> {
        let url = self
            .config
            .test_video_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or(MonitorError::MissingTestUrl)?;

        info!(url = %url, "Validating cookies against test video");

        let probe = self.probe.clone();
        let mut handle = tokio::spawn(async move { probe.video_duration_seconds(&url).await });
        let limit = self.config.api_validation_timeout;

        match tokio::time::timeout(limit, &mut handle).await {
            Ok(Ok(Ok(0))) => Err(MonitorError::probe_failed("received empty duration response")),
            Ok(Ok(Ok(seconds))) => {
                info!(seconds, "Cookie validation retrieved duration");
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(MonitorError::probe_failed(format!(
                "failed to get video duration: {e}"
            ))),
            Ok(Err(join_error)) if join_error.is_panic() => Err(MonitorError::ProbePanicked(
                panic_message(join_error.into_panic()),
            )),
            Ok(Err(join_error)) => Err(MonitorError::probe_failed(join_error.to_string())),
            Err(_) => {
                handle.abort();
                Err(MonitorError::ProbeTimeout(limit))
            }
        }
    }

    async fn notify(&self, notification: Notification) {
        if let Err(e) = self.notifier.send(&notification).await {
            error!(title = %notification.title, "Failed to send cookie notification: {}", e);
        }
    }

    fn record(&self, outcome: HealthOutcome) -> HealthOutcome {
        metrics::counter!("ytclip_cookie_checks_total", "outcome" => outcome.as_str()).increment(1);
        outcome
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
