//! Retention-based cleanup of clip files and finished jobs.
//!
//! Two loops share one configuration. Both read the live `enabled` flag on
//! every tick, so cleanup can be paused without a restart.

use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::CleanupConfig;
use crate::registry::JobRegistry;

#[derive(Clone)]
pub struct CleanupScheduler {
    config: CleanupConfig,
    registry: Arc<JobRegistry>,
    enabled: Arc<AtomicBool>,
}

impl CleanupScheduler {
    pub fn new(config: CleanupConfig, registry: Arc<JobRegistry>) -> Self {
        let enabled = Arc::new(AtomicBool::new(config.enabled));
        Self {
            config,
            registry,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        info!(enabled, "Cleanup scheduler toggled");
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Start the file and job sweep loops.
    pub fn spawn(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            retention_secs = self.config.retention.as_secs(),
            clip_dir = %self.config.clip_dir.display(),
            enabled = self.is_enabled(),
            "Starting cleanup scheduler"
        );

        let files = self.clone();
        let file_loop = tokio::spawn(async move {
            let mut ticker = ticker(files.config.interval);
            loop {
                ticker.tick().await;
                files.sweep_files().await;
            }
        });

        let jobs = self.clone();
        let job_loop = tokio::spawn(async move {
            let mut ticker = ticker(jobs.config.interval);
            loop {
                ticker.tick().await;
                jobs.sweep_jobs();
            }
        });

        (file_loop, job_loop)
    }

    /// Delete clip files older than the retention window. Returns the count.
    pub async fn sweep_files(&self) -> usize {
        if !self.is_enabled() {
            debug!("Cleanup disabled, skipping file sweep");
            return 0;
        }

        let dir = &self.config.clip_dir;
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "Clip directory does not exist yet");
                return 0;
            }
            Err(e) => {
                warn!(dir = %dir.display(), "Failed to read clip directory: {}", e);
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read clip directory entry: {}", e);
                    break;
                }
            };

            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %path.display(), "Failed to stat clip: {}", e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or(Duration::ZERO);
            if age <= self.config.retention {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    debug!(path = %path.display(), age_secs = age.as_secs(), "Removed expired clip");
                }
                Err(e) => warn!(path = %path.display(), "Failed to remove clip: {}", e),
            }
        }

        if removed > 0 {
            info!(removed, "Clip file sweep complete");
            metrics::counter!("ytclip_cleanup_removed_total", "kind" => "file").increment(removed as u64);
        }
        removed
    }

    /// Drop finished jobs older than the retention window. Returns the count.
    pub fn sweep_jobs(&self) -> usize {
        if !self.is_enabled() {
            debug!("Cleanup disabled, skipping job sweep");
            return 0;
        }

        let retention = chrono::Duration::from_std(self.config.retention)
            .unwrap_or_else(|_| chrono::Duration::MAX);
        let cutoff = chrono::Utc::now()
            .checked_sub_signed(retention)
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);

        let removed = self
            .registry
            .sweep_finished(cutoff, self.config.sweep_failed_jobs);

        if removed > 0 {
            info!(removed, "Job registry sweep complete");
            metrics::counter!("ytclip_cleanup_removed_total", "kind" => "job").increment(removed as u64);
        }
        removed
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::Path;
    use ytclip_models::JobStatus;

    const HOUR: Duration = Duration::from_secs(3600);

    fn scheduler(dir: &Path, enabled: bool, sweep_failed_jobs: bool) -> CleanupScheduler {
        let config = CleanupConfig {
            enabled,
            interval: HOUR,
            retention: HOUR,
            clip_dir: dir.to_path_buf(),
            sweep_failed_jobs,
        };
        CleanupScheduler::new(config, Arc::new(JobRegistry::new()))
    }

    fn write_aged(path: &Path, age: Duration) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_file_sweep_respects_retention() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.mp4");
        let fresh = dir.path().join("fresh.mp4");
        write_aged(&old, HOUR * 2);
        write_aged(&fresh, Duration::from_secs(60));
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let scheduler = scheduler(dir.path(), true, false);
        assert_eq!(scheduler.sweep_files().await, 1);

        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_file_sweep_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.mp4");
        write_aged(&old, HOUR * 2);

        let scheduler = scheduler(dir.path(), false, false);
        assert_eq!(scheduler.sweep_files().await, 0);
        assert!(old.exists());

        // The flag is read on every sweep.
        scheduler.set_enabled(true);
        assert_eq!(scheduler.sweep_files().await, 1);
        assert!(!old.exists());
    }

    #[tokio::test]
    async fn test_file_sweep_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = scheduler(&dir.path().join("absent"), true, false);
        assert_eq!(scheduler.sweep_files().await, 0);
    }

    #[test]
    fn test_job_sweep_keeps_recent_and_failed() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = scheduler(dir.path(), true, false);
        let registry = scheduler.registry.clone();

        let done = registry.create();
        registry.start(&done).unwrap();
        registry.complete(&done, "a.mp4").unwrap();

        let failed = registry.create();
        registry.fail(&failed, "boom").unwrap();

        // Everything finished just now, inside the window
        assert_eq!(scheduler.sweep_jobs(), 0);
        assert_eq!(registry.get(&done).unwrap().status, JobStatus::Completed);
        assert!(registry.get(&failed).is_some());
    }

    #[test]
    fn test_job_sweep_zero_retention() {
        let dir = tempfile::tempdir().unwrap();
        let config = CleanupConfig {
            clip_dir: dir.path().to_path_buf(),
            retention: Duration::ZERO,
            ..CleanupConfig::default()
        };
        let registry = Arc::new(JobRegistry::new());
        let scheduler = CleanupScheduler::new(config, registry.clone());

        let done = registry.create();
        registry.start(&done).unwrap();
        registry.complete(&done, "a.mp4").unwrap();
        let failed = registry.create();
        registry.fail(&failed, "boom").unwrap();

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(scheduler.sweep_jobs(), 1);
        assert!(registry.get(&done).is_none());
        assert!(registry.get(&failed).is_some());
    }

    #[test]
    fn test_job_sweep_includes_failed_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let config = CleanupConfig {
            clip_dir: dir.path().to_path_buf(),
            retention: Duration::ZERO,
            sweep_failed_jobs: true,
            ..CleanupConfig::default()
        };
        let registry = Arc::new(JobRegistry::new());
        let scheduler = CleanupScheduler::new(config, registry.clone());

        let failed = registry.create();
        registry.fail(&failed, "boom").unwrap();

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(scheduler.sweep_jobs(), 1);
        assert!(registry.is_empty());
    }
}
