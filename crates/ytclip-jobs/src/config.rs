//! Job processing and cleanup configuration.

use std::path::PathBuf;
use std::time::Duration;

use ytclip_models::env;

const DEFAULT_CLIP_DIR: &str = "./videos/";

/// Clip processing configuration.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Where finished clips are written
    pub clip_dir: PathBuf,
    /// Jobs allowed past `Queued` at the same time
    pub max_concurrent_jobs: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            clip_dir: PathBuf::from(DEFAULT_CLIP_DIR),
            max_concurrent_jobs: 4,
        }
    }
}

impl ProcessorConfig {
    pub fn from_env() -> Self {
        Self {
            clip_dir: clip_dir_from_env(),
            max_concurrent_jobs: env::parse_or("MAX_CONCURRENT_JOBS", 4usize).max(1),
        }
    }
}

/// Cleanup scheduler configuration.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub enabled: bool,
    /// Time between sweeps
    pub interval: Duration,
    /// Minimum age before a clip or job is removed
    pub retention: Duration,
    pub clip_dir: PathBuf,
    /// Also remove failed jobs past retention
    pub sweep_failed_jobs: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(5 * 60),
            retention: Duration::from_secs(5 * 60),
            clip_dir: PathBuf::from(DEFAULT_CLIP_DIR),
            sweep_failed_jobs: false,
        }
    }
}

impl CleanupConfig {
    pub fn from_env() -> Self {
        let interval_minutes: u64 =
            env::parse_or("CLIP_CLEANUP_SCHEDULER_INTERVAL_IN_MINUTES", 5u64).max(1);
        let retention_minutes: u64 =
            env::parse_or("CLIP_CLEANUP_SCHEDULER_RETENTION_IN_MINUTES", interval_minutes);

        Self {
            enabled: env::flag("CLIP_CLEANUP_SCHEDULER_ENABLED", true),
            interval: Duration::from_secs(interval_minutes * 60),
            retention: Duration::from_secs(retention_minutes * 60),
            clip_dir: clip_dir_from_env(),
            sweep_failed_jobs: env::flag("CLIP_CLEANUP_SCHEDULER_SWEEP_FAILED_JOBS", false),
        }
    }
}

fn clip_dir_from_env() -> PathBuf {
    PathBuf::from(env::string_or(
        "CLIP_CLEANUP_SCHEDULER_CLIP_DIRECTORY_PATH",
        DEFAULT_CLIP_DIR,
    ))
}
