//! Application state.

use std::sync::Arc;

use ytclip_jobs::{CleanupScheduler, ClipProcessor, JobRegistry};
use ytclip_media::VideoSource;
use ytclip_monitor::CookieMonitor;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub registry: Arc<JobRegistry>,
    pub processor: ClipProcessor,
    pub source: Arc<dyn VideoSource>,
    pub cleanup: CleanupScheduler,
    pub cookie_monitor: CookieMonitor,
}

impl AppState {
    /// Assemble state from already-built collaborators.
    ///
    /// `cleanup` is expected to sweep the processor's registry.
    pub fn new(
        config: ApiConfig,
        processor: ClipProcessor,
        source: Arc<dyn VideoSource>,
        cleanup: CleanupScheduler,
        cookie_monitor: CookieMonitor,
    ) -> Self {
        Self {
            config,
            registry: processor.registry().clone(),
            processor,
            source,
            cleanup,
            cookie_monitor,
        }
    }
}
