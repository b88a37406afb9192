//! Clip job orchestration.
//!
//! - [`JobRegistry`]: in-memory job store with checked transitions
//! - [`ClipProcessor`]: bounded asynchronous job driver
//! - [`CleanupScheduler`]: retention sweeps over clips and finished jobs

pub mod cleanup;
pub mod config;
pub mod error;
pub mod logging;
pub mod processor;
pub mod registry;

pub use cleanup::CleanupScheduler;
pub use config::{CleanupConfig, ProcessorConfig};
pub use error::{JobsError, JobsResult};
pub use logging::JobLogger;
pub use processor::ClipProcessor;
pub use registry::JobRegistry;
