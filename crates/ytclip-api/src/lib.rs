//! Axum HTTP API server for YTClipper.
//!
//! Exposes clip submission and delivery, job status, video metadata and
//! scheduler controls over the job and monitor crates.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, BasicAuthConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
