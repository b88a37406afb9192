//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{
    create_clip, download_clip, get_schedulers, health, job_status, update_schedulers,
    video_duration, video_formats,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{basic_auth, rate_limit_middleware, request_logging, RateLimiterCache};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let rate_limiter = Arc::new(RateLimiterCache::new(
        state.config.rate_limit_rps,
        state.config.rate_limit_burst,
    ));

    let api_routes = Router::new()
        .route("/clip", get(download_clip).post(create_clip))
        .route("/jobs/status", get(job_status))
        .route("/video/duration", get(video_duration))
        .route("/video/formats", get(video_formats))
        .route("/admin/schedulers", get(get_schedulers).put(update_schedulers))
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    let static_dir = &state.config.static_dir;
    let auth = state.config.auth.clone();

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health))
        .merge(metrics_routes)
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback_service(ServeDir::new(static_dir))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging))
        .with_state(state);

    match auth {
        Some(credentials) => router.layer(middleware::from_fn_with_state(
            Arc::new(credentials),
            basic_auth,
        )),
        None => router,
    }
}
