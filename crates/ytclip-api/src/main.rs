//! YTClipper API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ytclip_api::{create_router, metrics, ApiConfig, AppState};
use ytclip_jobs::{CleanupConfig, CleanupScheduler, ClipProcessor, JobRegistry, ProcessorConfig};
use ytclip_media::{VideoSource, YtDlpClient, YtDlpConfig};
use ytclip_monitor::{CookieMonitor, CookieMonitorConfig, CookieNotifier, NtfyClient, NtfyConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env();
    init_tracing(config.debug);

    info!("Starting ytclip-api");
    info!("API config: host={}, port={}", config.host, config.port);

    // Before any background loop records its first tick.
    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("failed to install Prometheus recorder")?)
    } else {
        None
    };

    let ytdlp_config = YtDlpConfig::from_env();
    let client = YtDlpClient::new(&ytdlp_config);
    if let Err(e) = client.check_dependencies() {
        error!("Missing external dependency: {}", e);
        std::process::exit(1);
    }
    if !ytdlp_config.cookie_source().is_configured() {
        warn!("No cookies configured; authenticated strategies will be skipped");
    }
    let source: Arc<dyn VideoSource> = Arc::new(client);

    let registry = Arc::new(JobRegistry::new());
    let processor = ClipProcessor::new(
        Arc::clone(&registry),
        Arc::clone(&source),
        &ProcessorConfig::from_env(),
    );

    let cleanup = CleanupScheduler::new(CleanupConfig::from_env(), Arc::clone(&registry));
    cleanup.spawn();

    let monitor_config = CookieMonitorConfig::from_env();
    let ntfy = NtfyClient::new(NtfyConfig::from_env()).context("failed to build ntfy client")?;
    let notifier = CookieNotifier::new(Arc::new(ntfy), monitor_config.ntfy_topic.clone());
    let cookie_monitor = CookieMonitor::new(
        monitor_config,
        ytdlp_config.cookie_source(),
        notifier,
        Arc::clone(&source),
    );
    cookie_monitor.spawn();

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid bind address")?;

    let state = AppState::new(config, processor, source, cleanup, cookie_monitor);
    let app = create_router(state, metrics_handle);

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing(debug: bool) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let default_level = if debug { "ytclip=debug,info" } else { "ytclip=info,warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Received shutdown signal");
}
