//! Sentinel Governance Engine
//!
//! Scores agent-proposed infrastructure actions against blast radius, policy
//! compliance, historical precedent, and financial impact, then approves,
//! escalates, or denies them. Exposed over a streaming HTTP surface, a
//! stdio tool protocol, and a read-only dashboard REST surface.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use sentinel_surface::config::AppConfig;
use sentinel_surface::state::AppState;
use sentinel_surface::{dashboard, http, stdio, Cli};

/// Global shutdown flag
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Check if shutdown has been requested
pub fn is_shutting_down() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting Sentinel governance engine");

    let config = AppConfig::load(&cli)?;
    info!(use_local_mocks = config.core.use_local_mocks, server_url = %config.core.server_url, "configuration loaded");

    let metrics_handle = init_metrics()?;

    info!("Initializing application state...");
    let state = AppState::new(config, metrics_handle).await?;
    info!("Application state initialized");

    if cli.stdio {
        info!("Running stdio tool protocol");
        return stdio::run(state).await;
    }

    let addr: SocketAddr = format!("{}:{}", state.config.listen_host, state.config.listen_port).parse()?;

    let app = http::router()
        .merge(dashboard::router())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        SHUTDOWN.store(true, Ordering::SeqCst);
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("sentinel=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sentinel=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "sentinel_actions_evaluated_total",
        "Total number of proposed actions evaluated"
    );
    metrics::describe_counter!(
        "sentinel_decisions_total",
        "Total number of governance decisions by outcome"
    );
    metrics::describe_histogram!(
        "sentinel_pipeline_latency_us",
        metrics::Unit::Microseconds,
        "Pipeline evaluation latency in microseconds"
    );
    metrics::describe_counter!("sentinel_errors_total", "Total number of errors by kind");

    info!("Metrics exporter initialized");
    Ok(handle)
}
