//! Axum API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn};

use narrate_api::{create_router, metrics, ApiConfig, AppState};
use narrate_compiler::telemetry::init_tracing;
use narrate_compiler::{CompilerConfig, FfmpegToolkit, SceneCompiler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting narrate-api");

    let config = ApiConfig::from_env();
    let compiler_config = CompilerConfig::from_env();
    info!(
        host = %config.host,
        port = config.port,
        work_dir = %compiler_config.work_dir.display(),
        max_concurrent = config.max_concurrent_compilations,
        "API config loaded"
    );

    if let Err(e) = FfmpegToolkit::check_tools() {
        warn!("{}; compile requests will fail until it is installed", e);
    }

    let compiler = SceneCompiler::with_ffmpeg(compiler_config).context("Failed to create compiler")?;
    let state = AppState::new(config.clone(), compiler);

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install Prometheus recorder")?)
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
