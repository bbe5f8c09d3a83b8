//! Arena model server
//!
//! Serves the game client's static assets and its OBJ models, parsed into
//! per-object vertex buffers ready for mesh construction.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_models::app::AppState;
use arena_models::config::Config;
use arena_models::http::build_router;
use arena_models::util::time::{init_server_time, Timer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    // Initialize server time tracking
    init_server_time();

    info!("Starting arena model server v{}", arena_models::VERSION);
    info!("Server address: {}", config.server_addr);
    info!(
        asset_dir = %config.asset_dir.display(),
        polygon_mode = ?config.polygon_mode,
        "Model settings"
    );

    // Create application state
    let state = AppState::new(config.clone());

    warm_model_cache(&state).await;

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Models: http://{}/models", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Parse every model once at startup and log the ones that fail
async fn warm_model_cache(state: &AppState) {
    let timer = Timer::new();

    let entries = match state.models.list().await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Could not list asset directory");
            return;
        }
    };

    for entry in &entries {
        if let Err(e) = state.models.get(&entry.name).await {
            warn!(model = %entry.name, error = %e, "Model failed to load");
        }
    }

    info!(
        models = entries.len(),
        cached = state.models.cached_count(),
        elapsed_ms = timer.elapsed_ms(),
        "Model cache warmed"
    );
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
