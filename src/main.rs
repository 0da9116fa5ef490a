//! Tiercache - a tiered caching layer
//!
//! HTTP service exposing the cache orchestrator over in-memory tiers.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiercache::{create_router, AppState, CacheContext, Config, InMemoryBackend};

/// Main entry point for the tiercache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache context (fails fast on bad configuration)
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tiercache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: timezone={}, tier_threshold_kb={}, extension={}s, port={}",
        config.timezone_name(),
        config.tier_threshold_kb,
        config.default_expiration_extension_seconds,
        config.server_port
    );

    let primary_limit = usize::try_from(config.tier_threshold_kb.saturating_mul(1024))
        .unwrap_or(usize::MAX);
    let primary = InMemoryBackend::new("primary").with_max_item_bytes(primary_limit);
    let secondary = InMemoryBackend::new("secondary");

    let port = config.server_port;
    let default_expiration_seconds = config.default_expiration_seconds;
    let context = CacheContext::builder(config)
        .primary(Arc::new(primary))
        .secondary(Arc::new(secondary))
        .build()
        .context("failed to initialize cache context")?;

    let app = create_router(AppState::new(Arc::new(context), default_expiration_seconds));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
