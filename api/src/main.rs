use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use api::{telemetry, AppState, OriginPolicy};
use shared::{get_pool, Config, PgMarketStore};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    telemetry::init_tracing(config.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = option_env!("GIT_HASH").unwrap_or("unknown"),
        build_time = option_env!("BUILD_TIME").unwrap_or("unknown"),
        "Starting candlebook API server..."
    );

    let pool = get_pool(&config.database_url).await?;
    info!("Connected to database");

    let store = PgMarketStore::new(pool);
    let origins = OriginPolicy::from_config(config.frontend_origins.clone());
    match &origins {
        OriginPolicy::AllowAny => info!("CORS: allowing every origin"),
        OriginPolicy::AllowList(list) => info!(origins = ?list, "CORS: allow-list active"),
    }

    let app = api::app(AppState::new(Arc::new(store.clone())), origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("API server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.pool().close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining in-flight requests");
}
