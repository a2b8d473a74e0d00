use anyhow::Result;
use finwatch_api::app::{create_app, AppState, Backends};
use finwatch_api::config::{Config, DatabaseBackend};
use finwatch_api::middleware;
use persistence::memory::InMemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting Finwatch API v{}", env!("CARGO_PKG_VERSION"));

    let backends = match config.database.backend {
        DatabaseBackend::Postgres => {
            let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

            info!("Running database migrations...");
            sqlx::migrate!("../persistence/src/migrations")
                .run(&pool)
                .await?;
            info!("Migrations completed");

            Backends::postgres(pool, config.notifications.health_latency_warn())
        }
        DatabaseBackend::Memory => {
            warn!("Using in-memory storage; data is lost on exit");
            Backends::in_memory(Arc::new(InMemoryStore::new()))
        }
    };

    let addr = config.socket_addr()?;
    let scheduler_enabled = config.scheduler.enabled;
    let shutdown_timeout = Duration::from_secs(config.scheduler.shutdown_timeout_secs);

    let state = AppState::new(config, backends)?;
    let scheduler = state.scheduler.clone();
    if scheduler_enabled {
        scheduler.start();
    } else {
        info!("Notification scheduler disabled by configuration");
    }

    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    scheduler.wait_for_shutdown(shutdown_timeout).await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
