use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use songbook_api::config::{self, AppConfig};
use songbook_api::database::{DatabaseManager, MemoryStore};
use songbook_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config: AppConfig = config::config().clone();
    tracing::info!("Starting Songbook API in {:?} mode", config.environment);

    let database = match config.database.url {
        Some(_) => {
            let manager = DatabaseManager::connect(&config.database).await?;
            manager.ensure_schema().await?;
            Some(manager)
        }
        None if config.is_production() => {
            anyhow::bail!("DATABASE_URL must be set in production");
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage; data is lost on exit");
            None
        }
    };

    let state = match &database {
        Some(manager) => AppState::new(config.clone(), Arc::new(manager.store())),
        None => AppState::new(config.clone(), Arc::new(MemoryStore::new())),
    };
    let state = match state {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Refusing to start: {}", e);
            std::process::exit(1);
        }
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Songbook API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(manager) = database {
        manager.close().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
