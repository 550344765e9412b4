use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use customer360_api::api;
use customer360_api::config::Config;
use customer360_api::db::Database;
use customer360_api::db_storage::CustomerStore;
use customer360_api::deadline::Deadlines;
use customer360_api::handlers::AppState;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, opens the database pool, and serves the
/// read-only API until the process receives Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "customer360_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::new(&config).await?;
    tracing::info!("Database connection pool established");

    let app_state = Arc::new(AppState::new(
        CustomerStore::new(db.pool.clone()),
        Deadlines::default(),
    ));

    let app = api::router(app_state, config.request_timeout());

    // Bind before logging so a port clash is not reported as "listening"
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool.close().await;
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
