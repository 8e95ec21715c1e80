//! # BugBridge API Server
//!
//! REST backend for BugBridge: testers file bugs, hand them to developers,
//! and everyone tracks them through to resolution.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (`.env` honored)
//! 2. Open the SQLite pool and apply migrations
//! 3. Create the bootstrap admin if one is configured
//! 4. Serve until Ctrl-C, then drain and close the pool
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p bugbridge-api
//! ```

use anyhow::Context;
use bugbridge_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use bugbridge_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    services::UserService,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(config.log_format);

    tracing::info!(
        "BugBridge API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    ensure_database_exists(&config.database.url)
        .await
        .context("Failed to create database")?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to open database pool")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    if let Some(admin) = &config.admin {
        UserService::new(&pool)
            .ensure_admin(&admin.name, &admin.email, &admin.password)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bugbridge_api=debug,bugbridge_shared=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolves once `signal` fires; never resolves if the listener fails
async fn wait_for_shutdown<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_waits_for_signal() {
        let fired = async { Ok::<(), std::io::Error>(()) };
        tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(fired))
            .await
            .expect("signal should trigger shutdown");
    }

    #[tokio::test]
    async fn test_broken_signal_listener_keeps_serving() {
        let failed = async { Err::<(), _>(std::io::Error::other("no signal handler")) };
        let outcome = tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(failed)).await;
        assert!(outcome.is_err(), "shutdown must not fire when the listener fails");
    }
}
