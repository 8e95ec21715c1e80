//! Health check endpoint
//!
//! ```text
//! GET /health
//! ```
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "database": "connected",
//!   "connections": { "active": 0, "idle": 1, "total": 1 },
//!   "migrations": { "applied": 3, "latest_version": 20250301000003, "up_to_date": true }
//! }
//! ```
//!
//! Not wrapped in an envelope: load balancers read it as-is.

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use bugbridge_shared::db::migrations::get_migration_status;
use bugbridge_shared::db::pool::{get_pool_stats, health_check as database_health_check};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    pub connections: ConnectionStats,

    /// Absent when the database does not answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationReport>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub active: usize,
    pub idle: usize,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MigrationReport {
    pub applied: usize,
    pub latest_version: Option<i64>,
    pub up_to_date: bool,
}

/// Reports service health
///
/// 503 when the database does not answer or its schema is behind the
/// migrations built into the binary.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connected = match database_health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let migrations = if connected {
        match get_migration_status(&state.db).await {
            Ok(status) => Some(MigrationReport {
                applied: status.applied_migrations,
                latest_version: status.latest_version,
                up_to_date: status.is_up_to_date,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Migration status check failed");
                None
            }
        }
    } else {
        None
    };

    let pool = get_pool_stats(&state.db);
    let healthy = migrations.as_ref().is_some_and(|m| m.up_to_date);

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if connected { "connected" } else { "disconnected" }.to_string(),
            connections: ConnectionStats {
                active: pool.active_connections,
                idle: pool.idle_connections,
                total: pool.total_connections,
            },
            migrations,
        }),
    )
}
