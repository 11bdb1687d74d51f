/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 4, "total_connections": 5 },
///   "ai": "enabled"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use teamtask_shared::db::pool::{get_pool_stats, health_check as database_health, PoolStats};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// `connected`, `disconnected` or `not_configured`
    pub database: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,

    /// Whether AI task generation is wired
    pub ai: String,
}

/// Health check handler
///
/// A server running without a database (in-memory stores) reports
/// `not_configured` and stays healthy.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (database, pool) = match &state.db {
        Some(db) => match database_health(db).await {
            Ok(()) => ("connected", Some(get_pool_stats(db))),
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                ("disconnected", Some(get_pool_stats(db)))
            }
        },
        None => ("not_configured", None),
    };

    Ok(Json(HealthResponse {
        status: if database == "disconnected" {
            "degraded".to_string()
        } else {
            "healthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        pool,
        ai: (if state.tasks.has_extractor() { "enabled" } else { "disabled" }).to_string(),
    }))
}
