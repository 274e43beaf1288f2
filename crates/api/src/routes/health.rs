//! Health and readiness probes

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

/// Probe payload: process version plus whether the database answers
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// Overall health: 200 when the database is reachable, 503 otherwise
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if db_ok { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database: if db_ok { "reachable" } else { "unreachable" },
        }),
    )
}

/// Liveness probe: 200 as long as the process is serving
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: 200 once the database accepts queries
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if sqlx::query("SELECT 1").execute(&state.pool).await.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
