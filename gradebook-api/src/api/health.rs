//! Liveness endpoint (no authentication)

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::error;

use crate::build_info::{BuildInfo, BUILD};
use crate::AppState;

pub const SERVICE_NAME: &str = "gradebook-api";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the record store does not answer
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub database: bool,
    pub build: BuildInfo,
}

/// GET /health
///
/// 503 when the database cannot run a trivial query.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => true,
        Err(e) => {
            error!("Health check: database unreachable: {}", e);
            false
        }
    };

    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            module: SERVICE_NAME,
            version: BUILD.version,
            database,
            build: BUILD,
        }),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
