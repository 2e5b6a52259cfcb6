//! Health check HTTP route handlers.
//!
//! - `GET /health` - simple liveness check (always 200)
//! - `GET /health/live` - Kubernetes-style liveness probe
//! - `GET /health/ready` - readiness probe; verifies the database pool

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Clone)]
pub struct HealthState {
    pub pool: PgPool,
}

#[derive(Serialize)]
struct ReadinessResponse {
    database: bool,
}

pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(simple_health))
        .route("/live", get(liveness_probe))
        .route("/ready", get(readiness_probe))
        .with_state(state)
}

async fn simple_health() -> &'static str {
    "OK"
}

async fn liveness_probe() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Checks only the database, the one external dependency this crate's
/// request path actually needs to be up (§6.1: Spotify/Last.fm/YouTube
/// failures degrade the search response rather than the service itself).
async fn readiness_probe(State(state): State<HealthState>) -> impl IntoResponse {
    let database_healthy = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let status = if database_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ReadinessResponse { database: database_healthy }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health() {
        assert_eq!(simple_health().await, "OK");
    }

    #[tokio::test]
    async fn test_liveness_probe() {
        let response = liveness_probe().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
