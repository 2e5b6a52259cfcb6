//! `/search/*` route handlers (§6.3), thin wrappers over
//! [`crate::services::Orchestrator`].

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::AppState;
use crate::error::{ApiError, ApiResult};

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

fn default_similar_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct OrchestratedSearchParams {
    q: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct ArtistProfileParams {
    q: String,
    #[serde(default = "default_similar_limit")]
    similar_limit: u32,
    min_followers: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TracksQuickParams {
    q: String,
    #[serde(default = "default_limit")]
    limit: u32,
}

pub fn search_router(state: AppState) -> Router {
    Router::new()
        .route("/orchestrated", get(orchestrated_search))
        .route("/artist-profile", get(artist_profile))
        .route("/tracks-quick", get(tracks_quick))
        .route("/metrics", get(metrics))
        .with_state(state)
}

fn require_query(q: &str) -> ApiResult<()> {
    if q.trim().is_empty() {
        return Err(ApiError::invalid_query_param("q", "must not be empty"));
    }
    Ok(())
}

async fn orchestrated_search(
    State(state): State<AppState>,
    Query(params): Query<OrchestratedSearchParams>,
) -> ApiResult<impl axum::response::IntoResponse> {
    require_query(&params.q)?;
    let response = state.orchestrator.orchestrated_search(&params.q, params.page, params.limit, None).await?;
    Ok(Json(response))
}

async fn artist_profile(
    State(state): State<AppState>,
    Query(params): Query<ArtistProfileParams>,
) -> ApiResult<impl axum::response::IntoResponse> {
    require_query(&params.q)?;
    let response =
        state.orchestrator.artist_profile(&params.q, params.similar_limit, params.min_followers, None).await?;
    Ok(Json(response))
}

async fn tracks_quick(
    State(state): State<AppState>,
    Query(params): Query<TracksQuickParams>,
) -> ApiResult<impl axum::response::IntoResponse> {
    require_query(&params.q)?;
    let response = state.orchestrator.tracks_quick(&params.q, params.limit, None).await?;
    Ok(Json(response))
}

async fn metrics(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    Json(state.metrics.snapshot().await)
}
