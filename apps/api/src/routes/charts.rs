//! `/tracks/chart-stats` route handler (§6.3), surfacing the chart
//! statistics the Chart Scraper and Chart Matcher accumulate (C12).

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use resonance_catalog_core::models::TrackChartStats;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiResult;

pub fn charts_router(state: AppState) -> Router {
    Router::new().route("/chart-stats", get(chart_stats)).with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ChartStatsParams {
    spotify_ids: Option<String>,
    track_ids: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChartStatsItem {
    pub track_id: i64,
    pub spotify_track_id: Option<String>,
    pub stats: Vec<TrackChartStats>,
}

#[derive(Debug, Serialize)]
pub struct ChartStatsResponse {
    pub items: Vec<ChartStatsItem>,
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

async fn chart_stats(
    State(state): State<AppState>,
    Query(params): Query<ChartStatsParams>,
) -> ApiResult<Json<ChartStatsResponse>> {
    let mut items = Vec::new();

    if let Some(raw) = &params.spotify_ids {
        for spotify_id in split_ids(raw) {
            let track = state
                .store
                .tracks
                .find_by_provider_id(&spotify_id)
                .await
                .map_err(resonance_catalog_core::CoreError::from)?;
            let Some(track) = track else { continue };
            let stats =
                state.store.charts.find_stats_for_track(track.id).await.map_err(resonance_catalog_core::CoreError::from)?;
            items.push(ChartStatsItem { track_id: track.id, spotify_track_id: Some(spotify_id), stats });
        }
    }

    if let Some(raw) = &params.track_ids {
        for track_id in split_ids(raw) {
            let Ok(track_id) = track_id.parse::<i64>() else { continue };
            let stats =
                state.store.charts.find_stats_for_track(track_id).await.map_err(resonance_catalog_core::CoreError::from)?;
            items.push(ChartStatsItem { track_id, spotify_track_id: None, stats });
        }
    }

    Ok(Json(ChartStatsResponse { items }))
}
