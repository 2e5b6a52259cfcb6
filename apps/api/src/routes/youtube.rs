//! `/youtube/*` route handlers (§6.3), wrapping the YouTube Link Resolver
//! (C7).

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::NaiveDateTime;
use resonance_catalog_core::models::{YoutubeLink, YoutubeLinkStatus};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::{ApiError, ApiResult};

pub fn youtube_router(state: AppState) -> Router {
    Router::new()
        .route("/track/:track_id/refresh", post(refresh_track))
        .route("/links", post(links_status))
        .route("/album/:album_id/prefetch", post(album_prefetch))
        .with_state(state)
}

fn youtube_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

#[derive(Debug, Deserialize)]
pub struct RefreshTrackBody {
    artist: String,
    track: String,
    album: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackRefreshResponse {
    pub spotify_track_id: String,
    pub status: YoutubeLinkStatus,
    pub youtube_video_id: Option<String>,
    pub youtube_url: Option<String>,
    pub error_message: Option<String>,
}

impl TrackRefreshResponse {
    fn from_link(spotify_track_id: String, link: YoutubeLink) -> Self {
        let youtube_url = link.video_id.as_deref().map(youtube_url);
        Self {
            spotify_track_id,
            status: link.effective_status(),
            youtube_video_id: link.video_id,
            youtube_url,
            error_message: link.error_message,
        }
    }
}

async fn refresh_track(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
    Json(body): Json<RefreshTrackBody>,
) -> ApiResult<Json<TrackRefreshResponse>> {
    if body.artist.trim().is_empty() {
        return Err(ApiError::MissingField("artist"));
    }
    if body.track.trim().is_empty() {
        return Err(ApiError::MissingField("track"));
    }
    let link = state.resolver.resolve_track(&track_id, &body.artist, &body.track, body.album.as_deref()).await?;
    Ok(Json(TrackRefreshResponse::from_link(track_id, link)))
}

#[derive(Debug, Deserialize)]
pub struct LinksStatusBody {
    spotify_track_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkStatusItem {
    pub spotify_track_id: String,
    pub status: YoutubeLinkStatus,
    pub youtube_video_id: Option<String>,
    pub youtube_url: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct LinksStatusResponse {
    pub items: Vec<LinkStatusItem>,
}

async fn links_status(
    State(state): State<AppState>,
    Json(body): Json<LinksStatusBody>,
) -> ApiResult<Json<LinksStatusResponse>> {
    let mut items = Vec::with_capacity(body.spotify_track_ids.len());
    for track_id in body.spotify_track_ids {
        let link = state.store.youtube_links.find_by_track_provider_id(&track_id).await.map_err(resonance_catalog_core::CoreError::from)?;
        items.push(match link {
            Some(link) => LinkStatusItem {
                spotify_track_id: track_id,
                status: link.effective_status(),
                youtube_video_id: link.video_id.clone(),
                youtube_url: link.video_id.as_deref().map(youtube_url),
                updated_at: Some(link.updated_at),
            },
            None => LinkStatusItem {
                spotify_track_id: track_id,
                status: YoutubeLinkStatus::Pending,
                youtube_video_id: None,
                youtube_url: None,
                updated_at: None,
            },
        });
    }
    Ok(Json(LinksStatusResponse { items }))
}

#[derive(Debug, Serialize)]
pub struct PrefetchResponse {
    pub status: &'static str,
}

/// Sweeps an album's tracks for missing YouTube links, deduplicating
/// concurrent requests for the same album by tracking in-flight sweeps in
/// `AppState::prefetching_albums` rather than re-resolving the same tracks
/// twice.
async fn album_prefetch(State(state): State<AppState>, Path(album_id): Path<i64>) -> ApiResult<Json<PrefetchResponse>> {
    {
        let mut in_flight = state.prefetching_albums.lock().await;
        if in_flight.contains(&album_id) {
            return Ok(Json(PrefetchResponse { status: "running" }));
        }
        in_flight.insert(album_id);
    }

    let tracks = match state.store.tracks.find_by_album_id(album_id).await {
        Ok(tracks) => tracks,
        Err(err) => {
            state.prefetching_albums.lock().await.remove(&album_id);
            return Err(resonance_catalog_core::CoreError::from(err).into());
        }
    };

    let mut pending = Vec::new();
    for track in &tracks {
        let Some(provider_id) = track.provider_id.clone() else { continue };
        let link = state.store.youtube_links.find_by_track_provider_id(&provider_id).await.ok().flatten();
        if resonance_catalog_core::YoutubeLinkResolver::needs_resolution(link.as_ref()) {
            pending.push((provider_id, track.name.clone()));
        }
    }

    if pending.is_empty() {
        state.prefetching_albums.lock().await.remove(&album_id);
        return Ok(Json(PrefetchResponse { status: "cached" }));
    }

    let resolver = state.resolver.clone();
    let artist_name = match tracks.first() {
        Some(track) => state.store.artists.find_by_id(track.artist_id).await.ok().flatten().map(|a| a.name),
        None => None,
    }
    .unwrap_or_default();
    let prefetching_albums = state.prefetching_albums.clone();

    tokio::spawn(async move {
        for (provider_id, track_name) in pending {
            if let Err(err) = resolver.resolve_track(&provider_id, &artist_name, &track_name, None).await {
                tracing::warn!(error = %err, track = %provider_id, "album prefetch track resolution failed");
            }
        }
        prefetching_albums.lock().await.remove(&album_id);
    });

    Ok(Json(PrefetchResponse { status: "scheduled" }))
}
