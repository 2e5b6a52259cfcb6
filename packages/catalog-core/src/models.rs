//! Core entity types (§3). Timestamps are naive UTC per spec; the store
//! adapter is responsible for not leaking timezone-aware values into rows.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Entity kind an [`Alias`] row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Album,
    Track,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
            EntityKind::Track => "track",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Artist {
    pub id: i64,
    pub provider_id: Option<String>,
    pub name: String,
    pub normalized_name: String,
    pub genres: Vec<String>,
    pub image_url: Option<String>,
    pub popularity: i32,
    pub followers: i64,
    pub bio_summary: Option<String>,
    pub bio_long: Option<String>,
    pub is_hidden: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_refreshed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Album {
    pub id: i64,
    pub provider_id: Option<String>,
    pub name: String,
    pub artist_id: i64,
    pub release_date: String,
    pub total_tracks: i32,
    pub label: Option<String>,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_refreshed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Track {
    pub id: i64,
    pub provider_id: Option<String>,
    pub name: String,
    pub artist_id: i64,
    pub album_id: Option<i64>,
    pub duration_ms: i64,
    pub popularity: i32,
    pub preview_url: Option<String>,
    pub external_url: Option<String>,
    pub download_path: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_refreshed_at: Option<NaiveDateTime>,
}

/// Status of a [`YouTubeLink`], ordered by the writer's precedence rule
/// (§5: `completed > link_found > video_not_found > missing > error > pending`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum YoutubeLinkStatus {
    // Declared low-to-high so the derived `Ord` matches precedence: higher
    // variants win when two concurrent writes race (§5).
    Pending,
    Error,
    Missing,
    VideoNotFound,
    LinkFound,
    Completed,
}

impl YoutubeLinkStatus {
    /// `status ∈ {error, video_not_found}` with empty `video_id` normalizes
    /// to `missing` (§4.4); readers additionally renormalize those toward
    /// `link_found` once a `video_id` is present (§3 invariant).
    pub fn normalize_on_write(self, has_video_id: bool) -> Self {
        match self {
            YoutubeLinkStatus::Error | YoutubeLinkStatus::VideoNotFound if !has_video_id => {
                YoutubeLinkStatus::Missing
            }
            other => other,
        }
    }

    /// Readers normalize `error`/`video_not_found`/`missing` with a non-empty
    /// `video_id` to `link_found` (§3 invariant; the open question in §9
    /// is resolved as read-time-only normalization, see DESIGN.md).
    pub fn normalize_on_read(self, has_video_id: bool) -> Self {
        match self {
            YoutubeLinkStatus::Error | YoutubeLinkStatus::VideoNotFound | YoutubeLinkStatus::Missing
                if has_video_id =>
            {
                YoutubeLinkStatus::LinkFound
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct YoutubeLink {
    pub id: i64,
    /// Provider id of the Track this link is one-to-one with.
    pub track_provider_id: String,
    pub video_id: Option<String>,
    pub download_path: Option<String>,
    pub status: YoutubeLinkStatus,
    pub file_size: Option<i64>,
    pub error_message: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl YoutubeLink {
    /// Effective status after read-time renormalization (§3 invariant).
    pub fn effective_status(&self) -> YoutubeLinkStatus {
        self.status.normalize_on_read(self.video_id.is_some())
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alias {
    pub id: i64,
    pub entity_kind: EntityKind,
    pub entity_id: i64,
    pub alias: String,
    pub normalized_alias: String,
    pub source: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChartEntryRaw {
    pub id: i64,
    pub source: String,
    pub chart: String,
    pub chart_date: chrono::NaiveDate,
    pub rank: i32,
    pub title: String,
    pub artist: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrackChartStats {
    pub track_id: i64,
    pub source: String,
    pub chart: String,
    pub best_position: i32,
    pub weeks_on_chart: i32,
    pub weeks_at_one: i32,
    pub weeks_top5: i32,
    pub weeks_top10: i32,
    pub first_chart_date: chrono::NaiveDate,
    pub last_chart_date: chrono::NaiveDate,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChartScanState {
    pub source: String,
    pub chart: String,
    pub last_scanned_date: Option<chrono::NaiveDate>,
    pub backfill_complete: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct SearchCacheEntry {
    pub cache_key: String,
    #[sqlx(json)]
    pub payload: serde_json::Value,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub context: Option<String>,
}

/// Max-age defaults backing the Freshness Manager (§4.5), expressed in hours.
pub mod freshness_defaults {
    pub const ARTIST_MAX_AGE_HOURS: i64 = 24;
    pub const ALBUM_MAX_AGE_HOURS: i64 = 168;
    pub const TRACK_MAX_AGE_HOURS: i64 = 168;
}
