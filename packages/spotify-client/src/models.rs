//! Spotify-shaped response models, normalized to the provider contract (§6.2).

use serde::{Deserialize, Serialize};

/// An image reference at some resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followers {
    #[serde(default)]
    pub total: u64,
}

/// Artist shape shared by all three provider clients (§6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub popularity: i32,
    #[serde(default)]
    pub followers: Followers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub release_date: String,
    pub total_tracks: i32,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(rename = "spotify")]
    pub primary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Option<Album>,
    pub duration_ms: i64,
    #[serde(default)]
    pub popularity: i32,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: Option<ExternalUrls>,
}

/// Album release-group kind used by `get_artist_albums`' `groups` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumGroup {
    Album,
    Single,
    Compilation,
    AppearsOn,
}

impl AlbumGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumGroup::Album => "album",
            AlbumGroup::Single => "single",
            AlbumGroup::Compilation => "compilation",
            AlbumGroup::AppearsOn => "appears_on",
        }
    }

    /// The default group set for discography ingestion (§4.2, §4.6).
    pub fn discography_default() -> [AlbumGroup; 3] {
        [AlbumGroup::Album, AlbumGroup::Single, AlbumGroup::Compilation]
    }
}

// ---- wire-format (raw) types, kept distinct from the normalized shapes
// above so provider quirks (paging envelopes, nullable fields) don't leak
// into the rest of the system.

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchArtistsResponse {
    pub artists: Paged<Artist>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchTracksResponse {
    pub tracks: Paged<Track>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paged<T> {
    #[serde(default)]
    pub items: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistAlbumsResponse {
    #[serde(default)]
    pub items: Vec<Album>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumTracksResponse {
    #[serde(default)]
    pub items: Vec<Track>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub status: u16,
    pub message: String,
    #[serde(default)]
    pub reason: Option<String>,
}
