//! Last.fm API response models

use serde::{Deserialize, Serialize};

/// A similar artist from Last.fm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarArtist {
    /// Artist name
    pub name: String,
    /// MusicBrainz ID (if available)
    pub mbid: Option<String>,
    /// Similarity score (0.0 - 1.0)
    pub match_score: f64,
    /// URL to Last.fm artist page
    pub url: Option<String>,
}

/// Artist tag (genre/descriptor)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistTag {
    /// Tag name (e.g., "rock", "electronic")
    pub name: String,
    /// Tag count/weight
    pub count: Option<i32>,
    /// URL to Last.fm tag page
    pub url: Option<String>,
}

// Internal response types for deserialization

#[derive(Debug, Deserialize)]
pub(crate) struct SimilarArtistsResponse {
    pub similarartists: SimilarArtistsWrapper,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SimilarArtistsWrapper {
    pub artist: Vec<RawSimilarArtist>,
    #[serde(rename = "@attr")]
    #[allow(dead_code)] // Required for serde deserialization, not used in code
    pub attr: Option<SimilarArtistsAttr>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)] // Required for serde deserialization
pub(crate) struct SimilarArtistsAttr {
    pub artist: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSimilarArtist {
    pub name: String,
    #[serde(default)]
    pub mbid: Option<String>,
    #[serde(rename = "match")]
    pub match_score: String,
    pub url: Option<String>,
}

impl From<RawSimilarArtist> for SimilarArtist {
    fn from(raw: RawSimilarArtist) -> Self {
        Self {
            name: raw.name,
            mbid: raw.mbid.filter(|s| !s.is_empty()),
            match_score: raw.match_score.parse().unwrap_or(0.0),
            url: raw.url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopTagsResponse {
    pub toptags: TopTagsWrapper,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopTagsWrapper {
    pub tag: Vec<RawArtistTag>,
    #[serde(rename = "@attr")]
    #[allow(dead_code)] // Required for serde deserialization, not used in code
    pub attr: Option<TopTagsAttr>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)] // Required for serde deserialization
pub(crate) struct TopTagsAttr {
    pub artist: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtistTag {
    pub name: String,
    pub count: Option<i32>,
    pub url: Option<String>,
}

impl From<RawArtistTag> for ArtistTag {
    fn from(raw: RawArtistTag) -> Self {
        Self {
            name: raw.name,
            count: raw.count,
            url: raw.url,
        }
    }
}

/// Full artist profile (`artist.getInfo`), used by the Search Orchestrator's
/// artist-profile endpoint and the Freshness Manager's enrichment refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistInfo {
    pub name: String,
    pub mbid: Option<String>,
    pub url: Option<String>,
    pub listeners: Option<u64>,
    pub playcount: Option<u64>,
    pub bio_summary: Option<String>,
    pub bio_full: Option<String>,
    pub tags: Vec<String>,
}

/// Last.fm API error response
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: i32,
    pub message: String,
}

/// An artist ranked under a tag (genre), used to seed genre-backfill and
/// external-fanout enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagTopArtist {
    /// Artist name
    pub name: String,
    /// MusicBrainz ID (if available)
    pub mbid: Option<String>,
    /// URL to Last.fm artist page
    pub url: Option<String>,
    /// Listener count, if reported
    pub listeners: Option<u64>,
}

/// Track-level stats used by the genre backfill loop to harvest tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    pub artist_name: String,
    /// Tags attached to this specific track (used to filter noise in
    /// genre backfill rather than treated as the artist's genres directly).
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopArtistsResponse {
    pub topartists: TopArtistsWrapper,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopArtistsWrapper {
    pub artist: Vec<RawTagTopArtist>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTagTopArtist {
    pub name: String,
    #[serde(default)]
    pub mbid: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub listeners: Option<String>,
}

impl From<RawTagTopArtist> for TagTopArtist {
    fn from(raw: RawTagTopArtist) -> Self {
        Self {
            name: raw.name,
            mbid: raw.mbid.filter(|s| !s.is_empty()),
            url: raw.url,
            listeners: raw.listeners.and_then(|s| s.parse().ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackInfoResponse {
    pub track: RawTrackInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrackInfo {
    pub name: String,
    pub artist: RawTrackArtist,
    #[serde(default)]
    pub toptags: Option<RawTrackTopTags>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrackArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrackTopTags {
    #[serde(default)]
    pub tag: Vec<RawArtistTag>,
}

impl From<RawTrackInfo> for TrackInfo {
    fn from(raw: RawTrackInfo) -> Self {
        Self {
            name: raw.name,
            artist_name: raw.artist.name,
            tags: raw
                .toptags
                .map(|t| t.tag.into_iter().map(|t| t.name).collect())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistInfoResponse {
    pub artist: RawArtistInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtistInfo {
    pub name: String,
    #[serde(default)]
    pub mbid: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub stats: Option<RawArtistStats>,
    #[serde(default)]
    pub bio: Option<RawArtistBio>,
    #[serde(default)]
    pub tags: Option<RawArtistInfoTags>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtistStats {
    #[serde(default)]
    pub listeners: Option<String>,
    #[serde(default)]
    pub playcount: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtistBio {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtistInfoTags {
    #[serde(default)]
    pub tag: Vec<RawArtistTag>,
}

impl From<RawArtistInfo> for ArtistInfo {
    fn from(raw: RawArtistInfo) -> Self {
        Self {
            name: raw.name,
            mbid: raw.mbid.filter(|s| !s.is_empty()),
            url: raw.url,
            listeners: raw.stats.as_ref().and_then(|s| s.listeners.as_ref()).and_then(|s| s.parse().ok()),
            playcount: raw.stats.as_ref().and_then(|s| s.playcount.as_ref()).and_then(|s| s.parse().ok()),
            bio_summary: raw.bio.as_ref().and_then(|b| b.summary.clone()),
            bio_full: raw.bio.as_ref().and_then(|b| b.content.clone()),
            tags: raw.tags.map(|t| t.tag.into_iter().map(|t| t.name).collect()).unwrap_or_default(),
        }
    }
}
