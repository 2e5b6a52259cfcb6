//! Candidate normalization for the Search Orchestrator's external fanout
//! (C9, §4.9 step 4, §9 design note "ad-hoc tagged records in the
//! orchestrator"). The original treats each external artist as a loose
//! `{spotify, lastfm}` pair; this module replaces that with a sum type so
//! a candidate's provenance is checked by the compiler rather than by
//! `is None` guards scattered through the fanout.

use resonance_lastfm_client::{SimilarArtist, TagTopArtist};
use resonance_spotify_client::Artist as SpotifyArtist;

/// The Last.fm side of a candidate, trimmed to what the orchestrator
/// actually surfaces (`url`, `listeners`) rather than the full provider
/// model.
#[derive(Debug, Clone)]
pub struct LastfmCandidate {
    pub name: String,
    pub url: Option<String>,
    pub listeners: Option<u64>,
}

impl From<TagTopArtist> for LastfmCandidate {
    fn from(artist: TagTopArtist) -> Self {
        Self { name: artist.name, url: artist.url, listeners: artist.listeners }
    }
}

impl From<SimilarArtist> for LastfmCandidate {
    fn from(artist: SimilarArtist) -> Self {
        Self { name: artist.name, url: artist.url, listeners: None }
    }
}

/// An external artist candidate discovered during fanout, carrying
/// whichever provider(s) actually answered for it.
#[derive(Debug, Clone)]
pub enum CandidateSource {
    SpotifyOnly(SpotifyArtist),
    LastfmOnly(LastfmCandidate),
    Both(SpotifyArtist, LastfmCandidate),
}

impl CandidateSource {
    pub fn name(&self) -> &str {
        match self {
            Self::SpotifyOnly(a) => &a.name,
            Self::LastfmOnly(l) => &l.name,
            Self::Both(a, _) => &a.name,
        }
    }

    pub fn provider_id(&self) -> Option<&str> {
        match self {
            Self::SpotifyOnly(a) | Self::Both(a, _) => Some(a.id.as_str()),
            Self::LastfmOnly(_) => None,
        }
    }

    pub fn followers(&self) -> i64 {
        match self {
            Self::SpotifyOnly(a) | Self::Both(a, _) => a.followers.total as i64,
            Self::LastfmOnly(l) => l.listeners.unwrap_or(0) as i64,
        }
    }

    pub fn genres(&self) -> &[String] {
        match self {
            Self::SpotifyOnly(a) | Self::Both(a, _) => &a.genres,
            Self::LastfmOnly(_) => &[],
        }
    }

    /// Flattens this candidate into the canonical view the response DTOs
    /// build from, regardless of which provider(s) it came from.
    pub fn into_merged(self) -> MergedArtist {
        match self {
            Self::SpotifyOnly(a) => MergedArtist {
                name: a.name.clone(),
                spotify: Some(SpotifySide::from(a)),
                lastfm: None,
            },
            Self::LastfmOnly(l) => MergedArtist { name: l.name.clone(), spotify: None, lastfm: Some(l.into()) },
            Self::Both(a, l) => MergedArtist {
                name: a.name.clone(),
                spotify: Some(SpotifySide::from(a)),
                lastfm: Some(l.into()),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotifySide {
    pub id: String,
    pub genres: Vec<String>,
    pub image_url: Option<String>,
    pub popularity: i32,
    pub followers: i64,
}

impl From<SpotifyArtist> for SpotifySide {
    fn from(a: SpotifyArtist) -> Self {
        Self {
            id: a.id,
            genres: a.genres,
            image_url: a.images.first().map(|i| i.url.clone()),
            popularity: a.popularity,
            followers: a.followers.total as i64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LastfmSide {
    pub url: Option<String>,
    pub listeners: Option<u64>,
}

impl From<LastfmCandidate> for LastfmSide {
    fn from(l: LastfmCandidate) -> Self {
        Self { url: l.url, listeners: l.listeners }
    }
}

/// Canonical artist view used by the response DTOs, independent of which
/// provider(s) a candidate was resolved through.
#[derive(Debug, Clone)]
pub struct MergedArtist {
    pub name: String,
    pub spotify: Option<SpotifySide>,
    pub lastfm: Option<LastfmSide>,
}

/// A small, deliberately incomplete keyword taxonomy resolving spec.md
/// §9's open question on genre filtering during Last.fm-driven fanout.
/// The original never enumerates a complete genre graph either; this
/// mirrors that by covering only the handful of broad genres the fanout
/// actually searches by by default, not every tag Last.fm returns.
const GENRE_KEYWORDS: &[(&str, &[&str])] = &[
    ("hip hop", &["rap", "trap", "boom bap", "gangsta"]),
    ("rock", &["alternative", "indie", "post-punk"]),
    ("electronic", &["techno", "house", "edm"]),
    ("metal", &["thrash", "doom", "sludge"]),
];

/// Whether `genres` plausibly belongs to the `hint` genre family, used to
/// drop off-genre candidates surfaced by a tag search (§4.9 step 3). A
/// hint with no entry in [`GENRE_KEYWORDS`] always passes — the taxonomy
/// only tightens the genres it actually knows about.
pub fn genre_matches(hint: &str, genres: &[String]) -> bool {
    let hint = hint.to_lowercase();
    let Some((_, keywords)) = GENRE_KEYWORDS.iter().find(|(genre, _)| *genre == hint) else {
        return true;
    };
    genres.iter().any(|g| {
        let g = g.to_lowercase();
        g == hint || keywords.iter().any(|k| g.contains(k))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spotify_artist(id: &str, followers: u64, genres: &[&str]) -> SpotifyArtist {
        SpotifyArtist {
            id: id.to_string(),
            name: "Example".to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            images: Vec::new(),
            popularity: 50,
            followers: resonance_spotify_client::Followers { total: followers },
        }
    }

    #[test]
    fn test_genre_matches_known_taxonomy() {
        assert!(genre_matches("hip hop", &["trap".to_string()]));
        assert!(!genre_matches("hip hop", &["classical".to_string()]));
    }

    #[test]
    fn test_genre_matches_unknown_hint_passes() {
        assert!(genre_matches("jazz", &["bebop".to_string()]));
    }

    #[test]
    fn test_candidate_source_spotify_only_merges() {
        let candidate = CandidateSource::SpotifyOnly(spotify_artist("sp1", 10_000, &["rock"]));
        assert_eq!(candidate.provider_id(), Some("sp1"));
        assert_eq!(candidate.followers(), 10_000);
        let merged = candidate.into_merged();
        assert!(merged.spotify.is_some());
        assert!(merged.lastfm.is_none());
    }

    #[test]
    fn test_candidate_source_lastfm_only_has_no_provider_id() {
        let candidate =
            CandidateSource::LastfmOnly(LastfmCandidate { name: "Band".into(), url: None, listeners: Some(500) });
        assert_eq!(candidate.provider_id(), None);
        assert_eq!(candidate.followers(), 500);
    }
}
