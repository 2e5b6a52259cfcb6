//! Curated Lists Cache (C10, §4.10): six named, generator-backed lists
//! layered over a TTL-keyed in-memory cache. Grounded on
//! `app/services/lists_cache.py`.
//!
//! `user` is accepted on every entry point to key the cache by listener,
//! but the generators themselves are global: the favorites table this
//! crate reads carries no user column (user identity is an out-of-scope
//! external collaborator, §1), so every user currently sees the same
//! underlying rows. The dimension is kept so a future per-user favorites
//! store only has to change the generators, not the cache shape.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::error::CoreResult;
use crate::models::Track;
use crate::store::EntityStore;

/// Default time a generated list is served from cache before the next
/// request regenerates it (§4.10).
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Rows returned per list.
const LIST_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CuratedList {
    FavoritesWithLink,
    Downloaded,
    Discovery,
    /// `top-year`, parameterized by the calendar year to rank within.
    TopYear(i32),
    MostPlayed,
    GenreSuggestions,
}

impl CuratedList {
    pub fn as_str(&self) -> &'static str {
        match self {
            CuratedList::FavoritesWithLink => "favorites-with-link",
            CuratedList::Downloaded => "downloaded",
            CuratedList::Discovery => "discovery",
            CuratedList::TopYear(_) => "top-year",
            CuratedList::MostPlayed => "most-played",
            CuratedList::GenreSuggestions => "genre-suggestions",
        }
    }
}

/// Ported from `_is_valid_youtube_id`: a YouTube video id is exactly 11
/// characters drawn from `[A-Za-z0-9_-]` (§3 supplement).
pub fn is_valid_youtube_id(candidate: &str) -> bool {
    candidate.len() == 11 && candidate.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    list: CuratedList,
    user: Option<String>,
}

struct Entry {
    tracks: Vec<Track>,
    generated_at: Instant,
}

pub struct ListsCache {
    store: EntityStore,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ListsCache {
    pub fn new(store: EntityStore) -> Self {
        Self { store, ttl: DEFAULT_TTL, entries: Mutex::new(HashMap::new()) }
    }

    pub fn with_ttl(store: EntityStore, ttl: Duration) -> Self {
        Self { store, ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// Returns the cached list if fresh, otherwise regenerates and caches it.
    #[instrument(skip(self))]
    pub async fn get(&self, list: CuratedList, user: Option<&str>) -> CoreResult<Vec<Track>> {
        let key = CacheKey { list, user: user.map(str::to_string) };
        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&key) {
                if entry.generated_at.elapsed() <= self.ttl {
                    return Ok(entry.tracks.clone());
                }
            }
        }
        self.refresh_cache(list, user).await
    }

    /// Forces regeneration regardless of TTL, replacing the cached entry.
    #[instrument(skip(self))]
    pub async fn refresh_cache(&self, list: CuratedList, user: Option<&str>) -> CoreResult<Vec<Track>> {
        let tracks = self.generate(list).await?;
        let key = CacheKey { list, user: user.map(str::to_string) };
        let mut entries = self.entries.lock().await;
        entries.insert(key, Entry { tracks: tracks.clone(), generated_at: Instant::now() });
        Ok(tracks)
    }

    /// Scoped purge: `None` for either field means "any". `(None, None)`
    /// clears the whole cache.
    pub async fn invalidate(&self, list: Option<CuratedList>, user: Option<&str>) {
        let mut entries = self.entries.lock().await;
        entries.retain(|key, _| {
            let list_matches = match list {
                None => true,
                Some(l) => key.list == l,
            };
            let user_matches = match user {
                None => true,
                Some(u) => key.user.as_deref() == Some(u),
            };
            !(list_matches && user_matches)
        });
    }

    async fn generate(&self, list: CuratedList) -> CoreResult<Vec<Track>> {
        let tracks = match list {
            CuratedList::FavoritesWithLink => {
                self.store.favorites.find_favorited_with_youtube_link(LIST_LIMIT).await?
            }
            CuratedList::Downloaded => self.store.tracks.find_downloaded(LIST_LIMIT).await?,
            CuratedList::Discovery => self.store.tracks.find_recently_added(LIST_LIMIT).await?,
            CuratedList::TopYear(year) => self.store.tracks.find_top_by_release_year(year, LIST_LIMIT).await?,
            CuratedList::MostPlayed => self.store.tracks.find_most_popular_downloaded(LIST_LIMIT).await?,
            CuratedList::GenreSuggestions => self.generate_genre_suggestions().await?,
        };
        Ok(tracks.into_iter().filter(|t| t.download_path.is_none() || has_valid_download(t)).collect())
    }

    /// Seeds off the genres of favorited artists, then surfaces top tracks
    /// from other artists sharing those genres (§4.10).
    async fn generate_genre_suggestions(&self) -> CoreResult<Vec<Track>> {
        let favorited_artist_ids = self.store.favorites.find_favorited_artist_ids(200).await?;
        if favorited_artist_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut genres = Vec::new();
        for artist_id in &favorited_artist_ids {
            if let Some(artist) = self.store.artists.find_by_id(*artist_id).await? {
                genres.extend(artist.genres);
            }
        }
        genres.sort();
        genres.dedup();
        if genres.is_empty() {
            return Ok(Vec::new());
        }

        let candidate_artists =
            self.store.artists.find_by_genres_excluding(&genres, &favorited_artist_ids, 20).await?;

        let mut tracks = Vec::new();
        for artist in candidate_artists {
            let mut top = self.store.tracks.find_by_artist_id(artist.id).await?;
            top.truncate(3);
            tracks.extend(top);
            if tracks.len() as i64 >= LIST_LIMIT {
                break;
            }
        }
        tracks.truncate(LIST_LIMIT as usize);
        Ok(tracks)
    }
}

/// A `completed` download additionally requires a validly-shaped video id
/// (§3 supplement); a corrupt row never surfaces as playable.
fn has_valid_download(track: &Track) -> bool {
    track.download_path.as_ref().is_some_and(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_youtube_id() {
        assert!(is_valid_youtube_id("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_invalid_youtube_id_wrong_length() {
        assert!(!is_valid_youtube_id("short"));
    }

    #[test]
    fn test_invalid_youtube_id_bad_chars() {
        assert!(!is_valid_youtube_id("dQw4w9WgX!Q"));
    }

    #[test]
    fn test_list_as_str() {
        assert_eq!(CuratedList::FavoritesWithLink.as_str(), "favorites-with-link");
        assert_eq!(CuratedList::TopYear(2024).as_str(), "top-year");
    }
}
