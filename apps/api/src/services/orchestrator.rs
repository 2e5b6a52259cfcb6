//! Search Orchestrator (C9, §4.9): local-first search resolution with
//! fallback to a bounded, parallel external fanout across the Spotify- and
//! Last.fm-shaped provider clients. Grounded on
//! `app/services/search_orchestrator.py`'s `orchestrated_search`,
//! `artist_profile` and `tracks_quick` entry points; the ad-hoc
//! `{spotify, lastfm}` pair it builds up is replaced here by
//! [`crate::services::candidate::CandidateSource`] (§9 redesign note).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use resonance_catalog_core::lru::TtlCache;
use resonance_catalog_core::models::{Artist as LocalArtist, Track as LocalTrack};
use resonance_catalog_core::{text, CoreResult, EntityStore, SearchMetrics};
use resonance_lastfm_client::LastfmClient;
use resonance_spotify_client::{Artist as SpotifyArtist, SpotifyClient, Track as SpotifyTrack};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{instrument, warn};

use super::candidate::{genre_matches, CandidateSource, LastfmCandidate, MergedArtist};
use super::persist_queue::{PersistJob, PersistQueue};

const LOCAL_CACHE_TTL: Duration = Duration::from_secs(60);
const LOCAL_CACHE_CAPACITY: usize = 500;
const PERSISTED_CACHE_TTL: chrono::Duration = chrono::Duration::hours(1);
const ENRICHMENT_CONCURRENCY: usize = 15;
const DEFAULT_MIN_FOLLOWERS: i64 = 300_000;
const SIMILAR_MIN_FOLLOWERS: i64 = 1_000_000;
const DEFAULT_EXPANSION_FANOUT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OrchestratedSearchKey {
    query: String,
    page: u32,
    limit: u32,
}

impl OrchestratedSearchKey {
    fn cache_key(&self) -> String {
        format!("orchestrated:{}:{}:{}", self.query, self.page, self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistCard {
    pub name: String,
    pub spotify_id: Option<String>,
    pub genres: Vec<String>,
    pub image_url: Option<String>,
    pub popularity: i32,
    pub followers: i64,
    pub lastfm_url: Option<String>,
}

impl ArtistCard {
    fn from_local(artist: &LocalArtist) -> Self {
        Self {
            name: artist.name.clone(),
            spotify_id: artist.provider_id.clone(),
            genres: artist.genres.clone(),
            image_url: artist.image_url.clone(),
            popularity: artist.popularity,
            followers: artist.followers,
            lastfm_url: None,
        }
    }

    fn from_spotify(artist: &SpotifyArtist) -> Self {
        Self {
            name: artist.name.clone(),
            spotify_id: Some(artist.id.clone()),
            genres: artist.genres.clone(),
            image_url: artist.images.first().map(|i| i.url.clone()),
            popularity: artist.popularity,
            followers: artist.followers.total as i64,
            lastfm_url: None,
        }
    }

    fn from_merged(merged: &MergedArtist) -> Self {
        Self {
            name: merged.name.clone(),
            spotify_id: merged.spotify.as_ref().map(|s| s.id.clone()),
            genres: merged.spotify.as_ref().map(|s| s.genres.clone()).unwrap_or_default(),
            image_url: merged.spotify.as_ref().and_then(|s| s.image_url.clone()),
            popularity: merged.spotify.as_ref().map(|s| s.popularity).unwrap_or(0),
            followers: merged.spotify.as_ref().map(|s| s.followers).unwrap_or(0),
            lastfm_url: merged.lastfm.as_ref().and_then(|l| l.url.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumCard {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCard {
    pub id: Option<String>,
    pub name: String,
    pub duration_ms: i64,
    pub popularity: i32,
    pub preview_url: Option<String>,
    /// Not modeled by any provider client or local row; always `false`
    /// until an upstream explicit-content flag exists to surface (§9
    /// decision recorded in DESIGN.md).
    pub explicit: bool,
    pub artists: Vec<String>,
    pub album: Option<AlbumCard>,
}

impl TrackCard {
    fn from_local(track: &LocalTrack, artist_name: String) -> Self {
        Self {
            id: track.provider_id.clone(),
            name: track.name.clone(),
            duration_ms: track.duration_ms,
            popularity: track.popularity,
            preview_url: track.preview_url.clone(),
            explicit: false,
            artists: vec![artist_name],
            album: None,
        }
    }

    fn from_spotify(track: &SpotifyTrack) -> Self {
        Self {
            id: Some(track.id.clone()),
            name: track.name.clone(),
            duration_ms: track.duration_ms,
            popularity: track.popularity,
            preview_url: track.preview_url.clone(),
            explicit: false,
            artists: track.artists.iter().map(|a| a.name.clone()).collect(),
            album: track.album.as_ref().map(|a| AlbumCard {
                name: Some(a.name.clone()),
                image_url: a.images.first().map(|i| i.url.clone()),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastfmSideCard {
    pub name: String,
    pub url: Option<String>,
    pub listeners: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratedSearchResponse {
    pub query: String,
    pub page: u32,
    pub limit: u32,
    pub has_more_artists: bool,
    pub has_more_lastfm: bool,
    pub main: Option<ArtistCard>,
    pub artists: Vec<ArtistCard>,
    pub related: Vec<ArtistCard>,
    pub tracks: Vec<TrackCard>,
    pub lastfm_top: Vec<LastfmSideCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistProfileResponse {
    pub query: String,
    pub mode: String,
    pub main: Option<ArtistCard>,
    pub similar: Vec<ArtistCard>,
    pub tracks: Vec<TrackCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracksQuickResponse {
    pub query: String,
    pub tracks: Vec<TrackCard>,
}

/// Entry point for `/search/*` (§6.3). Holds the in-process TTL cache and
/// the knobs (follower floors, expansion fanout) the original hard-codes
/// as module-level constants.
#[derive(Clone)]
pub struct Orchestrator {
    store: EntityStore,
    spotify: SpotifyClient,
    lastfm: Option<LastfmClient>,
    persist_queue: PersistQueue,
    metrics: Arc<SearchMetrics>,
    cache: Arc<TtlCache<OrchestratedSearchKey, OrchestratedSearchResponse>>,
    min_followers_default: i64,
    min_followers_similar: i64,
    expansion_fanout: usize,
}

impl Orchestrator {
    pub fn new(
        store: EntityStore,
        spotify: SpotifyClient,
        lastfm: Option<LastfmClient>,
        persist_queue: PersistQueue,
        metrics: Arc<SearchMetrics>,
    ) -> Self {
        Self {
            store,
            spotify,
            lastfm,
            persist_queue,
            metrics,
            cache: Arc::new(TtlCache::new(LOCAL_CACHE_TTL, LOCAL_CACHE_CAPACITY)),
            min_followers_default: DEFAULT_MIN_FOLLOWERS,
            min_followers_similar: SIMILAR_MIN_FOLLOWERS,
            expansion_fanout: DEFAULT_EXPANSION_FANOUT,
        }
    }

    /// `GET /search/orchestrated` (§4.9 steps 1-7).
    #[instrument(skip(self))]
    pub async fn orchestrated_search(
        &self,
        q: &str,
        page: u32,
        limit: u32,
        user_id: Option<&str>,
    ) -> CoreResult<OrchestratedSearchResponse> {
        let key = OrchestratedSearchKey { query: text::normalize(q), page, limit };

        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }
        if let Some(hit) = self.load_persisted_cache(&key).await {
            self.cache.put(key, hit.clone()).await;
            return Ok(hit);
        }

        if let Some(local) = self.resolve_locally(q, page, limit).await? {
            self.metrics.record_local_resolution(user_id).await;
            self.cache.put(key.clone(), local.clone()).await;
            self.persist_cache_entry(&key, &local).await;
            return Ok(local);
        }

        let external = self.resolve_externally(q, page, limit).await;
        self.metrics.record_external_resolution(user_id).await;
        self.cache.put(key.clone(), external.clone()).await;
        self.persist_cache_entry(&key, &external).await;
        Ok(external)
    }

    /// `GET /search/artist-profile` (§4.9, same local-first shape, single
    /// artist target).
    #[instrument(skip(self))]
    pub async fn artist_profile(
        &self,
        q: &str,
        similar_limit: u32,
        min_followers: Option<i64>,
        user_id: Option<&str>,
    ) -> CoreResult<ArtistProfileResponse> {
        let normalized = text::normalize(q);
        let mut candidates = self.store.artists.search_by_name(q, 5).await?;
        if candidates.is_empty() {
            candidates = self.store.artists.search_by_alias(&normalized, 5).await?;
        }

        if let Some(local) = candidates.into_iter().find(|a| text::is_confident_match(q, &a.name)) {
            let similar =
                self.store.artists.find_by_genres_excluding(&local.genres, &[local.id], similar_limit as i64).await?;
            let tracks = self.store.tracks.find_by_artist_id(local.id).await?;
            self.metrics.record_local_resolution(user_id).await;
            return Ok(ArtistProfileResponse {
                query: q.to_string(),
                mode: "artist".to_string(),
                main: Some(ArtistCard::from_local(&local)),
                similar: similar.iter().map(ArtistCard::from_local).collect(),
                tracks: tracks
                    .iter()
                    .take(similar_limit.max(1) as usize)
                    .map(|t| TrackCard::from_local(t, local.name.clone()))
                    .collect(),
            });
        }

        let floor = min_followers.unwrap_or(self.min_followers_default);
        let hits = self.fetch_spotify_artists(q, 1).await;
        let Some(main_artist) = hits.into_iter().next() else {
            self.metrics.record_external_resolution(user_id).await;
            return Ok(ArtistProfileResponse {
                query: q.to_string(),
                mode: "artist".to_string(),
                main: None,
                similar: Vec::new(),
                tracks: Vec::new(),
            });
        };

        let similar_raw = self.fetch_lastfm_similar(&main_artist.name).await;
        let similar_pairs = similar_raw.into_iter().map(|a| (a.name.clone(), LastfmCandidate::from(a))).collect();
        let similar_enriched = self.enrich_with_spotify(similar_pairs, floor, None).await;

        self.persist_queue.enqueue(PersistJob::SaveArtist(main_artist.clone()));
        self.persist_queue.enqueue(PersistJob::ExpandArtist(main_artist.id.clone()));
        self.metrics.record_external_resolution(user_id).await;

        Ok(ArtistProfileResponse {
            query: q.to_string(),
            mode: "artist".to_string(),
            main: Some(ArtistCard::from_spotify(&main_artist)),
            similar: similar_enriched.into_iter().map(|c| ArtistCard::from_merged(&c.into_merged())).collect(),
            tracks: Vec::new(),
        })
    }

    /// `GET /search/tracks-quick` (§4.9: "returns after step 2 on a local
    /// hit"). On a miss this falls through to a bare Spotify track search
    /// with no enrichment or persistence, since the spec leaves the
    /// no-local-hit case otherwise undefined (§9 decision, DESIGN.md).
    #[instrument(skip(self))]
    pub async fn tracks_quick(&self, q: &str, limit: u32, user_id: Option<&str>) -> CoreResult<TracksQuickResponse> {
        let normalized = text::normalize(q);
        let mut candidates = self.store.tracks.search_by_name(q, limit as i64).await?;
        if candidates.is_empty() {
            candidates = self.store.tracks.search_by_alias(&normalized, limit as i64).await?;
        }
        let confident: Vec<_> = candidates.into_iter().filter(|t| text::all_query_tokens_present(q, &t.name)).collect();

        if !confident.is_empty() {
            self.metrics.record_local_resolution(user_id).await;
            let mut tracks = Vec::with_capacity(confident.len());
            for track in &confident {
                let artist_name = self.store.artists.find_by_id(track.artist_id).await?.map(|a| a.name).unwrap_or_default();
                tracks.push(TrackCard::from_local(track, artist_name));
            }
            return Ok(TracksQuickResponse { query: q.to_string(), tracks });
        }

        let tracks = self.fetch_spotify_tracks(q, limit).await;
        self.metrics.record_external_resolution(user_id).await;
        Ok(TracksQuickResponse { query: q.to_string(), tracks: tracks.iter().map(TrackCard::from_spotify).collect() })
    }

    /// Local-first resolution (§4.9 step 2). Returns `None` when neither
    /// an artist nor a track candidate is confident, signalling that the
    /// caller should fall through to external fanout.
    async fn resolve_locally(&self, q: &str, page: u32, limit: u32) -> CoreResult<Option<OrchestratedSearchResponse>> {
        let normalized = text::normalize(q);

        let mut artist_candidates = self.store.artists.search_by_name(q, 10).await?;
        if artist_candidates.is_empty() {
            artist_candidates = self.store.artists.search_by_alias(&normalized, 10).await?;
        }
        let confident_artist = artist_candidates.into_iter().find(|a| text::is_confident_match(q, &a.name));

        let mut track_candidates = self.store.tracks.search_by_name(q, limit as i64).await?;
        if track_candidates.is_empty() {
            track_candidates = self.store.tracks.search_by_alias(&normalized, limit as i64).await?;
        }
        let confident_tracks: Vec<_> =
            track_candidates.into_iter().filter(|t| text::all_query_tokens_present(q, &t.name)).collect();

        if confident_artist.is_none() && confident_tracks.is_empty() {
            return Ok(None);
        }

        let mut related = Vec::new();
        let main = if let Some(artist) = &confident_artist {
            let siblings = self.store.artists.find_by_genres_excluding(&artist.genres, &[artist.id], 10).await?;
            related = siblings.iter().map(ArtistCard::from_local).collect();
            Some(ArtistCard::from_local(artist))
        } else {
            None
        };

        let mut tracks = Vec::with_capacity(confident_tracks.len());
        for track in &confident_tracks {
            let artist_name = self.store.artists.find_by_id(track.artist_id).await?.map(|a| a.name).unwrap_or_default();
            tracks.push(TrackCard::from_local(track, artist_name));
        }

        Ok(Some(OrchestratedSearchResponse {
            query: q.to_string(),
            page,
            limit,
            has_more_artists: false,
            has_more_lastfm: false,
            main: main.clone(),
            artists: main.into_iter().collect(),
            related,
            tracks,
            lastfm_top: Vec::new(),
        }))
    }

    /// External fanout (§4.9 step 3-5). Spotify track search and the
    /// Last.fm top-tag lookup run concurrently; the similar-artist branch
    /// depends on the top-tag branch's first enriched result and so runs
    /// after it, per the spec's own ordering ("for the first enriched
    /// artist, retrieve similar artists").
    async fn resolve_externally(&self, q: &str, page: u32, limit: u32) -> OrchestratedSearchResponse {
        let (spotify_tracks, lastfm_raw) = tokio::join!(self.fetch_spotify_tracks(q, limit), self.fetch_lastfm_top_tag(q));

        let top_pairs: Vec<_> = lastfm_raw.into_iter().map(|a| (a.name.clone(), LastfmCandidate::from(a))).collect();
        let enriched_top = self.enrich_with_spotify(top_pairs, self.min_followers_default, Some(q)).await;

        let mut similar_enriched = Vec::new();
        if let Some(first) = enriched_top.first() {
            let seed_name = first.name().to_string();
            let similar_raw = self.fetch_lastfm_similar(&seed_name).await;
            let similar_pairs: Vec<_> = similar_raw.into_iter().map(|a| (a.name.clone(), LastfmCandidate::from(a))).collect();
            similar_enriched = self.enrich_with_spotify(similar_pairs, self.min_followers_similar, None).await;
        }

        let mut all_candidates = enriched_top;
        all_candidates.extend(similar_enriched);
        dedup_candidates(&mut all_candidates);

        self.schedule_opportunistic_persistence(&all_candidates).await;

        let lastfm_top = all_candidates
            .iter()
            .filter_map(|c| match c {
                CandidateSource::LastfmOnly(l) => Some(LastfmSideCard { name: l.name.clone(), url: l.url.clone(), listeners: l.listeners }),
                CandidateSource::Both(a, l) => {
                    Some(LastfmSideCard { name: a.name.clone(), url: l.url.clone(), listeners: l.listeners })
                }
                CandidateSource::SpotifyOnly(_) => None,
            })
            .collect();

        // §8: "for every orchestrated response, len(artists) ≤ limit" —
        // persistence and the lastfm_top side-card both see every candidate,
        // but the artists page itself is capped.
        let has_more_artists = all_candidates.len() as u32 > limit;
        all_candidates.truncate(limit as usize);
        let artists: Vec<ArtistCard> =
            all_candidates.iter().cloned().map(|c| ArtistCard::from_merged(&c.into_merged())).collect();
        let main = artists.first().cloned();

        OrchestratedSearchResponse {
            query: q.to_string(),
            page,
            limit,
            has_more_artists,
            has_more_lastfm: false,
            main,
            artists,
            related: Vec::new(),
            tracks: spotify_tracks.iter().map(TrackCard::from_spotify).collect(),
            lastfm_top,
        }
    }

    /// Queues a catalog write for every external artist seen, and an
    /// expansion for up to `expansion_fanout` of those with no local row
    /// yet (§4.9 step 5). Never awaited by the request path.
    async fn schedule_opportunistic_persistence(&self, candidates: &[CandidateSource]) {
        let mut scheduled_expansions = 0usize;
        for candidate in candidates {
            let spotify_artist = match candidate {
                CandidateSource::SpotifyOnly(a) | CandidateSource::Both(a, _) => Some(a),
                CandidateSource::LastfmOnly(_) => None,
            };
            let Some(artist) = spotify_artist else { continue };

            self.persist_queue.enqueue(PersistJob::SaveArtist(artist.clone()));

            if scheduled_expansions >= self.expansion_fanout {
                continue;
            }
            let already_local = self.store.artists.find_by_provider_id(&artist.id).await.ok().flatten().is_some();
            if !already_local {
                self.persist_queue.enqueue(PersistJob::ExpandArtist(artist.id.clone()));
                scheduled_expansions += 1;
            }
        }
    }

    async fn fetch_spotify_artists(&self, q: &str, limit: u32) -> Vec<SpotifyArtist> {
        match timeout(Duration::from_secs(4), self.spotify.search_artists(q, limit)).await {
            Ok(Ok(artists)) => {
                self.metrics.record_provider_request("spotify").await;
                artists
            }
            Ok(Err(err)) => {
                warn!(error = %err, "spotify artist search failed");
                Vec::new()
            }
            Err(_) => {
                warn!("spotify artist search timed out");
                Vec::new()
            }
        }
    }

    async fn fetch_spotify_tracks(&self, q: &str, limit: u32) -> Vec<SpotifyTrack> {
        match timeout(Duration::from_secs(4), self.spotify.search_tracks(q, limit)).await {
            Ok(Ok(tracks)) => {
                self.metrics.record_provider_request("spotify").await;
                tracks
            }
            Ok(Err(err)) => {
                warn!(error = %err, "spotify track search failed");
                Vec::new()
            }
            Err(_) => {
                warn!("spotify track search timed out");
                Vec::new()
            }
        }
    }

    async fn fetch_lastfm_top_tag(&self, tag: &str) -> Vec<resonance_lastfm_client::TagTopArtist> {
        let Some(lastfm) = &self.lastfm else { return Vec::new() };
        match timeout(Duration::from_secs(6), lastfm.get_top_artists_by_tag(tag, Some(20), None)).await {
            Ok(Ok(artists)) => {
                self.metrics.record_provider_request("lastfm").await;
                artists
            }
            Ok(Err(err)) => {
                warn!(error = %err, tag, "lastfm top-tag lookup failed");
                Vec::new()
            }
            Err(_) => {
                warn!(tag, "lastfm top-tag lookup timed out");
                Vec::new()
            }
        }
    }

    async fn fetch_lastfm_similar(&self, seed_artist: &str) -> Vec<resonance_lastfm_client::SimilarArtist> {
        let Some(lastfm) = &self.lastfm else { return Vec::new() };
        match timeout(Duration::from_secs(5), lastfm.get_similar_artists(seed_artist, Some(20))).await {
            Ok(Ok(artists)) => {
                self.metrics.record_provider_request("lastfm").await;
                artists
            }
            Ok(Err(err)) => {
                warn!(error = %err, seed_artist, "lastfm similar-artist lookup failed");
                Vec::new()
            }
            Err(_) => {
                warn!(seed_artist, "lastfm similar-artist lookup timed out");
                Vec::new()
            }
        }
    }

    /// Enriches each Last.fm candidate with a one-result Spotify artist
    /// search, bounded to [`ENRICHMENT_CONCURRENCY`] concurrent lookups
    /// (§4.9 step 3 semaphore). Candidates below `min_followers` or
    /// off-genre per `genre_hint` are dropped; candidates Spotify has no
    /// match for at all pass through as Last.fm-only.
    async fn enrich_with_spotify(
        &self,
        lastfm_candidates: Vec<(String, LastfmCandidate)>,
        min_followers: i64,
        genre_hint: Option<&str>,
    ) -> Vec<CandidateSource> {
        let semaphore = Arc::new(Semaphore::new(ENRICHMENT_CONCURRENCY));
        let genre_hint = genre_hint.map(|s| s.to_string());

        let futures = lastfm_candidates.into_iter().map(|(name, lfm)| {
            let semaphore = semaphore.clone();
            let spotify = self.spotify.clone();
            let metrics = self.metrics.clone();
            let genre_hint = genre_hint.clone();
            async move {
                let Ok(_permit) = semaphore.acquire_owned().await else { return None };
                let hit = match timeout(Duration::from_secs(4), spotify.search_artists(&name, 1)).await {
                    Ok(Ok(mut hits)) => {
                        metrics.record_provider_request("spotify").await;
                        hits.pop()
                    }
                    Ok(Err(err)) => {
                        warn!(error = %err, artist = %name, "spotify enrichment lookup failed");
                        None
                    }
                    Err(_) => {
                        warn!(artist = %name, "spotify enrichment lookup timed out");
                        None
                    }
                };

                match hit {
                    Some(artist) if artist.followers.total as i64 >= min_followers => {
                        if let Some(hint) = &genre_hint {
                            if !genre_matches(hint, &artist.genres) {
                                return None;
                            }
                        }
                        Some(CandidateSource::Both(artist, lfm))
                    }
                    Some(_) => None,
                    None => Some(CandidateSource::LastfmOnly(lfm)),
                }
            }
        });

        join_all(futures).await.into_iter().flatten().collect()
    }

    async fn load_persisted_cache(&self, key: &OrchestratedSearchKey) -> Option<OrchestratedSearchResponse> {
        let entry = self.store.search_cache.get(&key.cache_key()).await.ok()??;
        if Utc::now().naive_utc() - entry.updated_at > PERSISTED_CACHE_TTL {
            return None;
        }
        serde_json::from_value(entry.payload).ok()
    }

    async fn persist_cache_entry(&self, key: &OrchestratedSearchKey, response: &OrchestratedSearchResponse) {
        let Ok(payload) = serde_json::to_value(response) else { return };
        if let Err(err) = self.store.search_cache.put(&key.cache_key(), &payload, Some("orchestrated_search")).await {
            warn!(error = %err, "failed to persist search cache entry");
        }
    }
}

/// Deduplicates by provider id first, then by normalized name, matching
/// the order candidates were merged in (top-tag results before similar
/// ones) so the earlier, better-ranked occurrence always wins.
fn dedup_candidates(candidates: &mut Vec<CandidateSource>) {
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    candidates.retain(|c| {
        if let Some(id) = c.provider_id() {
            if !seen_ids.insert(id.to_string()) {
                return false;
            }
        }
        seen_names.insert(text::normalize(c.name()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spotify_artist(id: &str, followers: u64) -> SpotifyArtist {
        SpotifyArtist {
            id: id.to_string(),
            name: "Example".to_string(),
            genres: vec!["rock".to_string()],
            images: Vec::new(),
            popularity: 50,
            followers: resonance_spotify_client::Followers { total: followers },
        }
    }

    #[test]
    fn test_dedup_candidates_by_provider_id() {
        let mut candidates = vec![
            CandidateSource::SpotifyOnly(spotify_artist("sp1", 1000)),
            CandidateSource::SpotifyOnly(spotify_artist("sp1", 1000)),
        ];
        dedup_candidates(&mut candidates);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_dedup_candidates_by_normalized_name() {
        let lfm_a = LastfmCandidate { name: "The Band".into(), url: None, listeners: Some(10) };
        let lfm_b = LastfmCandidate { name: "the   band".into(), url: None, listeners: Some(20) };
        let mut candidates = vec![CandidateSource::LastfmOnly(lfm_a), CandidateSource::LastfmOnly(lfm_b)];
        dedup_candidates(&mut candidates);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_orchestrated_search_key_cache_key_stable() {
        let key = OrchestratedSearchKey { query: "daft punk".to_string(), page: 1, limit: 20 };
        assert_eq!(key.cache_key(), "orchestrated:daft punk:1:20");
    }
}
