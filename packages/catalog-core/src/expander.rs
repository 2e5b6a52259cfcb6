//! Library Expander (C6, §4.6): pulls a seed artist's full discography
//! into the catalog, optionally recursing one level into similar artists.
//! Grounded on `app/services/library_expansion.py`, in particular
//! `save_artist_discography` (album groups `album,single,compilation`,
//! `fetch_all=true`).
//!
//! The original's `_expansion_tasks` in-flight map is reimplemented as a
//! typed singleflight keyed by provider id (§9 redesign note): concurrent
//! callers for the same artist share one expansion instead of duplicating
//! provider requests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::{FutureExt, Shared};
use resonance_lastfm_client::LastfmClient;
use resonance_spotify_client::{AlbumGroup, SpotifyClient};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{instrument, warn};

use crate::error::{CoreError, CoreResult};
use crate::writer::{AlbumUpsert, ArtistUpsert, CatalogWriter, TrackUpsert};

type SharedOutcome = Arc<Result<(), String>>;
type InFlightFuture = Shared<Pin<Box<dyn Future<Output = SharedOutcome> + Send>>>;

#[derive(Clone)]
pub struct LibraryExpander {
    writer: CatalogWriter,
    spotify: SpotifyClient,
    lastfm: Option<LastfmClient>,
    in_flight: Arc<AsyncMutex<HashMap<String, InFlightFuture>>>,
}

impl LibraryExpander {
    pub fn new(writer: CatalogWriter, spotify: SpotifyClient, lastfm: Option<LastfmClient>) -> Self {
        Self { writer, spotify, lastfm, in_flight: Arc::new(AsyncMutex::new(HashMap::new())) }
    }

    /// Expands a seed artist's discography, deduplicating concurrent calls
    /// for the same provider id (§4.6, §9 redesign note).
    #[instrument(skip(self))]
    pub async fn expand_from_seed(&self, provider_id: &str) -> CoreResult<()> {
        self.expand_dedup(provider_id, None, None).await
    }

    /// Same as [`Self::expand_from_seed`] plus up to `k` similar artists,
    /// each expanded one level deep (never recursing further) with
    /// `tracks_per_artist` capping how many tracks are pulled per similar
    /// artist's albums (§4.6). The seed artist's own discography is never
    /// capped, only the similar artists pulled in alongside it.
    #[instrument(skip(self))]
    pub async fn expand_with_similar(&self, provider_id: &str, k: u32, tracks_per_artist: u32) -> CoreResult<()> {
        self.expand_dedup(provider_id, Some((k, tracks_per_artist)), None).await
    }

    async fn expand_dedup(&self, provider_id: &str, similar: Option<(u32, u32)>, track_limit: Option<u32>) -> CoreResult<()> {
        let fut = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(existing) = in_flight.get(provider_id) {
                existing.clone()
            } else {
                let this = self.clone();
                let key = provider_id.to_string();
                let task: Pin<Box<dyn Future<Output = SharedOutcome> + Send>> = Box::pin(async move {
                    let result = this.do_expand(&key, similar, track_limit).await.map_err(|e| e.to_string());
                    Arc::new(result)
                });
                let shared = task.shared();
                in_flight.insert(provider_id.to_string(), shared.clone());
                shared
            }
        };

        let outcome = fut.await;
        self.in_flight.lock().await.remove(provider_id);
        match outcome.as_ref() {
            Ok(()) => Ok(()),
            Err(message) => Err(CoreError::internal(message.clone())),
        }
    }

    /// `track_limit`, when set, caps the total number of tracks pulled
    /// across this artist's albums — used for the similar-artist pass
    /// (§4.6), never for the seed artist itself.
    async fn do_expand(&self, provider_id: &str, similar: Option<(u32, u32)>, track_limit: Option<u32>) -> CoreResult<()> {
        let remote_artist = self
            .spotify
            .get_artist(provider_id)
            .await
            .map_err(|e| CoreError::Transient(Box::new(e)))?
            .ok_or_else(|| CoreError::NotFound { resource_type: "artist", id: provider_id.to_string() })?;

        let artist = self
            .writer
            .save_artist(ArtistUpsert {
                provider_id: Some(remote_artist.id.clone()),
                name: remote_artist.name.clone(),
                genres: remote_artist.genres,
                image_url: remote_artist.images.first().map(|img| img.url.clone()),
                popularity: remote_artist.popularity,
                followers: remote_artist.followers.total,
                bio_summary: None,
                bio_long: None,
            })
            .await?;

        let albums = self
            .spotify
            .get_artist_albums(provider_id, &AlbumGroup::discography_default(), true)
            .await
            .map_err(|e| CoreError::Transient(Box::new(e)))?;

        let mut tracks_pulled: u32 = 0;
        for remote_album in albums {
            if let Some(limit) = track_limit {
                if tracks_pulled >= limit {
                    break;
                }
            }

            let local_album = self
                .writer
                .save_album(AlbumUpsert {
                    provider_id: Some(remote_album.id.clone()),
                    name: remote_album.name,
                    artist_id: artist.id,
                    release_date: remote_album.release_date,
                    total_tracks: remote_album.total_tracks,
                    label: remote_album.label,
                    image_url: remote_album.images.first().map(|img| img.url.clone()),
                })
                .await?;

            let mut tracks = self
                .spotify
                .get_album_tracks(&remote_album.id)
                .await
                .map_err(|e| CoreError::Transient(Box::new(e)))?;
            if let Some(limit) = track_limit {
                tracks.truncate(limit.saturating_sub(tracks_pulled) as usize);
            }
            tracks_pulled += tracks.len() as u32;
            for remote_track in tracks {
                self.writer
                    .save_track(TrackUpsert {
                        provider_id: Some(remote_track.id),
                        name: remote_track.name,
                        artist_id: artist.id,
                        album_id: Some(local_album.id),
                        duration_ms: remote_track.duration_ms,
                        popularity: remote_track.popularity,
                        preview_url: remote_track.preview_url,
                        external_url: remote_track.external_urls.and_then(|u| u.primary),
                    })
                    .await?;
            }
        }

        if let Some((k, tracks_per_artist)) = similar {
            self.expand_similar_once(&remote_artist.name, k, tracks_per_artist).await;
        }

        Ok(())
    }

    /// One level of similar-artist expansion; never recurses into the
    /// similar artists' own similar artists (§4.6: "one level deep, never
    /// cyclic"). Skips a candidate already present locally rather than
    /// re-pulling its full discography through `save_artist` idempotency
    /// alone (§4.6 "skips ones already present").
    async fn expand_similar_once(&self, seed_artist_name: &str, k: u32, tracks_per_artist: u32) {
        let Some(lastfm) = &self.lastfm else { return };
        let similar = match lastfm.get_similar_artists(seed_artist_name, Some(k)).await {
            Ok(artists) => artists,
            Err(e) => {
                warn!(artist = %seed_artist_name, error = %e, "similar-artist lookup failed");
                return;
            }
        };

        for candidate in similar.into_iter().take(k as usize) {
            let search_hits = match self.spotify.search_artists(&candidate.name, 1).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(artist = %candidate.name, error = %e, "similar-artist spotify lookup failed");
                    continue;
                }
            };
            let Some(remote) = search_hits.into_iter().next() else { continue };

            match self.writer.store().artists.find_by_provider_id(&remote.id).await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => {
                    warn!(artist = %remote.name, error = %e, "similar-artist presence check failed, expanding anyway");
                }
            }

            // one level deep only: pass `similar: None` regardless of caller's own flag
            if let Err(e) = self.expand_dedup(&remote.id, None, Some(tracks_per_artist)).await {
                warn!(artist = %remote.name, error = %e, "similar-artist expansion failed");
            }
        }
    }
}
