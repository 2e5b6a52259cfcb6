//! Freshness Manager (C5, §4.5): keeps provider-sourced rows from going
//! stale without requiring a caller to ask for every entity on every
//! request. Grounded on `app/core/data_freshness.py`'s
//! `DataFreshnessManager.should_refresh_*` / `refresh_artist_data` /
//! `check_for_new_artist_content` / `bulk_refresh_stale_artists`.

use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use resonance_lastfm_client::LastfmClient;
use resonance_spotify_client::{AlbumGroup, SpotifyClient};
use tracing::{instrument, warn};

use crate::error::{CoreError, CoreResult};
use crate::models::{freshness_defaults, Artist};
use crate::store::EntityStore;
use crate::writer::{AlbumUpsert, ArtistUpsert, CatalogWriter, TrackUpsert};

/// Fixed pacing delay between artists in a bulk refresh pass (§4.5
/// `[SUPPLEMENT]`, ported from `await asyncio.sleep(0.5)`).
const BULK_REFRESH_PACING: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct FreshnessManager {
    store: EntityStore,
    writer: CatalogWriter,
    spotify: SpotifyClient,
    lastfm: Option<LastfmClient>,
}

/// Whether `updated_at` is missing or older than `max_age_hours` (§4.5).
pub fn is_stale(updated_at: Option<NaiveDateTime>, max_age_hours: i64) -> bool {
    match updated_at {
        None => true,
        Some(updated_at) => {
            let age = Utc::now().naive_utc() - updated_at;
            age.num_hours() > max_age_hours
        }
    }
}

impl FreshnessManager {
    pub fn new(store: EntityStore, writer: CatalogWriter, spotify: SpotifyClient, lastfm: Option<LastfmClient>) -> Self {
        Self { store, writer, spotify, lastfm }
    }

    /// Fetches provider data for one artist, upserts it, then best-effort
    /// layers a bio from the stats provider on top (§4.5).
    #[instrument(skip(self))]
    pub async fn refresh_artist_data(&self, provider_id: &str) -> CoreResult<Artist> {
        let remote = self
            .spotify
            .get_artist(provider_id)
            .await
            .map_err(|e| CoreError::Transient(Box::new(e)))?
            .ok_or_else(|| CoreError::NotFound { resource_type: "artist", id: provider_id.to_string() })?;

        let mut bio_summary = None;
        let mut bio_long = None;
        if let Some(lastfm) = &self.lastfm {
            match lastfm.get_artist_info(&remote.name).await {
                Ok(info) => {
                    bio_summary = info.bio_summary;
                    bio_long = info.bio_full;
                }
                Err(e) => warn!(artist = %remote.name, error = %e, "best-effort bio lookup failed"),
            }
        }

        let artist = self
            .writer
            .save_artist(ArtistUpsert {
                provider_id: Some(remote.id.clone()),
                name: remote.name,
                genres: remote.genres,
                image_url: remote.images.first().map(|img| img.url.clone()),
                popularity: remote.popularity,
                followers: remote.followers.total,
                bio_summary,
                bio_long,
            })
            .await?;
        Ok(artist)
    }

    /// Lists every album for an artist and persists any unseen album and
    /// its unseen tracks (§4.5).
    #[instrument(skip(self))]
    pub async fn check_for_new_artist_content(&self, provider_id: &str) -> CoreResult<u32> {
        let artist = self
            .store
            .artists
            .find_by_provider_id(provider_id)
            .await?
            .ok_or_else(|| CoreError::NotFound { resource_type: "artist", id: provider_id.to_string() })?;

        let albums = self
            .spotify
            .get_artist_albums(provider_id, &AlbumGroup::discography_default(), true)
            .await
            .map_err(|e| CoreError::Transient(Box::new(e)))?;

        let mut new_track_count = 0u32;
        for remote_album in albums {
            let already_seen = self.store.albums.find_by_provider_id(&remote_album.id).await?.is_some();

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

            if already_seen {
                continue;
            }

            let tracks = self
                .spotify
                .get_album_tracks(&remote_album.id)
                .await
                .map_err(|e| CoreError::Transient(Box::new(e)))?;
            for remote_track in tracks {
                if self.store.tracks.find_by_provider_id(&remote_track.id).await?.is_some() {
                    continue;
                }
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
                new_track_count += 1;
            }
        }
        Ok(new_track_count)
    }

    /// Refreshes up to `max` stale artists, ordered oldest-refreshed first
    /// (§4.5), pacing requests so a bulk pass doesn't hammer providers.
    #[instrument(skip(self))]
    pub async fn bulk_refresh_stale_artists(&self, max: i64) -> CoreResult<u32> {
        let stale = self.store.artists.find_stale(freshness_defaults::ARTIST_MAX_AGE_HOURS, max).await?;
        let mut refreshed = 0u32;
        for (idx, artist) in stale.iter().enumerate() {
            let Some(provider_id) = &artist.provider_id else { continue };
            match self.refresh_artist_data(provider_id).await {
                Ok(_) => refreshed += 1,
                Err(e) => warn!(artist_id = artist.id, error = %e, "stale artist refresh failed"),
            }
            if idx + 1 < stale.len() {
                tokio::time::sleep(BULK_REFRESH_PACING).await;
            }
        }
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_updated_at_is_stale() {
        assert!(is_stale(None, 24));
    }

    #[test]
    fn test_recent_update_is_not_stale() {
        assert!(!is_stale(Some(Utc::now().naive_utc()), 24));
    }

    #[test]
    fn test_old_update_is_stale() {
        let old = Utc::now().naive_utc() - chrono::Duration::hours(200);
        assert!(is_stale(Some(old), freshness_defaults::TRACK_MAX_AGE_HOURS));
    }
}
