//! YouTube Prefetch loop (§4.8): resolves tracks' YouTube links one at a
//! time ahead of user demand, rate-limited to the client's minimum request
//! interval, with an extended pause on repeated quota errors.

use std::time::Duration;

use resonance_catalog_core::models::YoutubeLinkStatus;
use resonance_catalog_core::{EntityStore, YoutubeLinkResolver};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Consecutive `error`-status resolutions (quota exhaustion surfaces this
/// way, §4.7) before the loop backs off entirely.
const CONSECUTIVE_ERROR_THRESHOLD: u32 = 3;
const QUOTA_BACKOFF: Duration = Duration::from_secs(15 * 60);
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(500);

pub struct YoutubePrefetchLoop {
    store: EntityStore,
    resolver: YoutubeLinkResolver,
    interval: Duration,
    batch_size: i64,
    shutdown_rx: broadcast::Receiver<()>,
}

impl YoutubePrefetchLoop {
    pub fn new(
        store: EntityStore,
        resolver: YoutubeLinkResolver,
        interval_minutes: u64,
        batch_size: i64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self { store, resolver, interval: Duration::from_secs(interval_minutes * 60), batch_size, shutdown_rx }
    }

    pub async fn run(mut self) {
        info!(batch_size = self.batch_size, "starting youtube prefetch loop");
        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("youtube prefetch loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "youtube prefetch iteration failed");
                    }
                }
            }
        }
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let mut candidates = self.store.tracks.find_missing_youtube_link(self.batch_size).await?;
        if candidates.is_empty() {
            let unresolved = self.store.youtube_links.find_unresolved(self.batch_size).await?;
            for link in unresolved {
                if !YoutubeLinkResolver::needs_resolution(Some(&link)) {
                    continue;
                }
                if let Some(track) = self.store.tracks.find_by_provider_id(&link.track_provider_id).await? {
                    candidates.push(track);
                }
            }
        }

        let mut consecutive_errors = 0u32;
        for track in candidates {
            let Some(provider_id) = &track.provider_id else { continue };
            let Some(artist) = self.store.artists.find_by_id(track.artist_id).await? else { continue };
            let album_name = match track.album_id {
                Some(album_id) => self.store.albums.find_by_id(album_id).await?.map(|a| a.name),
                None => None,
            };

            match self.resolver.resolve_track(provider_id, &artist.name, &track.name, album_name.as_deref()).await {
                Ok(link) if link.status == YoutubeLinkStatus::Error => {
                    consecutive_errors += 1;
                    if consecutive_errors >= CONSECUTIVE_ERROR_THRESHOLD {
                        warn!(consecutive_errors, "youtube prefetch backing off after repeated quota errors");
                        tokio::time::sleep(QUOTA_BACKOFF).await;
                        consecutive_errors = 0;
                    }
                }
                Ok(_) => consecutive_errors = 0,
                Err(e) => {
                    warn!(track_id = track.id, error = %e, "youtube prefetch resolution failed");
                }
            }

            tokio::time::sleep(MIN_REQUEST_INTERVAL).await;
        }
        Ok(())
    }
}
