//! Daily Refresh loop (§4.8): re-expands every favorited artist's
//! discography, then opportunistically fills metadata gaps on artists
//! missing a bio, genres, or image.

use std::time::Duration;

use resonance_catalog_core::{EntityStore, FreshnessManager, LibraryExpander};
use tokio::sync::broadcast;
use tracing::{info, warn};

const MISSING_METADATA_BATCH: i64 = 50;
const FAVORITED_ARTIST_BATCH: i64 = 200;

pub struct DailyRefreshLoop {
    store: EntityStore,
    expander: LibraryExpander,
    freshness: FreshnessManager,
    interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
}

impl DailyRefreshLoop {
    pub fn new(
        store: EntityStore,
        expander: LibraryExpander,
        freshness: FreshnessManager,
        interval_hours: u64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self { store, expander, freshness, interval: Duration::from_secs(interval_hours * 3600), shutdown_rx }
    }

    pub async fn run(mut self) {
        info!(interval_hours = self.interval.as_secs() / 3600, "starting daily refresh loop");
        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("daily refresh loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "daily refresh iteration failed");
                    }
                }
            }
        }
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let favorited_ids = self.store.favorites.find_all_favorited_artist_ids(FAVORITED_ARTIST_BATCH).await?;
        for artist_id in favorited_ids {
            let Some(artist) = self.store.artists.find_by_id(artist_id).await? else { continue };
            let Some(provider_id) = &artist.provider_id else { continue };
            if let Err(e) = self.expander.expand_from_seed(provider_id).await {
                warn!(artist_id, error = %e, "favorited artist expansion failed");
            }
        }

        let missing = self.store.artists.find_missing_metadata(MISSING_METADATA_BATCH).await?;
        for artist in missing {
            let Some(provider_id) = &artist.provider_id else { continue };
            if let Err(e) = self.freshness.refresh_artist_data(provider_id).await {
                warn!(artist_id = artist.id, error = %e, "metadata gap-fill failed");
            }
        }
        Ok(())
    }
}
