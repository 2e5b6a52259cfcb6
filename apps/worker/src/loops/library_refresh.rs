//! Library Refresh loop (§4.8): walks stale artists oldest-first and
//! re-syncs them against the metadata provider, then checks for new
//! albums/tracks.

use std::time::Duration;

use resonance_catalog_core::{EntityStore, FreshnessManager};
use resonance_catalog_core::models::freshness_defaults;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub struct LibraryRefreshLoop {
    store: EntityStore,
    freshness: FreshnessManager,
    interval: Duration,
    batch_size: i64,
    shutdown_rx: broadcast::Receiver<()>,
}

impl LibraryRefreshLoop {
    pub fn new(
        store: EntityStore,
        freshness: FreshnessManager,
        interval_hours: u64,
        batch_size: i64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self { store, freshness, interval: Duration::from_secs(interval_hours * 3600), batch_size, shutdown_rx }
    }

    pub async fn run(mut self) {
        info!(batch_size = self.batch_size, "starting library refresh loop");
        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("library refresh loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "library refresh iteration failed");
                    }
                }
            }
        }
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let stale = self
            .store
            .artists
            .find_stale(freshness_defaults::ARTIST_MAX_AGE_HOURS, self.batch_size)
            .await?;
        for artist in stale {
            let Some(provider_id) = &artist.provider_id else { continue };
            if let Err(e) = self.freshness.refresh_artist_data(provider_id).await {
                warn!(artist_id = artist.id, error = %e, "library refresh: artist refresh failed");
                continue;
            }
            if let Err(e) = self.freshness.check_for_new_artist_content(provider_id).await {
                warn!(artist_id = artist.id, error = %e, "library refresh: new content check failed");
            }
        }
        Ok(())
    }
}
