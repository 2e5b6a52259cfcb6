//! Bounded persistence work queue (§9 redesign note "suspension-heavy
//! request path"). The original fires `create_task(_persist_artist(...))`
//! directly from the request handler; here the handler only enqueues, and
//! a small fixed pool of workers drains the queue, so request latency
//! never depends on provider/database round-trips triggered by someone
//! else's search.

use std::sync::Arc;

use resonance_catalog_core::writer::{ArtistUpsert, CatalogWriter};
use resonance_catalog_core::LibraryExpander;
use resonance_spotify_client::Artist as SpotifyArtist;
use tokio::sync::{mpsc, Semaphore};
use tracing::warn;

/// One unit of opportunistic work queued by the Search Orchestrator after
/// a response has already been built (§4.9 step 5).
#[derive(Debug, Clone)]
pub enum PersistJob {
    SaveArtist(SpotifyArtist),
    ExpandArtist(String),
}

/// Consumes [`PersistJob`]s off a bounded channel with at most
/// `concurrency` jobs running at once. `enqueue` never blocks: a full
/// queue drops the job with a warning rather than stalling the caller,
/// since nothing downstream awaits these jobs and the data they would
/// have written is re-derived the next time the same artist surfaces.
#[derive(Clone)]
pub struct PersistQueue {
    sender: mpsc::Sender<PersistJob>,
}

impl PersistQueue {
    pub fn spawn(writer: CatalogWriter, expander: LibraryExpander, capacity: usize, concurrency: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel(capacity);
        let semaphore = Arc::new(Semaphore::new(concurrency));

        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                let writer = writer.clone();
                let expander = expander.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(err) = run_job(job, &writer, &expander).await {
                        warn!(error = %err, "persistence queue job failed");
                    }
                });
            }
        });

        Self { sender }
    }

    /// Enqueues `job`, dropping it with a warning if the queue is
    /// saturated rather than applying back-pressure to the caller.
    pub fn enqueue(&self, job: PersistJob) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.sender.try_send(job) {
            warn!("persistence queue saturated, dropping job");
        }
    }
}

async fn run_job(
    job: PersistJob,
    writer: &CatalogWriter,
    expander: &LibraryExpander,
) -> Result<(), resonance_catalog_core::CoreError> {
    match job {
        PersistJob::SaveArtist(artist) => {
            writer
                .save_artist(ArtistUpsert {
                    provider_id: Some(artist.id),
                    name: artist.name,
                    genres: artist.genres,
                    image_url: artist.images.first().map(|i| i.url.clone()),
                    popularity: artist.popularity,
                    followers: artist.followers.total as i64,
                    bio_summary: None,
                    bio_long: None,
                })
                .await?;
            Ok(())
        }
        PersistJob::ExpandArtist(provider_id) => expander.expand_from_seed(&provider_id).await,
    }
}
