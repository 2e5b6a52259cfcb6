//! Genre Backfill loop (§4.8): samples top tracks per artist, asks the
//! stats provider for track tags, filters noise, and keeps the top-N tags
//! as the artist's genre list.

use std::collections::HashSet;
use std::time::Duration;

use resonance_catalog_core::EntityStore;
use resonance_lastfm_client::LastfmClient;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Tags dropped before ranking (§4.8 `[SUPPLEMENT]`): generic listening-mode
/// tags, pure-digit tags (years), and tags that just restate the artist or
/// a sampled track's own name.
const NOISE_TAGS: &[&str] = &["live", "favourite", "favorite", "favorites", "seen live"];

const TRACKS_SAMPLED_PER_ARTIST: usize = 3;

pub struct GenreBackfillLoop {
    store: EntityStore,
    lastfm: Option<LastfmClient>,
    interval: Duration,
    batch_size: i64,
    top_n: u32,
    shutdown_rx: broadcast::Receiver<()>,
}

impl GenreBackfillLoop {
    pub fn new(
        store: EntityStore,
        lastfm: Option<LastfmClient>,
        interval_hours: u64,
        batch_size: i64,
        top_n: u32,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self { store, lastfm, interval: Duration::from_secs(interval_hours * 3600), batch_size, top_n, shutdown_rx }
    }

    pub async fn run(mut self) {
        info!(batch_size = self.batch_size, top_n = self.top_n, "starting genre backfill loop");
        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("genre backfill loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "genre backfill iteration failed");
                    }
                }
            }
        }
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let Some(lastfm) = &self.lastfm else {
            return Ok(());
        };

        let candidates = self.store.artists.find_missing_genres(self.batch_size).await?;
        for artist in candidates {
            let tracks = self.store.tracks.find_by_artist_id(artist.id).await?;
            let sampled: Vec<_> = tracks.into_iter().take(TRACKS_SAMPLED_PER_ARTIST).collect();
            if sampled.is_empty() {
                continue;
            }

            let sampled_track_names: HashSet<String> =
                sampled.iter().map(|t| t.name.to_lowercase()).collect();
            let artist_name_lower = artist.name.to_lowercase();

            let mut tag_counts: Vec<(String, u32)> = Vec::new();
            for track in &sampled {
                let info = match lastfm.get_track_info(&artist.name, &track.name).await {
                    Ok(info) => info,
                    Err(e) => {
                        warn!(artist_id = artist.id, track = %track.name, error = %e, "track tag lookup failed");
                        continue;
                    }
                };
                for tag in info.tags {
                    let lower = tag.to_lowercase();
                    if is_noise_tag(&lower, &artist_name_lower, &sampled_track_names) {
                        continue;
                    }
                    match tag_counts.iter_mut().find(|(name, _)| *name == lower) {
                        Some((_, count)) => *count += 1,
                        None => tag_counts.push((lower, 1)),
                    }
                }
            }

            if tag_counts.is_empty() {
                continue;
            }
            tag_counts.sort_by(|a, b| b.1.cmp(&a.1));
            let genres: Vec<String> = tag_counts.into_iter().take(self.top_n as usize).map(|(name, _)| name).collect();

            if let Err(e) = self
                .store
                .artists
                .update_enrichment(
                    artist.id,
                    &genres,
                    artist.image_url.as_deref(),
                    artist.popularity,
                    artist.followers,
                    artist.bio_summary.as_deref(),
                    artist.bio_long.as_deref(),
                )
                .await
            {
                warn!(artist_id = artist.id, error = %e, "genre update failed");
            }
        }
        Ok(())
    }
}

/// Noise-filtering rule (§4.8 `[SUPPLEMENT]`): drop generic listening-mode
/// tags, pure-digit tags, and tags that just restate the artist name or one
/// of the sampled track names.
fn is_noise_tag(lower_tag: &str, artist_name_lower: &str, sampled_track_names: &HashSet<String>) -> bool {
    NOISE_TAGS.contains(&lower_tag)
        || lower_tag.chars().all(|c| c.is_ascii_digit())
        || lower_tag == artist_name_lower
        || sampled_track_names.contains(lower_tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_tag_live() {
        assert!(is_noise_tag("live", "gorillaz", &HashSet::new()));
    }

    #[test]
    fn test_noise_tag_digit_year() {
        assert!(is_noise_tag("2005", "gorillaz", &HashSet::new()));
    }

    #[test]
    fn test_noise_tag_artist_name() {
        assert!(is_noise_tag("gorillaz", "gorillaz", &HashSet::new()));
    }

    #[test]
    fn test_noise_tag_track_name() {
        let mut tracks = HashSet::new();
        tracks.insert("clint eastwood".to_string());
        assert!(is_noise_tag("clint eastwood", "gorillaz", &tracks));
    }

    #[test]
    fn test_genuine_genre_tag_kept() {
        assert!(!is_noise_tag("alternative rock", "gorillaz", &HashSet::new()));
    }
}
