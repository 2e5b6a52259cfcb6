//! Chart Scraper/Matcher (C8, §4.8): fetches chart week snapshots from an
//! external chart-shaped collaborator, persists raw rows, and matches them
//! against local artists/tracks to build `TrackChartStats`.
//!
//! The HTML parser that turns a chart/date pair into ranked entries is out
//! of scope for this crate (spec.md §1, the *chart scraper*); this module
//! only depends on it through the [`ChartScraper`] trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::instrument;

use crate::error::CoreResult;
use crate::models::ChartEntryRaw;
use crate::store::EntityStore;
use crate::text;

/// One ranked entry as reported by the external chart collaborator, before
/// it has been matched to a local artist/track.
#[derive(Debug, Clone)]
pub struct ChartEntry {
    pub rank: i32,
    pub title: String,
    pub artist: String,
}

#[async_trait]
pub trait ChartScraper: Send + Sync {
    async fn fetch_chart_entries(&self, chart: &str, date: NaiveDate) -> CoreResult<Vec<ChartEntry>>;
}

/// Joins raw chart rows against current artists/tracks (§4.8 "Chart
/// Matcher"). Shared by the scraper loop's synchronous post-scrape pass and
/// the standalone matcher loop's periodic re-join.
pub struct ChartMatcher {
    store: EntityStore,
}

impl ChartMatcher {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Attempts to match one raw row to a local track, and if matched,
    /// folds it into that track's `TrackChartStats` for `source`/`chart`.
    /// Returns whether a match was found.
    #[instrument(skip(self, entry))]
    pub async fn match_entry(&self, source: &str, chart: &str, entry: &ChartEntryRaw) -> CoreResult<bool> {
        let normalized_artist = text::normalize(&entry.artist);
        let mut candidate_artists = self.store.artists.find_by_normalized_name(&normalized_artist).await?;
        if candidate_artists.is_empty() {
            candidate_artists = self.store.artists.search_by_alias(&normalized_artist, 5).await?;
        }

        let normalized_title = text::normalize(&entry.title);
        for artist in candidate_artists {
            let tracks = self.store.tracks.find_by_artist_id(artist.id).await?;
            let matched = tracks.into_iter().find(|t| {
                let normalized_track = text::normalize(&t.name);
                normalized_track.contains(&normalized_title) || normalized_title.contains(&normalized_track)
            });
            let Some(track) = matched else { continue };

            let weeks_top5 = i32::from(entry.rank <= 5);
            let weeks_top10 = i32::from(entry.rank <= 10);
            let weeks_at_one = i32::from(entry.rank == 1);
            self.store
                .charts
                .upsert_track_stats(
                    track.id,
                    source,
                    chart,
                    entry.rank,
                    1,
                    weeks_at_one,
                    weeks_top5,
                    weeks_top10,
                    entry.chart_date,
                    entry.chart_date,
                )
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Matches every currently-unmatched raw row for `source`/`chart`,
    /// returning the number of rows newly matched.
    pub async fn rejoin_unmatched(&self, source: &str, chart: &str, limit: i64) -> CoreResult<u32> {
        let unmatched = self.store.charts.find_all_unmatched(source, chart, limit).await?;
        let mut matched = 0u32;
        for entry in &unmatched {
            if self.match_entry(source, chart, entry).await? {
                matched += 1;
            }
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_entry_is_plain_data() {
        let entry = ChartEntry { rank: 1, title: "Clint Eastwood".into(), artist: "Gorillaz".into() };
        assert_eq!(entry.rank, 1);
    }
}
