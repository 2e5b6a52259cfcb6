//! Chart Scraper loop (§4.8): walks Saturday-aligned chart-week dates
//! (backfilling until a configured start date, then forward from the most
//! recent scan), fetches each week through the external chart collaborator,
//! persists raw rows, and runs the matcher synchronously for the same
//! dates.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;
use resonance_catalog_core::{ChartMatcher, ChartScraper, EntityStore};
use resonance_shared_config::ChartConfig;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// The only chart source this crate scrapes; kept as a constant rather
/// than a config knob since `CHART_NAMES` already enumerates the charts
/// within it (§6.5).
const CHART_SOURCE: &str = "billboard";

pub struct ChartScraperLoop {
    store: EntityStore,
    matcher: ChartMatcher,
    /// The HTML chart parser is an external collaborator out of scope for
    /// this crate (spec.md §1); a deployment without one simply runs this
    /// loop as a no-op, same as `YoutubeLinkResolver`'s optional media
    /// fetcher.
    scraper: Option<Arc<dyn ChartScraper>>,
    chart_names: Vec<String>,
    config: ChartConfig,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ChartScraperLoop {
    pub fn new(
        store: EntityStore,
        matcher: ChartMatcher,
        scraper: Option<Arc<dyn ChartScraper>>,
        chart_names: Vec<String>,
        config: ChartConfig,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self { store, matcher, scraper, chart_names, config, shutdown_rx }
    }

    pub async fn run(mut self) {
        let interval = Duration::from_secs(self.config.refresh_interval_hours * 3600);
        info!(charts = ?self.chart_names, "starting chart scraper loop");
        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("chart scraper loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "chart scraper iteration failed");
                    }
                }
            }
        }
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let Some(scraper) = self.scraper.clone() else {
            return Ok(());
        };
        for chart in &self.chart_names {
            self.scrape_chart(&scraper, chart).await?;
        }
        Ok(())
    }

    async fn scrape_chart(&self, scraper: &Arc<dyn ChartScraper>, chart: &str) -> anyhow::Result<()> {
        let plan = self.plan_dates(chart).await?;
        if plan.dates.is_empty() {
            return Ok(());
        }

        for (idx, date) in plan.dates.iter().enumerate() {
            match scraper.fetch_chart_entries(chart, *date).await {
                Ok(entries) => {
                    for entry in entries.into_iter().filter(|e| e.rank as u32 <= self.config.max_rank) {
                        let raw = self
                            .store
                            .charts
                            .insert_raw_entry(CHART_SOURCE, chart, *date, entry.rank, &entry.title, &entry.artist)
                            .await?;
                        if let Err(e) = self.matcher.match_entry(CHART_SOURCE, chart, &raw).await {
                            warn!(chart, %date, error = %e, "chart entry match failed");
                        }
                    }
                }
                Err(e) => warn!(chart, %date, error = %e, "chart scrape failed"),
            }
            if idx + 1 < plan.dates.len() {
                self.sleep_random_delay().await;
            }
        }

        self.store
            .charts
            .upsert_scan_state(CHART_SOURCE, chart, plan.new_last_scanned_date, plan.new_backfill_complete)
            .await?;
        Ok(())
    }

    async fn sleep_random_delay(&self) {
        let (min, max) = (self.config.request_min_delay_seconds, self.config.request_max_delay_seconds);
        let delay = if max > min { rand::thread_rng().gen_range(min..max) } else { min };
        tokio::time::sleep(Duration::from_secs_f64(delay.max(0.0))).await;
    }

    async fn plan_dates(&self, chart: &str) -> anyhow::Result<ScrapePlan> {
        let today = Utc::now().date_naive();
        let latest_saturday = most_recent_saturday(today);
        let backfill_start = self.backfill_start_date(latest_saturday);
        let scan_state = self.store.charts.get_scan_state(CHART_SOURCE, chart).await?;
        let max_weeks = self.config.max_weeks_per_run as usize;

        let plan = match scan_state {
            None => plan_backward(latest_saturday, backfill_start, max_weeks),
            Some(state) if !state.backfill_complete => {
                let cursor = state.last_scanned_date.map_or(latest_saturday, |d| d - chrono::Duration::weeks(1));
                plan_backward(cursor, backfill_start, max_weeks)
            }
            Some(state) => {
                let cursor = state.last_scanned_date.map_or(latest_saturday, |d| d + chrono::Duration::weeks(1));
                plan_forward(cursor, latest_saturday, max_weeks)
            }
        };
        Ok(plan)
    }

    fn backfill_start_date(&self, latest_saturday: NaiveDate) -> NaiveDate {
        if let Some(iso) = &self.config.backfill_start_date {
            if let Ok(date) = NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
                return most_recent_saturday(date);
            }
        }
        most_recent_saturday(latest_saturday - chrono::Duration::days(self.config.backfill_years * 365))
    }
}

struct ScrapePlan {
    dates: Vec<NaiveDate>,
    new_last_scanned_date: NaiveDate,
    new_backfill_complete: bool,
}

/// Walks backward in 7-day steps from `from` down to `floor`, up to
/// `max_weeks` dates.
fn plan_backward(from: NaiveDate, floor: NaiveDate, max_weeks: usize) -> ScrapePlan {
    let mut dates = Vec::new();
    let mut cursor = from;
    while dates.len() < max_weeks && cursor >= floor {
        dates.push(cursor);
        cursor -= chrono::Duration::weeks(1);
    }
    let reached_floor = cursor < floor;
    let last = dates.last().copied().unwrap_or(from);
    ScrapePlan { dates, new_last_scanned_date: last, new_backfill_complete: reached_floor }
}

/// Walks forward in 7-day steps from `from` up to `ceiling`, up to
/// `max_weeks` dates. Used once backfill is complete.
fn plan_forward(from: NaiveDate, ceiling: NaiveDate, max_weeks: usize) -> ScrapePlan {
    let mut dates = Vec::new();
    let mut cursor = from;
    while dates.len() < max_weeks && cursor <= ceiling {
        dates.push(cursor);
        cursor += chrono::Duration::weeks(1);
    }
    let last = dates.last().copied().unwrap_or(from - chrono::Duration::weeks(1));
    ScrapePlan { dates, new_last_scanned_date: last, new_backfill_complete: true }
}

/// The Saturday on or before `from` (chart weeks are Saturday-aligned, §4.8).
fn most_recent_saturday(from: NaiveDate) -> NaiveDate {
    let days_since_saturday = (from.weekday().num_days_from_monday() as i64 + 2) % 7;
    from - chrono::Duration::days(days_since_saturday)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_recent_saturday_on_saturday() {
        let saturday = NaiveDate::from_ymd_opt(2026, 7, 25).unwrap();
        assert_eq!(saturday.weekday(), chrono::Weekday::Sat);
        assert_eq!(most_recent_saturday(saturday), saturday);
    }

    #[test]
    fn test_most_recent_saturday_midweek() {
        let wednesday = NaiveDate::from_ymd_opt(2026, 7, 29).unwrap();
        assert_eq!(wednesday.weekday(), chrono::Weekday::Wed);
        let expected = NaiveDate::from_ymd_opt(2026, 7, 25).unwrap();
        assert_eq!(most_recent_saturday(wednesday), expected);
    }

    #[test]
    fn test_plan_backward_stops_at_floor() {
        let from = NaiveDate::from_ymd_opt(2026, 7, 25).unwrap();
        let floor = NaiveDate::from_ymd_opt(2026, 7, 11).unwrap();
        let plan = plan_backward(from, floor, 8);
        assert_eq!(plan.dates.len(), 3);
        assert!(plan.new_backfill_complete);
    }

    #[test]
    fn test_plan_backward_caps_at_max_weeks() {
        let from = NaiveDate::from_ymd_opt(2026, 7, 25).unwrap();
        let floor = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let plan = plan_backward(from, floor, 4);
        assert_eq!(plan.dates.len(), 4);
        assert!(!plan.new_backfill_complete);
    }
}
