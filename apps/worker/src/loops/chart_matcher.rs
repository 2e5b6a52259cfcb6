//! Chart Matcher loop (§4.8): periodically re-attempts matching raw chart
//! rows that didn't resolve to a local track at scrape time, since the
//! library keeps growing after a chart week is scraped.

use std::time::Duration;

use resonance_catalog_core::ChartMatcher;
use tokio::sync::broadcast;
use tracing::{info, warn};

const CHART_SOURCE: &str = "billboard";
const REJOIN_BATCH_LIMIT: i64 = 200;

pub struct ChartMatcherLoop {
    matcher: ChartMatcher,
    chart_names: Vec<String>,
    interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ChartMatcherLoop {
    pub fn new(
        matcher: ChartMatcher,
        chart_names: Vec<String>,
        interval_hours: u64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self { matcher, chart_names, interval: Duration::from_secs(interval_hours * 3600), shutdown_rx }
    }

    pub async fn run(mut self) {
        info!(charts = ?self.chart_names, "starting chart matcher loop");
        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("chart matcher loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "chart matcher iteration failed");
                    }
                }
            }
        }
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        for chart in &self.chart_names {
            match self.matcher.rejoin_unmatched(CHART_SOURCE, chart, REJOIN_BATCH_LIMIT).await {
                Ok(matched) => {
                    if matched > 0 {
                        info!(chart, matched, "chart matcher rejoined unmatched entries");
                    }
                }
                Err(e) => warn!(chart, error = %e, "chart matcher rejoin failed"),
            }
        }
        Ok(())
    }
}
