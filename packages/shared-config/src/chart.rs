//! Chart scraper/matcher schedule and backfill window configuration.

use crate::{get_env_or_default, parse_env, ConfigResult};

#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// ISO date the backfill walk should not scrape further back than.
    pub backfill_start_date: Option<String>,

    /// Number of years to backfill when no explicit start date is given.
    pub backfill_years: i64,

    /// Maximum number of chart-weeks scraped per scraper loop iteration.
    pub max_weeks_per_run: u32,

    /// Ranks beyond this are not persisted.
    pub max_rank: u32,

    /// Minimum delay between scraper HTTP requests, in seconds.
    pub request_min_delay_seconds: f64,

    /// Maximum delay between scraper HTTP requests, in seconds.
    pub request_max_delay_seconds: f64,

    /// Hours between scraper loop iterations.
    pub refresh_interval_hours: u64,

    /// Hours between matcher loop iterations.
    pub match_refresh_interval_hours: u64,
}

impl ChartConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            backfill_start_date: std::env::var("CHART_BACKFILL_START_DATE")
                .ok()
                .filter(|s| !s.is_empty()),
            backfill_years: parse_env("CHART_BACKFILL_YEARS", 1i64)?,
            max_weeks_per_run: parse_env("CHART_MAX_WEEKS_PER_RUN", 8u32)?,
            max_rank: parse_env("CHART_MAX_RANK", 100u32)?,
            request_min_delay_seconds: parse_env("CHART_REQUEST_MIN_DELAY_SECONDS", 1.0)?,
            request_max_delay_seconds: parse_env("CHART_REQUEST_MAX_DELAY_SECONDS", 3.0)?,
            refresh_interval_hours: parse_env("CHART_REFRESH_INTERVAL_HOURS", 24u64)?,
            match_refresh_interval_hours: parse_env(
                "CHART_MATCH_REFRESH_INTERVAL_HOURS",
                6u64,
            )?,
        })
    }

    /// Charts to scrape. Not exposed as an env-enumerated list in §6.5; the
    /// concrete set is injected by the caller (worker config) since it names
    /// external chart identifiers rather than a single scalar option.
    pub fn default_chart_names() -> Vec<String> {
        vec![get_env_or_default("CHART_NAMES", "hot-100")]
            .into_iter()
            .flat_map(|s| s.split(',').map(|s| s.trim().to_string()).collect::<Vec<_>>())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(
            [
                "CHART_BACKFILL_START_DATE",
                "CHART_BACKFILL_YEARS",
                "CHART_MAX_WEEKS_PER_RUN",
            ],
            || {
                let config = ChartConfig::from_env().unwrap();
                assert!(config.backfill_start_date.is_none());
                assert_eq!(config.backfill_years, 1);
                assert_eq!(config.max_weeks_per_run, 8);
            },
        );
    }

    #[test]
    fn test_default_chart_names_splits_on_comma() {
        temp_env::with_var("CHART_NAMES", Some("hot-100, billboard-200"), || {
            assert_eq!(
                ChartConfig::default_chart_names(),
                vec!["hot-100".to_string(), "billboard-200".to_string()]
            );
        });
    }
}
