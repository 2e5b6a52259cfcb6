//! Worker configuration: the common config plus per-loop scheduling knobs
//! (§4.8, §6.5).

use resonance_shared_config::{parse_env, ChartConfig, CommonConfig, ConfigResult};

#[derive(Debug, Clone)]
pub struct Config {
    pub common: CommonConfig,

    /// Hours between Daily Refresh loop iterations (favorited artists,
    /// §4.8 "Daily Refresh").
    pub daily_refresh_interval_hours: u64,

    /// Hours between Genre Backfill loop iterations.
    pub genre_backfill_interval_hours: u64,
    /// Artists processed per Genre Backfill iteration.
    pub genre_backfill_batch_size: i64,
    /// Top-N similar artists pulled per backfilled artist.
    pub genre_backfill_top_n: u32,

    /// Hours between Library Refresh loop iterations (stale artists/albums).
    pub library_refresh_interval_hours: u64,
    /// Artists processed per Library Refresh iteration.
    pub library_refresh_batch_size: i64,

    /// Charts to scrape (e.g. `hot-100`), from `CHART_NAMES`.
    pub chart_names: Vec<String>,

    /// Maximum number of YouTube resolutions attempted per prefetch loop
    /// iteration.
    pub youtube_prefetch_batch_size: i64,
    /// Minutes between YouTube prefetch loop iterations.
    pub youtube_prefetch_interval_minutes: u64,
}

impl Config {
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            common: CommonConfig::from_env()?,
            daily_refresh_interval_hours: parse_env("DAILY_REFRESH_INTERVAL_HOURS", 24u64)?,
            genre_backfill_interval_hours: parse_env("GENRE_BACKFILL_INTERVAL_HOURS", 2u64)?,
            genre_backfill_batch_size: parse_env("GENRE_BACKFILL_BATCH_SIZE", 100i64)?,
            genre_backfill_top_n: parse_env("GENRE_BACKFILL_TOP_N", 6u32)?,
            library_refresh_interval_hours: parse_env("LIBRARY_REFRESH_INTERVAL_HOURS", 6u64)?,
            library_refresh_batch_size: parse_env("LIBRARY_REFRESH_BATCH_SIZE", 30i64)?,
            chart_names: ChartConfig::default_chart_names(),
            youtube_prefetch_batch_size: parse_env("YOUTUBE_PREFETCH_BATCH_SIZE", 25i64)?,
            youtube_prefetch_interval_minutes: parse_env(
                "YOUTUBE_PREFETCH_INTERVAL_MINUTES",
                15u64,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(
            [
                "DAILY_REFRESH_INTERVAL_HOURS",
                "GENRE_BACKFILL_INTERVAL_HOURS",
                "GENRE_BACKFILL_BATCH_SIZE",
                "LIBRARY_REFRESH_INTERVAL_HOURS",
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.daily_refresh_interval_hours, 24);
                assert_eq!(config.genre_backfill_interval_hours, 2);
                assert_eq!(config.genre_backfill_batch_size, 100);
                assert_eq!(config.genre_backfill_top_n, 6);
                assert_eq!(config.library_refresh_interval_hours, 6);
                assert_eq!(config.library_refresh_batch_size, 30);
            },
        );
    }
}
