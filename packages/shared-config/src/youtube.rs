//! YouTube-shaped video provider configuration: key ring, quota and
//! yt-dlp-style fallback policy.

use crate::{parse_env, parse_env_list, ConfigResult};

/// Default calendar-day reset hour for quota counters (local time).
pub const DEFAULT_QUOTA_RESET_HOUR: u32 = 4;

/// Default daily request budget shared across all configured API keys.
pub const DEFAULT_DAILY_REQUEST_LIMIT: u32 = 80;

/// Default minimum interval between API-key requests, in seconds.
pub const DEFAULT_MIN_INTERVAL_SECONDS: f64 = 5.0;

#[derive(Clone)]
pub struct YoutubeConfig {
    /// Rotating ring of API keys (`YOUTUBE_API_KEY`, `YOUTUBE_API_KEY_2`, …).
    /// May be empty if only the yt-dlp-style fallback is enabled.
    pub api_keys: Vec<String>,

    /// Local hour at which the daily quota counter resets.
    pub quota_reset_hour: u32,

    /// Daily request budget, shared across the whole key ring.
    pub daily_request_limit: u32,

    /// Minimum interval between API requests, in seconds.
    pub min_interval_seconds: f64,

    /// Whether the yt-dlp-style command-line fallback extractor is enabled.
    pub ytdlp_fallback_enabled: bool,

    /// Daily request budget for the fallback extractor.
    pub ytdlp_daily_limit: u32,

    /// Minimum interval between fallback invocations, in seconds.
    pub ytdlp_min_interval_seconds: f64,
}

impl std::fmt::Debug for YoutubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeConfig")
            .field("api_key_count", &self.api_keys.len())
            .field("quota_reset_hour", &self.quota_reset_hour)
            .field("daily_request_limit", &self.daily_request_limit)
            .field("min_interval_seconds", &self.min_interval_seconds)
            .field("ytdlp_fallback_enabled", &self.ytdlp_fallback_enabled)
            .field("ytdlp_daily_limit", &self.ytdlp_daily_limit)
            .field(
                "ytdlp_min_interval_seconds",
                &self.ytdlp_min_interval_seconds,
            )
            .finish()
    }
}

impl YoutubeConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let mut api_keys = Vec::new();
        if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
            if !key.is_empty() {
                api_keys.push(key);
            }
        }
        if let Ok(key) = std::env::var("YOUTUBE_API_KEY_2") {
            if !key.is_empty() {
                api_keys.push(key);
            }
        }
        // Support an arbitrary-length ring via a comma-separated list too,
        // for deployments with more than two keys.
        if let Some(extra) = parse_env_list("YOUTUBE_API_KEYS") {
            for key in extra {
                if !api_keys.contains(&key) {
                    api_keys.push(key);
                }
            }
        }

        Ok(Self {
            api_keys,
            quota_reset_hour: parse_env("YOUTUBE_QUOTA_RESET_HOUR", DEFAULT_QUOTA_RESET_HOUR)?,
            daily_request_limit: parse_env(
                "YOUTUBE_DAILY_REQUEST_LIMIT",
                DEFAULT_DAILY_REQUEST_LIMIT,
            )?,
            min_interval_seconds: parse_env(
                "YOUTUBE_MIN_INTERVAL_SECONDS",
                DEFAULT_MIN_INTERVAL_SECONDS,
            )?,
            ytdlp_fallback_enabled: parse_env("YTDLP_FALLBACK_ENABLED", false)?,
            ytdlp_daily_limit: parse_env("YTDLP_DAILY_LIMIT", 50u32)?,
            ytdlp_min_interval_seconds: parse_env("YTDLP_MIN_INTERVAL_SECONDS", 3.0)?,
        })
    }

    /// Whether any resolution path (API keys or fallback) is usable at all.
    pub fn has_any_resolution_path(&self) -> bool {
        !self.api_keys.is_empty() || self.ytdlp_fallback_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_with_no_keys() {
        temp_env::with_vars_unset(
            [
                "YOUTUBE_API_KEY",
                "YOUTUBE_API_KEY_2",
                "YOUTUBE_API_KEYS",
                "YTDLP_FALLBACK_ENABLED",
            ],
            || {
                let config = YoutubeConfig::from_env().unwrap();
                assert!(config.api_keys.is_empty());
                assert_eq!(config.quota_reset_hour, DEFAULT_QUOTA_RESET_HOUR);
                assert_eq!(config.daily_request_limit, DEFAULT_DAILY_REQUEST_LIMIT);
                assert!(!config.has_any_resolution_path());
            },
        );
    }

    #[test]
    fn test_two_keys_from_numbered_vars() {
        temp_env::with_vars(
            [
                ("YOUTUBE_API_KEY", Some("key-one")),
                ("YOUTUBE_API_KEY_2", Some("key-two")),
            ],
            || {
                let config = YoutubeConfig::from_env().unwrap();
                assert_eq!(config.api_keys, vec!["key-one", "key-two"]);
            },
        );
    }
}
