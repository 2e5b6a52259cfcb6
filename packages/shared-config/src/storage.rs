//! Local storage root configuration (downloaded audio, logs).

use std::path::PathBuf;

use crate::{get_env_or_default, parse_env, ConfigResult};

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base path for downloaded audio and append-only logs.
    pub storage_root: PathBuf,

    /// Retention horizon for the yt-dlp fallback log, in days.
    pub log_retention_days: i64,
}

impl StorageConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            storage_root: PathBuf::from(get_env_or_default("STORAGE_ROOT", "/data")),
            log_retention_days: parse_env("LOG_RETENTION_DAYS", 30i64)?,
        })
    }

    /// Path to the append-only yt-dlp-style fallback log.
    pub fn fallback_log_path(&self) -> PathBuf {
        self.storage_root.join("logs").join("ytdlp_fallback.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_storage_root() {
        temp_env::with_vars_unset(["STORAGE_ROOT", "LOG_RETENTION_DAYS"], || {
            let config = StorageConfig::from_env().unwrap();
            assert_eq!(config.storage_root, PathBuf::from("/data"));
            assert_eq!(config.log_retention_days, 30);
            assert_eq!(
                config.fallback_log_path(),
                PathBuf::from("/data/logs/ytdlp_fallback.log")
            );
        });
    }
}
