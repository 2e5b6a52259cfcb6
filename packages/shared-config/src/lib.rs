//! Shared configuration types for Resonance services
//!
//! This crate provides common configuration types used by both the API
//! and worker services, ensuring consistency across the application.

mod chart;
mod database;
mod error;
mod lastfm;
mod spotify;
mod storage;
mod youtube;

pub use chart::ChartConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ConfigResult};
pub use lastfm::LastfmConfig;
pub use spotify::SpotifyConfig;
pub use storage::StorageConfig;
pub use youtube::YoutubeConfig;

use std::env;

/// Common configuration shared between all services
#[derive(Debug, Clone)]
pub struct CommonConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Spotify-shaped metadata provider credentials (optional: orchestrator
    /// degrades to local-only resolution when absent)
    pub spotify: Option<SpotifyConfig>,

    /// Last.fm-shaped stats/similarity provider credentials (optional)
    pub lastfm: Option<LastfmConfig>,

    /// YouTube-shaped video provider credentials and quota policy
    pub youtube: YoutubeConfig,

    /// Chart scraping/matching schedule and window
    pub chart: ChartConfig,

    /// Local storage roots (logs, downloads)
    pub storage: StorageConfig,

    /// Environment mode (development, staging, production)
    pub environment: Environment,

    /// Log level (from RUST_LOG or LOG_LEVEL)
    pub log_level: String,
}

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl CommonConfig {
    /// Load common configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            spotify: SpotifyConfig::from_env().ok(),
            lastfm: LastfmConfig::from_env().ok(),
            youtube: YoutubeConfig::from_env()?,
            chart: ChartConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            environment: Environment::from_str(
                &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            ),
            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Check if the Spotify-shaped provider is configured
    pub fn has_spotify(&self) -> bool {
        self.spotify.is_some()
    }

    /// Check if the Last.fm-shaped provider is configured
    pub fn has_lastfm(&self) -> bool {
        self.lastfm.is_some()
    }
}

/// Helper function to get a required environment variable
pub fn get_required_env(name: &str) -> ConfigResult<String> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Helper function to get an optional environment variable with a default
pub fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

/// Helper function to parse a comma-separated list of strings
pub fn parse_env_list(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|s| {
        s.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str("production"), Environment::Production);
        assert_eq!(Environment::from_str("prod"), Environment::Production);
        assert_eq!(Environment::from_str("staging"), Environment::Staging);
        assert_eq!(Environment::from_str("stage"), Environment::Staging);
        assert_eq!(Environment::from_str("development"), Environment::Development);
        assert_eq!(Environment::from_str("dev"), Environment::Development);
        assert_eq!(Environment::from_str("anything"), Environment::Development);
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(format!("{}", Environment::Production), "production");
        assert_eq!(format!("{}", Environment::Staging), "staging");
        assert_eq!(format!("{}", Environment::Development), "development");
    }

    #[test]
    fn test_environment_checks() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Production.is_development());
        assert!(Environment::Development.is_development());
        assert!(!Environment::Development.is_production());
    }

    #[test]
    fn test_parse_env_list() {
        temp_env::with_var("SHARED_CONFIG_TEST_LIST", Some("a, b ,c"), || {
            assert_eq!(
                parse_env_list("SHARED_CONFIG_TEST_LIST"),
                Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
            );
        });
        temp_env::with_var_unset("SHARED_CONFIG_TEST_LIST_UNSET", || {
            assert_eq!(parse_env_list("SHARED_CONFIG_TEST_LIST_UNSET"), None);
        });
    }
}
