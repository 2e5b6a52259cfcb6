//! API server configuration (§6.5).

use std::env;

use anyhow::{Context, Result};
use resonance_shared_config::{CommonConfig, DatabaseConfig, Environment};

/// API server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with `resonance-worker`.
    pub common: CommonConfig,

    /// Server port (default: 8080).
    pub port: u16,

    /// CORS allowed origins; `None` falls back to the environment-aware
    /// default in `build_cors_layer`.
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env().map_err(|e| anyhow::anyhow!("failed to load config: {e}"))?;

        Ok(Self {
            common,

            port: env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().context("invalid PORT value")?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok().map(|s| {
                s.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
            }),
        })
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.common.database
    }

    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}
