//! Last.fm-shaped stats/similarity provider configuration

use crate::{get_required_env, ConfigResult};

/// Credentials for the Last.fm-shaped stats/similarity provider
#[derive(Clone)]
pub struct LastfmConfig {
    pub api_key: String,
}

impl std::fmt::Debug for LastfmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LastfmConfig")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl LastfmConfig {
    /// Load from `LASTFM_API_KEY`.
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            api_key: get_required_env("LASTFM_API_KEY")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_errors() {
        temp_env::with_var_unset("LASTFM_API_KEY", || {
            assert!(LastfmConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = LastfmConfig {
            api_key: "secret".to_string(),
        };
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
