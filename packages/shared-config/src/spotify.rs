//! Spotify-shaped metadata provider configuration

use crate::{get_required_env, ConfigResult};

/// Client credentials for the Spotify-shaped metadata provider
#[derive(Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl SpotifyConfig {
    /// Load from `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET`.
    ///
    /// Returns an error if either is missing; callers treat an `Err` here
    /// as "Spotify-shaped enrichment is not configured" rather than a fatal
    /// startup failure.
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            client_id: get_required_env("SPOTIFY_CLIENT_ID")?,
            client_secret: get_required_env("SPOTIFY_CLIENT_SECRET")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_errors() {
        temp_env::with_vars_unset(["SPOTIFY_CLIENT_ID", "SPOTIFY_CLIENT_SECRET"], || {
            assert!(SpotifyConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = SpotifyConfig {
            client_id: "abc123".to_string(),
            client_secret: "super-secret".to_string(),
        };
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("abc123"));
        assert!(!debug_str.contains("super-secret"));
    }
}
