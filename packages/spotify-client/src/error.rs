//! Spotify-shaped metadata provider error types

use thiserror::Error;

/// Spotify-shaped API client errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Client id/secret missing or rejected at the token endpoint
    #[error("client credentials are required for Spotify API access")]
    MissingCredentials,

    /// Invalid input provided to an API method
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("failed to parse Spotify response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Spotify returned a 401; caller should re-acquire a token and retry once
    #[error("Spotify access token rejected")]
    Unauthorized,

    /// Spotify returned a 403 with a quota-shaped body, or a bare 429
    #[error("Spotify quota or rate limit exceeded, retry after {retry_after_secs:?}s")]
    QuotaExceeded { retry_after_secs: Option<u64> },

    /// Requested resource does not exist (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Spotify returned an error payload outside the above shapes
    #[error("Spotify API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Request timed out
    #[error("request to Spotify timed out")]
    Timeout,
}

impl SpotifyError {
    /// Transient errors are worth a single retry after back-off (§4.2).
    pub fn is_retryable(&self) -> bool {
        match self {
            SpotifyError::Timeout => true,
            SpotifyError::Http(e) => {
                e.is_timeout() || e.is_connect() || matches!(e.status(), Some(s) if s.is_server_error())
            }
            _ => false,
        }
    }
}

pub type SpotifyResult<T> = Result<T, SpotifyError>;
