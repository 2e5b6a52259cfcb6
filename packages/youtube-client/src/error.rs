//! YouTube-shaped video provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum YoutubeError {
    /// No API key configured in the ring (§4.7: resolver should fall back
    /// to the command-line extractor instead of surfacing this).
    #[error("no YouTube API key is configured")]
    NoApiKey,

    /// Every key in the ring is exhausted for the current calendar day.
    #[error("YouTube API ring exhausted until next quota anchor")]
    RingExhausted,

    /// Invalid input to an API method
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("failed to parse YouTube response: {0}")]
    Parse(#[from] serde_json::Error),

    /// `403 quotaExceeded` / `429`, scoped to the key that was used
    #[error("quota exceeded for current API key")]
    QuotaExceeded,

    /// Requested resource does not exist (404 / empty result)
    #[error("not found: {0}")]
    NotFound(String),

    /// API returned an error outside the above shapes
    #[error("YouTube API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request to YouTube timed out")]
    Timeout,
}

impl YoutubeError {
    pub fn is_retryable(&self) -> bool {
        match self {
            YoutubeError::Timeout => true,
            YoutubeError::Http(e) => {
                e.is_timeout() || e.is_connect() || matches!(e.status(), Some(s) if s.is_server_error())
            }
            _ => false,
        }
    }
}

pub type YoutubeResult<T> = Result<T, YoutubeError>;
