//! Spotify-shaped metadata provider client
//!
//! Implements the token-acquisition, error-classification and pagination
//! shape described in §4.2: a client-credentials token cached until its TTL
//! and re-acquired lazily on first use or on a 401; no hard rate-limit floor,
//! instead honoring the provider's own `Retry-After` back-off on 429/403.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::error::{SpotifyError, SpotifyResult};
use crate::models::{
    Album, AlbumGroup, AlbumTracksResponse, ApiErrorEnvelope, Artist, ArtistAlbumsResponse,
    RecommendationsResponse, SearchArtistsResponse, SearchTracksResponse, TokenResponse, Track,
};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 8;
const MAX_PAGES: u32 = 20;

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Spotify-shaped metadata provider client.
///
/// Holds its own token cache behind a mutex so it can be constructed once at
/// startup (as part of `AppContext`) and shared by reference across the
/// request path and the background loops (§9: no global mutable clients).
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    client_id: String,
    client_secret: String,
    token: Arc<Mutex<Option<CachedToken>>>,
    token_url: String,
    api_base: String,
}

impl std::fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl SpotifyClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> SpotifyResult<Self> {
        Self::with_base_urls(client_id, client_secret, TOKEN_URL, API_BASE)
    }

    /// Same as [`new`](Self::new) but pointed at arbitrary token/API
    /// endpoints, used to wire a [`resonance_test_utils::MockSpotifyServer`]
    /// into integration tests.
    pub fn with_base_urls(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> SpotifyResult<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(SpotifyError::MissingCredentials);
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent("Resonance/1.0")
            .build()?;
        Ok(Self {
            http,
            client_id,
            client_secret,
            token: Arc::new(Mutex::new(None)),
            token_url: token_url.into(),
            api_base: api_base.into(),
        })
    }

    /// Returns a valid bearer token, acquiring or refreshing it as needed.
    async fn access_token(&self) -> SpotifyResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }
        let fresh = self.fetch_token().await?;
        let token = fresh.access_token.clone();
        *guard = Some(CachedToken {
            access_token: fresh.access_token,
            // Refresh a little before the provider-declared TTL expires.
            expires_at: Instant::now() + Duration::from_secs(fresh.expires_in.saturating_sub(30)),
        });
        Ok(token)
    }

    /// Forces a re-acquisition on the next call (after an observed 401).
    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn fetch_token(&self) -> SpotifyResult<TokenResponse> {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let basic = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .http
            .post(&self.token_url)
            .header("Authorization", format!("Basic {basic}"))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| if e.is_timeout() { SpotifyError::Timeout } else { e.into() })?;

        if !response.status().is_success() {
            return Err(SpotifyError::Unauthorized);
        }
        Ok(response.json::<TokenResponse>().await?)
    }

    /// Issues a GET and retries once after a fresh token on 401, per §4.2.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> SpotifyResult<String> {
        let mut attempted_refresh = false;
        loop {
            let token = self.access_token().await?;
            let response = self
                .http
                .get(format!("{}{path}", self.api_base))
                .bearer_auth(&token)
                .query(query)
                .send()
                .await
                .map_err(|e| if e.is_timeout() { SpotifyError::Timeout } else { SpotifyError::Http(e) })?;

            match response.status() {
                StatusCode::UNAUTHORIZED if !attempted_refresh => {
                    attempted_refresh = true;
                    self.invalidate_token().await;
                    continue;
                }
                StatusCode::NOT_FOUND => return Err(SpotifyError::NotFound(path.to_string())),
                StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => {
                    let retry_after = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok());
                    return Err(SpotifyError::QuotaExceeded { retry_after_secs: retry_after });
                }
                status if !status.is_success() => {
                    let text = response.text().await.unwrap_or_default();
                    if let Ok(env) = serde_json::from_str::<ApiErrorEnvelope>(&text) {
                        return Err(SpotifyError::Api {
                            status: env.error.status,
                            message: env.error.message,
                        });
                    }
                    return Err(SpotifyError::Api {
                        status: status.as_u16(),
                        message: text,
                    });
                }
                _ => return Ok(response.text().await?),
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn search_artists(&self, q: &str, limit: u32) -> SpotifyResult<Vec<Artist>> {
        if q.trim().is_empty() {
            return Err(SpotifyError::InvalidInput("query cannot be empty".into()));
        }
        let body = self
            .get(
                "/search",
                &[
                    ("q", q.to_string()),
                    ("type", "artist".to_string()),
                    ("limit", limit.min(50).to_string()),
                ],
            )
            .await?;
        let parsed: SearchArtistsResponse = serde_json::from_str(&body)?;
        Ok(parsed.artists.items)
    }

    #[instrument(skip(self))]
    pub async fn get_artist(&self, id: &str) -> SpotifyResult<Option<Artist>> {
        match self.get(&format!("/artists/{id}"), &[]).await {
            Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
            Err(SpotifyError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetches albums for an artist, optionally walking every page (§4.2,
    /// §4.6 `fetch_all=true`).
    #[instrument(skip(self))]
    pub async fn get_artist_albums(
        &self,
        id: &str,
        groups: &[AlbumGroup],
        fetch_all: bool,
    ) -> SpotifyResult<Vec<Album>> {
        let include_groups = groups
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let mut out = Vec::new();
        let mut offset = 0u32;
        let page_size = 50u32;
        for page in 0..MAX_PAGES {
            let body = self
                .get(
                    &format!("/artists/{id}/albums"),
                    &[
                        ("include_groups", include_groups.clone()),
                        ("limit", page_size.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;
            let parsed: ArtistAlbumsResponse = serde_json::from_str(&body)?;
            let got = parsed.items.len() as u32;
            out.extend(parsed.items);
            if !fetch_all || parsed.next.is_none() || got < page_size {
                break;
            }
            offset += page_size;
            if page + 1 == MAX_PAGES {
                warn!(artist = %id, "artist album pagination hit the safety cap");
            }
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn get_album(&self, id: &str) -> SpotifyResult<Option<Album>> {
        match self.get(&format!("/albums/{id}"), &[]).await {
            Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
            Err(SpotifyError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_album_tracks(&self, id: &str) -> SpotifyResult<Vec<Track>> {
        let mut out = Vec::new();
        let mut offset = 0u32;
        let page_size = 50u32;
        for page in 0..MAX_PAGES {
            let body = self
                .get(
                    &format!("/albums/{id}/tracks"),
                    &[("limit", page_size.to_string()), ("offset", offset.to_string())],
                )
                .await?;
            let parsed: AlbumTracksResponse = serde_json::from_str(&body)?;
            let got = parsed.items.len() as u32;
            out.extend(parsed.items);
            if parsed.next.is_none() || got < page_size {
                break;
            }
            offset += page_size;
            if page + 1 == MAX_PAGES {
                warn!(album = %id, "album track pagination hit the safety cap");
            }
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn search_tracks(&self, q: &str, limit: u32) -> SpotifyResult<Vec<Track>> {
        if q.trim().is_empty() {
            return Err(SpotifyError::InvalidInput("query cannot be empty".into()));
        }
        let body = self
            .get(
                "/search",
                &[
                    ("q", q.to_string()),
                    ("type", "track".to_string()),
                    ("limit", limit.min(50).to_string()),
                ],
            )
            .await?;
        let parsed: SearchTracksResponse = serde_json::from_str(&body)?;
        debug!(query = %q, hits = parsed.tracks.items.len(), "spotify track search");
        Ok(parsed.tracks.items)
    }

    /// Seeded recommendations, used by opportunistic enrichment when a
    /// similarity provider is unavailable. Seeds are comma-joined per the
    /// upstream API's convention.
    #[instrument(skip(self))]
    pub async fn get_recommendations(
        &self,
        seed_artists: &[String],
        seed_tracks: &[String],
        limit: u32,
    ) -> SpotifyResult<Vec<Track>> {
        if seed_artists.is_empty() && seed_tracks.is_empty() {
            return Err(SpotifyError::InvalidInput(
                "at least one seed artist or track is required".into(),
            ));
        }
        let mut query: Vec<(&str, String)> = vec![("limit", limit.min(100).to_string())];
        if !seed_artists.is_empty() {
            query.push(("seed_artists", seed_artists.join(",")));
        }
        if !seed_tracks.is_empty() {
            query.push(("seed_tracks", seed_tracks.join(",")));
        }
        let body = self.get("/recommendations", &query).await?;
        let parsed: RecommendationsResponse = serde_json::from_str(&body)?;
        Ok(parsed.tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_credentials() {
        let result = SpotifyClient::new("", "");
        assert!(matches!(result, Err(SpotifyError::MissingCredentials)));
    }

    #[test]
    fn test_accepts_valid_credentials() {
        assert!(SpotifyClient::new("id", "secret").is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let client = SpotifyClient::new("abc123", "super-secret").unwrap();
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("abc123"));
        assert!(!debug_str.contains("super-secret"));
    }

    #[test]
    fn test_album_group_strings() {
        assert_eq!(AlbumGroup::Album.as_str(), "album");
        assert_eq!(AlbumGroup::Single.as_str(), "single");
        assert_eq!(AlbumGroup::Compilation.as_str(), "compilation");
        assert_eq!(AlbumGroup::discography_default().len(), 3);
    }
}
