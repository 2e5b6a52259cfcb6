//! YouTube-shaped video provider client
//!
//! Implements the rotating API-key ring, the per-client rate-limiter mutex,
//! and the quota/error classification described in §4.2 and §4.7: a 403
//! `quotaExceeded`/`dailyLimitExceeded` (or bare 429) rotates to the next
//! configured key; when the ring is exhausted the client stays disabled
//! until the next calendar-day anchor.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{YoutubeError, YoutubeResult};
use crate::models::{ApiErrorEnvelope, SearchListResponse, Video, VideosListResponse};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const DEFAULT_TIMEOUT_SECS: u64 = 8;

struct RingState {
    /// Index of the key currently in use.
    current: usize,
    /// Keys marked exhausted for the current quota window, by index.
    exhausted: Vec<bool>,
    /// The calendar-day anchor this exhaustion state applies to.
    window_started_at: DateTime<Utc>,
}

struct RateLimiterState {
    last_request_at: Option<Instant>,
}

/// YouTube-shaped video provider client: shares a key ring, a rate-limiter
/// mutex, and request counters process-wide (§5, §9) rather than relying on
/// a singleton.
#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    api_base: String,
    api_keys: Vec<String>,
    quota_reset_hour: u32,
    min_interval: Duration,
    ring: Arc<Mutex<RingState>>,
    limiter: Arc<Mutex<RateLimiterState>>,
}

impl std::fmt::Debug for YoutubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeClient")
            .field("api_key_count", &self.api_keys.len())
            .field("quota_reset_hour", &self.quota_reset_hour)
            .field("min_interval", &self.min_interval)
            .finish()
    }
}

impl YoutubeClient {
    pub fn new(api_keys: Vec<String>, quota_reset_hour: u32, min_interval_seconds: f64) -> YoutubeResult<Self> {
        Self::with_base_url(api_keys, quota_reset_hour, min_interval_seconds, API_BASE)
    }

    pub fn with_base_url(
        api_keys: Vec<String>,
        quota_reset_hour: u32,
        min_interval_seconds: f64,
        api_base: impl Into<String>,
    ) -> YoutubeResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent("Resonance/1.0")
            .build()?;
        let exhausted = vec![false; api_keys.len()];
        Ok(Self {
            http,
            api_base: api_base.into(),
            api_keys,
            quota_reset_hour,
            min_interval: Duration::from_secs_f64(min_interval_seconds.max(0.0)),
            ring: Arc::new(Mutex::new(RingState {
                current: 0,
                exhausted,
                window_started_at: Self::current_window_anchor(quota_reset_hour),
            })),
            limiter: Arc::new(Mutex::new(RateLimiterState { last_request_at: None })),
        })
    }

    fn current_window_anchor(reset_hour: u32) -> DateTime<Utc> {
        let now = Utc::now();
        let today_anchor = now
            .date_naive()
            .and_hms_opt(reset_hour.min(23), 0, 0)
            .unwrap()
            .and_utc();
        if now.hour() as u32 >= reset_hour.min(23) {
            today_anchor
        } else {
            today_anchor - chrono::Duration::days(1)
        }
    }

    /// Rolls the exhaustion state over if the quota anchor has passed, and
    /// marks every key usable again (§4.7: "disabled until the next anchor").
    async fn roll_window_if_needed(&self) {
        let mut ring = self.ring.lock().await;
        let current_anchor = Self::current_window_anchor(self.quota_reset_hour);
        if current_anchor > ring.window_started_at {
            ring.window_started_at = current_anchor;
            ring.exhausted.iter_mut().for_each(|e| *e = false);
            ring.current = 0;
            info!("YouTube API quota window rolled over");
        }
    }

    /// Waits out the minimum inter-request interval for this client.
    async fn throttle(&self) {
        let mut limiter = self.limiter.lock().await;
        if let Some(last) = limiter.last_request_at {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        limiter.last_request_at = Some(Instant::now());
    }

    /// Returns the next usable key, or `None` if the whole ring is exhausted.
    async fn next_usable_key(&self) -> Option<(usize, String)> {
        self.roll_window_if_needed().await;
        let ring = self.ring.lock().await;
        if self.api_keys.is_empty() {
            return None;
        }
        (0..self.api_keys.len())
            .map(|offset| (ring.current + offset) % self.api_keys.len())
            .find(|idx| !ring.exhausted[*idx])
            .map(|idx| (idx, self.api_keys[idx].clone()))
    }

    async fn mark_exhausted(&self, idx: usize) {
        let mut ring = self.ring.lock().await;
        if idx < ring.exhausted.len() {
            ring.exhausted[idx] = true;
        }
        ring.current = (idx + 1) % self.api_keys.len().max(1);
    }

    /// Whether the ring has any key left, without consuming one.
    pub async fn has_capacity(&self) -> bool {
        self.next_usable_key().await.is_some()
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> YoutubeResult<String> {
        if self.api_keys.is_empty() {
            return Err(YoutubeError::NoApiKey);
        }
        loop {
            let Some((idx, key)) = self.next_usable_key().await else {
                return Err(YoutubeError::RingExhausted);
            };
            self.throttle().await;

            let mut full_query: Vec<(&str, String)> = query.to_vec();
            full_query.push(("key", key));

            let response = self
                .http
                .get(format!("{}{path}", self.api_base))
                .query(&full_query)
                .send()
                .await
                .map_err(|e| if e.is_timeout() { YoutubeError::Timeout } else { YoutubeError::Http(e) })?;

            match response.status() {
                StatusCode::OK => return Ok(response.text().await?),
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                    let text = response.text().await.unwrap_or_default();
                    let is_quota = serde_json::from_str::<ApiErrorEnvelope>(&text)
                        .map(|e| e.is_quota_error())
                        .unwrap_or(true);
                    if is_quota {
                        warn!(key_index = idx, "YouTube API key hit quota, rotating");
                        self.mark_exhausted(idx).await;
                        continue;
                    }
                    return Err(YoutubeError::Api { status: 403, message: text });
                }
                StatusCode::NOT_FOUND => return Err(YoutubeError::NotFound(path.to_string())),
                status => {
                    let text = response.text().await.unwrap_or_default();
                    return Err(YoutubeError::Api { status: status.as_u16(), message: text });
                }
            }
        }
    }

    /// Low-level search primitive: one `search.list` call for one query
    /// string. The resolver (C7) composes up to three of these per track.
    pub async fn search(&self, query: &str, max_results: u32) -> YoutubeResult<Vec<Video>> {
        if query.trim().is_empty() {
            return Err(YoutubeError::InvalidInput("query cannot be empty".into()));
        }
        let body = self
            .get(
                "/search",
                &[
                    ("part", "snippet".to_string()),
                    ("q", query.to_string()),
                    ("type", "video".to_string()),
                    ("videoCategoryId", "10".to_string()), // Music
                    ("maxResults", max_results.clamp(1, 50).to_string()),
                ],
            )
            .await?;
        let parsed: SearchListResponse = serde_json::from_str(&body)?;
        let videos = parsed
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(Video {
                    video_id,
                    title: item.snippet.title,
                    channel_title: item.snippet.channel_title,
                    description: item.snippet.description,
                    published_at: item.snippet.published_at,
                    thumbnails: item.snippet.thumbnails,
                })
            })
            .collect();
        debug!(query = %query, "youtube search.list completed");
        Ok(videos)
    }

    /// Convenience wrapper over [`Self::search`] building a single query from
    /// the track identity (§4.2's named operation). The resolver's
    /// multi-query fallback ladder (§4.7) calls [`Self::search`] directly.
    pub async fn search_music_videos(
        &self,
        artist: &str,
        track: &str,
        album: Option<&str>,
        max_results: u32,
    ) -> YoutubeResult<Vec<Video>> {
        let mut query = format!("{artist} {track}");
        if let Some(album) = album {
            query.push(' ');
            query.push_str(album);
        }
        query.push_str(" official video");
        self.search(&query, max_results).await
    }

    pub async fn get_video_details(&self, video_id: &str) -> YoutubeResult<Option<Video>> {
        let body = self
            .get("/videos", &[("part", "snippet".to_string()), ("id", video_id.to_string())])
            .await?;
        let parsed: VideosListResponse = serde_json::from_str(&body)?;
        Ok(parsed.items.into_iter().next().map(|item| Video {
            video_id: item.id,
            title: item.snippet.title,
            channel_title: item.snippet.channel_title,
            description: item.snippet.description,
            published_at: item.snippet.published_at,
            thumbnails: item.snippet.thumbnails,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_keys_configured() {
        let client = YoutubeClient::new(vec![], 4, 5.0).unwrap();
        let result = client.search("test", 5).await;
        assert!(matches!(result, Err(YoutubeError::NoApiKey)));
    }

    #[tokio::test]
    async fn test_ring_rotation_on_exhaustion() {
        let client = YoutubeClient::new(vec!["key-a".into(), "key-b".into()], 4, 0.0).unwrap();
        assert!(client.has_capacity().await);
        client.mark_exhausted(0).await;
        let (idx, key) = client.next_usable_key().await.unwrap();
        assert_eq!(idx, 1);
        assert_eq!(key, "key-b");
        client.mark_exhausted(1).await;
        assert!(!client.has_capacity().await);
    }

    #[test]
    fn test_empty_query_rejected() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let client = YoutubeClient::new(vec!["k".into()], 4, 0.0).unwrap();
        let result = rt.block_on(client.search("   ", 5));
        assert!(matches!(result, Err(YoutubeError::InvalidInput(_))));
    }
}
