//! YouTube Link Resolver (C7, §4.7): per-track search against the
//! YouTube-shaped API client, scored with a noise-token-aware overlap
//! heuristic, with quota/cooldown handling, an in-process search cache, and
//! a command-line-extractor fallback. Grounded on `app/core/youtube.py`.
//!
//! The raw audio downloader is an external collaborator (the *Media
//! Fetcher*, spec.md §1): this module only depends on it through the
//! [`MediaFetcher`] trait, never spawning a process itself.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use resonance_youtube_client::{Video, YoutubeClient, YoutubeError};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{instrument, warn};

use crate::error::{CoreError, CoreResult};
use crate::lru::TtlCache;
use crate::metrics::SearchMetrics;
use crate::models::{YoutubeLink, YoutubeLinkStatus};
use crate::store::EntityStore;
use crate::text;
use crate::writer::CatalogWriter;

/// Noise tokens stripped before scoring a candidate title (§4.7, ported
/// verbatim from `app/core/youtube.py::_noise_tokens`).
const NOISE_TOKENS: &[&str] = &[
    "official", "video", "music", "audio", "lyric", "lyrics", "letra", "letras", "hd", "hq", "4k", "remastered",
    "live", "visualizer", "visualiser", "feat", "ft", "featuring", "album", "full", "version", "clip", "mv", "tv",
    "radio", "mix", "remix", "edit", "sub", "español", "spanish", "english", "officially", "topic", "records",
    "record",
];

const COOLDOWN_ERROR_HOURS: i64 = 12;
const COOLDOWN_NOT_FOUND_DAYS: i64 = 7;
const TRACK_TOKEN_RATIO_THRESHOLD: f64 = 0.6;
const FUZZY_TITLE_THRESHOLD: f64 = 0.6;
const CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
const CACHE_CAPACITY: usize = 2000;
const DEFAULT_MAX_RESULTS: u32 = 5;
const LOG_PRUNE_INTERVAL_HOURS: i64 = 6;

/// The raw audio downloader is out of scope for this crate (spec.md §1);
/// callers supply an implementation. `search_fallback` is the command-line
/// extractor's "search mode" used when the API-key ring is exhausted or
/// disabled (§4.7); `download` backs the completed-link transition.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn search_fallback(&self, artist: &str, track: &str, album: Option<&str>) -> CoreResult<Option<Video>>;

    async fn download(&self, video_id: &str) -> CoreResult<(PathBuf, i64)>;
}

#[derive(Clone, Eq, PartialEq, Hash)]
struct SearchCacheKey {
    artist_lower: String,
    track_lower: String,
    album_lower: String,
    max_results: u32,
}

#[derive(Serialize)]
struct FallbackLogEvent {
    ts: String,
    source: &'static str,
    artist: String,
    track: String,
    album: Option<String>,
    outcome: String,
}

struct FallbackState {
    last_invoked_at: Option<tokio::time::Instant>,
    window_started_at: NaiveDate,
    count_today: u32,
    last_pruned_at: Option<chrono::NaiveDateTime>,
}

pub struct YoutubeLinkResolver {
    client: YoutubeClient,
    writer: CatalogWriter,
    store: EntityStore,
    cache: TtlCache<SearchCacheKey, Vec<Video>>,
    media_fetcher: Option<Arc<dyn MediaFetcher>>,
    fallback_enabled: bool,
    fallback_daily_limit: u32,
    fallback_min_interval: Duration,
    fallback_log_path: PathBuf,
    log_retention_days: i64,
    fallback_state: AsyncMutex<FallbackState>,
    metrics: Option<Arc<SearchMetrics>>,
}

impl YoutubeLinkResolver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: YoutubeClient,
        writer: CatalogWriter,
        store: EntityStore,
        media_fetcher: Option<Arc<dyn MediaFetcher>>,
        fallback_enabled: bool,
        fallback_daily_limit: u32,
        fallback_min_interval_seconds: f64,
        fallback_log_path: PathBuf,
        log_retention_days: i64,
        metrics: Option<Arc<SearchMetrics>>,
    ) -> Self {
        Self {
            client,
            writer,
            store,
            cache: TtlCache::new(CACHE_TTL, CACHE_CAPACITY),
            media_fetcher,
            fallback_enabled,
            fallback_daily_limit,
            fallback_min_interval: Duration::from_secs_f64(fallback_min_interval_seconds.max(0.0)),
            fallback_log_path,
            log_retention_days,
            fallback_state: AsyncMutex::new(FallbackState {
                last_invoked_at: None,
                window_started_at: Utc::now().date_naive(),
                count_today: 0,
                last_pruned_at: None,
            }),
            metrics,
        }
    }

    /// Whether a link needs (re-)resolution: no row yet, or an `error`/
    /// `missing` (stored form of `video_not_found`, §3) row whose cooldown
    /// has elapsed (§4.7). Used by both this resolver and the prefetch loop.
    pub fn needs_resolution(link: Option<&YoutubeLink>) -> bool {
        let Some(link) = link else { return true };
        match link.status {
            YoutubeLinkStatus::LinkFound | YoutubeLinkStatus::Completed => false,
            YoutubeLinkStatus::Error => {
                Utc::now().naive_utc() - link.updated_at >= chrono::Duration::hours(COOLDOWN_ERROR_HOURS)
            }
            YoutubeLinkStatus::Missing | YoutubeLinkStatus::VideoNotFound => {
                Utc::now().naive_utc() - link.updated_at >= chrono::Duration::days(COOLDOWN_NOT_FOUND_DAYS)
            }
            YoutubeLinkStatus::Pending => true,
        }
    }

    /// Resolves one track's YouTube link, following the state machine in
    /// §4.7: cache → up-to-three-query search ladder → scoring → CLI
    /// fallback → `video_not_found`/`error`.
    #[instrument(skip(self))]
    pub async fn resolve_track(
        &self,
        track_provider_id: &str,
        artist: &str,
        track: &str,
        album: Option<&str>,
    ) -> CoreResult<YoutubeLink> {
        let existing = self.store.youtube_links.find_by_track_provider_id(track_provider_id).await?;
        if !Self::needs_resolution(existing.as_ref()) {
            return Ok(existing.expect("needs_resolution false implies a row exists"));
        }

        let max_results = DEFAULT_MAX_RESULTS;
        let cache_key = SearchCacheKey {
            artist_lower: artist.to_lowercase(),
            track_lower: track.to_lowercase(),
            album_lower: album.unwrap_or("").to_lowercase(),
            max_results,
        };

        let (candidates, quota_hit) = match self.cache.get(&cache_key).await {
            Some(videos) => (videos, false),
            None => {
                let (videos, quota_hit) = self.search_ladder(artist, track, album, max_results).await;
                if !quota_hit {
                    self.cache.put(cache_key, videos.clone()).await;
                }
                (videos, quota_hit)
            }
        };

        if quota_hit {
            return self
                .writer
                .save_youtube_link(
                    track_provider_id,
                    None,
                    None,
                    YoutubeLinkStatus::Error,
                    None,
                    Some("youtube api quota exhausted"),
                )
                .await;
        }

        let best = candidates
            .iter()
            .filter_map(|v| candidate_passes(v, artist, track).map(|score| (score, v)))
            .max_by(|a, b| a.0.total_cmp(&b.0));

        if let Some((_, video)) = best {
            return self
                .writer
                .save_youtube_link(
                    track_provider_id,
                    Some(&video.video_id),
                    None,
                    YoutubeLinkStatus::LinkFound,
                    None,
                    None,
                )
                .await;
        }

        if self.fallback_enabled {
            if let Some(video) = self.try_fallback(artist, track, album).await {
                return self
                    .writer
                    .save_youtube_link(
                        track_provider_id,
                        Some(&video.video_id),
                        None,
                        YoutubeLinkStatus::LinkFound,
                        None,
                        None,
                    )
                    .await;
            }
        }

        self.writer
            .save_youtube_link(track_provider_id, None, None, YoutubeLinkStatus::VideoNotFound, None, None)
            .await
    }

    /// Runs through up to three query shapes in order, returning the first
    /// non-empty result set. Returns `quota_hit = true` if the ring reports
    /// exhaustion so the caller can record `error` rather than `video_not_found`.
    async fn search_ladder(&self, artist: &str, track: &str, album: Option<&str>, max_results: u32) -> (Vec<Video>, bool) {
        for query in build_queries(artist, track, album) {
            match self.client.search(&query, max_results).await {
                Ok(videos) if !videos.is_empty() => return (videos, false),
                Ok(_) => continue,
                Err(YoutubeError::RingExhausted | YoutubeError::NoApiKey) => return (Vec::new(), true),
                Err(e @ YoutubeError::Api { status: 403, .. }) => {
                    warn!(error = %e, "youtube search quota error");
                    return (Vec::new(), true);
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "youtube search failed");
                    continue;
                }
            }
        }
        (Vec::new(), false)
    }

    /// Command-line-extractor search mode (§4.7), rate-limited independently
    /// of the API client by its own daily counter and minimum interval.
    async fn try_fallback(&self, artist: &str, track: &str, album: Option<&str>) -> Option<Video> {
        let fetcher = self.media_fetcher.as_ref()?;

        if let Some(metrics) = &self.metrics {
            metrics.record_fallback_invocation().await;
        }

        {
            let mut state = self.fallback_state.lock().await;
            let today = Utc::now().date_naive();
            if state.window_started_at != today {
                state.window_started_at = today;
                state.count_today = 0;
            }
            if state.count_today >= self.fallback_daily_limit {
                return None;
            }
            if let Some(last) = state.last_invoked_at {
                let elapsed = last.elapsed();
                if elapsed < self.fallback_min_interval {
                    tokio::time::sleep(self.fallback_min_interval - elapsed).await;
                }
            }
            state.last_invoked_at = Some(tokio::time::Instant::now());
            state.count_today += 1;
        }

        let (result, outcome) = match fetcher.search_fallback(artist, track, album).await {
            Ok(Some(video)) => (Some(video), "found".to_string()),
            Ok(None) => (None, "not_found".to_string()),
            Err(e) => (None, format!("error: {e}")),
        };
        self.log_fallback_event(artist, track, album, &outcome).await;
        result
    }

    /// Completes a `link_found` row once the Media Fetcher has downloaded
    /// the file, transitioning the link to `completed` (§3, §4.4).
    #[instrument(skip(self))]
    pub async fn complete_download(&self, track_provider_id: &str, video_id: &str) -> CoreResult<YoutubeLink> {
        let fetcher = self
            .media_fetcher
            .as_ref()
            .ok_or_else(|| CoreError::internal("no media fetcher configured"))?;
        let (path, file_size) = fetcher.download(video_id).await?;
        self.writer
            .save_youtube_link(
                track_provider_id,
                Some(video_id),
                Some(&path.to_string_lossy()),
                YoutubeLinkStatus::Completed,
                Some(file_size),
                None,
            )
            .await
    }

    async fn log_fallback_event(&self, artist: &str, track: &str, album: Option<&str>, outcome: &str) {
        let event = FallbackLogEvent {
            ts: Utc::now().to_rfc3339(),
            source: "ytdlp_fallback",
            artist: artist.to_string(),
            track: track.to_string(),
            album: album.map(str::to_string),
            outcome: outcome.to_string(),
        };
        let Ok(line) = serde_json::to_string(&event) else { return };
        if let Some(parent) = self.fallback_log_path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        match tokio::fs::OpenOptions::new().create(true).append(true).open(&self.fallback_log_path).await {
            Ok(mut file) => {
                if let Err(e) = file.write_all(format!("{line}\n").as_bytes()).await {
                    warn!(error = %e, "failed to append fallback log entry");
                }
            }
            Err(e) => warn!(error = %e, "failed to open fallback log"),
        }
        self.maybe_prune_log().await;
    }

    /// Prunes the fallback log beyond the retention window, at most once
    /// every [`LOG_PRUNE_INTERVAL_HOURS`] (§6.4).
    async fn maybe_prune_log(&self) {
        let now = Utc::now().naive_utc();
        {
            let mut state = self.fallback_state.lock().await;
            if let Some(last) = state.last_pruned_at {
                if now - last < chrono::Duration::hours(LOG_PRUNE_INTERVAL_HOURS) {
                    return;
                }
            }
            state.last_pruned_at = Some(now);
        }

        let Ok(contents) = tokio::fs::read_to_string(&self.fallback_log_path).await else { return };
        let cutoff = now - chrono::Duration::days(self.log_retention_days);
        let kept: Vec<&str> = contents
            .lines()
            .filter(|line| {
                serde_json::from_str::<serde_json::Value>(line)
                    .ok()
                    .and_then(|v| v.get("ts").and_then(|t| t.as_str()).map(str::to_string))
                    .and_then(|ts| chrono::DateTime::parse_from_rfc3339(&ts).ok())
                    .map(|dt| dt.naive_utc() >= cutoff)
                    .unwrap_or(true)
            })
            .collect();
        let mut new_contents = kept.join("\n");
        if !new_contents.is_empty() {
            new_contents.push('\n');
        }
        if let Err(e) = tokio::fs::write(&self.fallback_log_path, new_contents).await {
            warn!(error = %e, "failed to prune fallback log");
        }
    }
}

/// Builds the up-to-three query ladder in priority order (§4.7).
fn build_queries(artist: &str, track: &str, album: Option<&str>) -> Vec<String> {
    let mut queries = Vec::with_capacity(3);
    if let Some(album) = album {
        queries.push(format!("{artist} {track} {album} official video"));
    }
    queries.push(format!("{artist} {track} official video"));
    queries.push(format!("{artist} {track}"));
    queries
}

fn noise_filtered_tokens(normalized: &str) -> HashSet<String> {
    normalized
        .split_whitespace()
        .map(str::to_string)
        .filter(|t| !NOISE_TOKENS.contains(&t.as_str()))
        .collect()
}

/// Whether a candidate passes the §4.7 threshold (`track_token_ratio >= 0.6`
/// or fuzzy title similarity `>= 0.6`), and if so its ranking score
/// (bonuses: contiguous phrase +30, "official" +10, "vevo" +8, music-channel
/// hint +6).
fn candidate_passes(video: &Video, artist: &str, track: &str) -> Option<f64> {
    let normalized_title = text::normalize(&video.title);
    let title_tokens = noise_filtered_tokens(&normalized_title);
    let query_tokens = noise_filtered_tokens(&text::normalize(&format!("{artist} {track}")));

    let track_token_ratio = if query_tokens.is_empty() {
        0.0
    } else {
        query_tokens.intersection(&title_tokens).count() as f64 / query_tokens.len() as f64
    };
    let fuzzy = text::score_against_alias(&text::normalize(track), &normalized_title);

    if track_token_ratio < TRACK_TOKEN_RATIO_THRESHOLD && fuzzy < FUZZY_TITLE_THRESHOLD {
        return None;
    }

    let mut score = track_token_ratio.max(fuzzy) * 100.0;
    let contiguous_phrase = format!("{} {}", text::normalize(artist), text::normalize(track));
    if !contiguous_phrase.trim().is_empty() && normalized_title.contains(contiguous_phrase.trim()) {
        score += 30.0;
    }
    let lower_title = video.title.to_lowercase();
    let lower_channel = video.channel_title.to_lowercase();
    if lower_title.contains("official") {
        score += 10.0;
    }
    if lower_title.contains("vevo") || lower_channel.contains("vevo") {
        score += 8.0;
    }
    if lower_channel.contains("music") || lower_channel.ends_with("- topic") || lower_channel.ends_with("topic") {
        score += 6.0;
    }
    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(title: &str, channel: &str) -> Video {
        Video { video_id: "abc123".into(), title: title.into(), channel_title: channel.into(), description: None, published_at: None, thumbnails: None }
    }

    #[test]
    fn test_build_queries_with_album() {
        let queries = build_queries("Gorillaz", "Clint Eastwood", Some("Gorillaz"));
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0], "Gorillaz Clint Eastwood Gorillaz official video");
        assert_eq!(queries[2], "Gorillaz Clint Eastwood");
    }

    #[test]
    fn test_build_queries_without_album() {
        let queries = build_queries("Gorillaz", "Clint Eastwood", None);
        assert_eq!(queries.len(), 2);
    }

    #[test]
    fn test_candidate_passes_on_strong_match() {
        let v = video("Gorillaz - Clint Eastwood (Official Video)", "GorillazVEVO");
        let score = candidate_passes(&v, "Gorillaz", "Clint Eastwood");
        assert!(score.is_some());
        assert!(score.unwrap() > 100.0);
    }

    #[test]
    fn test_candidate_rejected_on_unrelated_title() {
        let v = video("Some Completely Unrelated Song", "Random Channel");
        assert!(candidate_passes(&v, "Gorillaz", "Clint Eastwood").is_none());
    }

    #[test]
    fn test_needs_resolution_no_row() {
        assert!(YoutubeLinkResolver::needs_resolution(None));
    }

    #[test]
    fn test_needs_resolution_completed_row() {
        let link = YoutubeLink {
            id: 1,
            track_provider_id: "t1".into(),
            video_id: Some("abc".into()),
            download_path: Some("/data/abc.m4a".into()),
            status: YoutubeLinkStatus::Completed,
            file_size: Some(123),
            error_message: None,
            updated_at: Utc::now().naive_utc(),
        };
        assert!(!YoutubeLinkResolver::needs_resolution(Some(&link)));
    }

    #[test]
    fn test_needs_resolution_error_within_cooldown() {
        let link = YoutubeLink {
            id: 1,
            track_provider_id: "t1".into(),
            video_id: None,
            download_path: None,
            status: YoutubeLinkStatus::Error,
            file_size: None,
            error_message: Some("quota".into()),
            updated_at: Utc::now().naive_utc(),
        };
        assert!(!YoutubeLinkResolver::needs_resolution(Some(&link)));
    }

    #[test]
    fn test_needs_resolution_error_after_cooldown() {
        let link = YoutubeLink {
            id: 1,
            track_provider_id: "t1".into(),
            video_id: None,
            download_path: None,
            status: YoutubeLinkStatus::Error,
            file_size: None,
            error_message: Some("quota".into()),
            updated_at: Utc::now().naive_utc() - chrono::Duration::hours(13),
        };
        assert!(YoutubeLinkResolver::needs_resolution(Some(&link)));
    }
}
