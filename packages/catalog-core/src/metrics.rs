//! Search resolution metrics and fallback activity counters (C11, §4.11).
//! Grounded on `app/core/search_metrics.py`: in-memory per-category,
//! per-user counters guarded by a single lock, with a `"global"` bucket
//! alongside the per-user ones.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

const GLOBAL_KEY: &str = "global";
const ANON_KEY: &str = "anon";

#[derive(Debug, Default, Serialize, Clone)]
pub struct ResolutionCounters {
    /// Keyed by user id (or `"anon"`), plus a `"global"` aggregate entry.
    counts: HashMap<String, u64>,
}

impl ResolutionCounters {
    fn record(&mut self, user_id: Option<&str>) {
        let key = user_id.unwrap_or(ANON_KEY).to_string();
        *self.counts.entry(key).or_insert(0) += 1;
        *self.counts.entry(GLOBAL_KEY.to_string()).or_insert(0) += 1;
    }

    pub fn global(&self) -> u64 {
        self.counts.get(GLOBAL_KEY).copied().unwrap_or(0)
    }

    pub fn for_user(&self, user_id: &str) -> u64 {
        self.counts.get(user_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct MetricsSnapshot {
    pub local: ResolutionCounters,
    pub external: ResolutionCounters,
    /// Provider request counts for the current calendar-day window, keyed
    /// by provider name.
    pub provider_requests_today: HashMap<String, u64>,
    pub fallback_invocations: u64,
}

struct Inner {
    local: ResolutionCounters,
    external: ResolutionCounters,
    provider_requests: HashMap<String, (chrono::NaiveDate, u64)>,
    fallback_invocations: u64,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            local: ResolutionCounters::default(),
            external: ResolutionCounters::default(),
            provider_requests: HashMap::new(),
            fallback_invocations: 0,
        }
    }
}

/// Process-wide search/provider activity counters (§4.11, §5 "request
/// counters" shared resource). Exposed via `GET /search/metrics` and
/// mirrored into `tracing` events at `info` level on each increment, since
/// this crate prefers structured logs over a separate metrics scrape
/// surface.
pub struct SearchMetrics {
    inner: Mutex<Inner>,
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }

    /// Call when a search is resolved purely from local data (§4.9 step 2).
    pub async fn record_local_resolution(&self, user_id: Option<&str>) {
        let mut inner = self.inner.lock().await;
        inner.local.record(user_id);
        tracing::info!(user_id, metric = "local_resolution", "search resolved locally");
    }

    /// Call when a search falls through to external provider fanout
    /// (§4.9 step 3).
    pub async fn record_external_resolution(&self, user_id: Option<&str>) {
        let mut inner = self.inner.lock().await;
        inner.external.record(user_id);
        tracing::info!(user_id, metric = "external_resolution", "search resolved externally");
    }

    /// Increments today's request counter for `provider`, resetting the
    /// count when the calendar day has rolled over.
    pub async fn record_provider_request(&self, provider: &str) {
        let today = Utc::now().date_naive();
        let mut inner = self.inner.lock().await;
        let entry = inner
            .provider_requests
            .entry(provider.to_string())
            .or_insert((today, 0));
        if entry.0 != today {
            *entry = (today, 0);
        }
        entry.1 += 1;
        tracing::info!(provider, count = entry.1, metric = "provider_request", "provider request recorded");
    }

    /// Call each time the YouTube Link Resolver's CLI-style fallback path
    /// is invoked (§4.7, §4.11).
    pub async fn record_fallback_invocation(&self) {
        let mut inner = self.inner.lock().await;
        inner.fallback_invocations += 1;
        tracing::info!(
            count = inner.fallback_invocations,
            metric = "fallback_invocation",
            "fallback invocation recorded"
        );
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().await;
        let today = Utc::now().date_naive();
        let provider_requests_today = inner
            .provider_requests
            .iter()
            .filter(|(_, (date, _))| *date == today)
            .map(|(provider, (_, count))| (provider.clone(), *count))
            .collect();
        MetricsSnapshot {
            local: ResolutionCounters { counts: inner.local.counts.clone() },
            external: ResolutionCounters { counts: inner.external.counts.clone() },
            provider_requests_today,
            fallback_invocations: inner.fallback_invocations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_resolution_increments_global_and_user() {
        let metrics = SearchMetrics::new();
        metrics.record_local_resolution(Some("42")).await;
        metrics.record_local_resolution(None).await;
        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.local.global(), 2);
        assert_eq!(snapshot.local.for_user("42"), 1);
        assert_eq!(snapshot.local.for_user(ANON_KEY), 1);
    }

    #[tokio::test]
    async fn test_external_resolution_independent_of_local() {
        let metrics = SearchMetrics::new();
        metrics.record_local_resolution(None).await;
        metrics.record_external_resolution(None).await;
        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.local.global(), 1);
        assert_eq!(snapshot.external.global(), 1);
    }

    #[tokio::test]
    async fn test_provider_request_counter_accumulates() {
        let metrics = SearchMetrics::new();
        metrics.record_provider_request("spotify").await;
        metrics.record_provider_request("spotify").await;
        metrics.record_provider_request("lastfm").await;
        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.provider_requests_today.get("spotify"), Some(&2));
        assert_eq!(snapshot.provider_requests_today.get("lastfm"), Some(&1));
    }

    #[tokio::test]
    async fn test_fallback_invocations_counted() {
        let metrics = SearchMetrics::new();
        metrics.record_fallback_invocation().await;
        metrics.record_fallback_invocation().await;
        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.fallback_invocations, 2);
    }
}
