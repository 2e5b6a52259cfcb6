//! HTTP route handlers for the Resonance API (§6.3).

pub mod charts;
pub mod health;
pub mod search;
pub mod youtube;

use std::collections::HashSet;
use std::sync::Arc;

use resonance_catalog_core::{CatalogWriter, EntityStore, SearchMetrics, YoutubeLinkResolver};
use tokio::sync::Mutex;

use crate::services::Orchestrator;

/// Shared state for the `/search`, `/youtube` and `/tracks` routers. The
/// health router keeps its own narrower [`health::HealthState`] since it
/// only ever needs the pool.
#[derive(Clone)]
pub struct AppState {
    pub store: EntityStore,
    pub writer: CatalogWriter,
    pub orchestrator: Arc<Orchestrator>,
    pub resolver: Arc<YoutubeLinkResolver>,
    pub metrics: Arc<SearchMetrics>,
    /// Album ids with an in-flight `/youtube/album/{id}/prefetch` sweep, so
    /// a concurrent request reports `running` instead of duplicating work.
    pub prefetching_albums: Arc<Mutex<HashSet<i64>>>,
}
