use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use resonance_catalog_core::{CatalogWriter, EntityStore, LibraryExpander, SearchMetrics, YoutubeLinkResolver};
use resonance_lastfm_client::LastfmClient;
use resonance_spotify_client::SpotifyClient;
use resonance_youtube_client::YoutubeClient;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod routes;
mod services;

pub use error::{ApiError, ApiResult};

use routes::charts::charts_router;
use routes::health::{health_router, HealthState};
use routes::search::search_router;
use routes::youtube::youtube_router;
use routes::AppState;
use services::{Orchestrator, PersistQueue};

/// Builds the CORS layer from configuration (§6.5 `CORS_ALLOWED_ORIGINS`).
///
/// In production mode, no configured origins means CORS requests are
/// rejected outright rather than falling back to something permissive.
fn build_cors_layer(config: &config::Config) -> CorsLayer {
    let is_production = config.is_production();

    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!(origin, "invalid CORS origin, skipping");
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("no valid CORS origins configured, CORS requests will be rejected");
                CorsLayer::new()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
                    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
                    .allow_credentials(true)
                    .max_age(Duration::from_secs(3600))
            }
        }
        _ if is_production => {
            tracing::warn!("CORS_ALLOWED_ORIGINS not configured in production mode, rejecting cross-origin requests");
            CorsLayer::new()
        }
        _ => {
            tracing::warn!("using permissive CORS in development mode");
            CorsLayer::permissive()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "resonance_api=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;
    tracing::info!(port = config.port, environment = %config.environment(), "starting resonance-api");

    if !config.common.has_spotify() {
        anyhow::bail!("SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET are required: the search orchestrator's local-first resolution always has an external Spotify-shaped fallback");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.common.database.max_connections)
        .min_connections(config.common.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.common.database.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.common.database.idle_timeout_secs))
        .connect(&config.common.database.url)
        .await?;
    tracing::info!("database connection established");

    let store = EntityStore::new(pool.clone());
    let writer = CatalogWriter::new(store.clone());

    let spotify_config = config.common.spotify.as_ref().expect("checked above");
    let spotify = SpotifyClient::new(spotify_config.client_id.clone(), spotify_config.client_secret.clone())?;
    let lastfm = config.common.lastfm.as_ref().map(|c| LastfmClient::new(c.api_key.clone())).transpose()?;
    let youtube = YoutubeClient::new(
        config.common.youtube.api_keys.clone(),
        config.common.youtube.quota_reset_hour,
        config.common.youtube.min_interval_seconds,
    )?;

    let expander = LibraryExpander::new(writer.clone(), spotify.clone(), lastfm.clone());
    let metrics = Arc::new(SearchMetrics::new());
    let resolver = Arc::new(YoutubeLinkResolver::new(
        youtube,
        writer.clone(),
        store.clone(),
        None,
        config.common.youtube.ytdlp_fallback_enabled,
        config.common.youtube.ytdlp_daily_limit,
        config.common.youtube.ytdlp_min_interval_seconds,
        config.common.storage.fallback_log_path(),
        config.common.storage.log_retention_days,
        Some(metrics.clone()),
    ));

    let persist_queue = PersistQueue::spawn(writer.clone(), expander, 256, 8);
    let orchestrator =
        Arc::new(Orchestrator::new(store.clone(), spotify, lastfm, persist_queue, metrics.clone()));

    let app_state = AppState {
        store,
        writer,
        orchestrator,
        resolver,
        metrics,
        prefetching_albums: Arc::new(Mutex::new(HashSet::new())),
    };

    let health_state = HealthState { pool };
    let cors_layer = build_cors_layer(&config);

    let app = Router::new()
        .route("/", get(root))
        .nest("/health", health_router(health_state))
        .nest("/search", search_router(app_state.clone()))
        .nest("/youtube", youtube_router(app_state.clone()))
        .nest("/tracks", charts_router(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> &'static str {
    "Resonance API"
}
