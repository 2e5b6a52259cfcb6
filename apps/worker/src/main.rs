//! Resonance background worker: the six Background Loops (C8, §4.8) that
//! keep the local catalog fresh without any request in flight — Daily
//! Refresh, Genre Backfill, Library Refresh, YouTube Prefetch, Chart
//! Scraper and Chart Matcher.

use std::time::Duration;

use anyhow::Result;
use resonance_catalog_core::{CatalogWriter, ChartMatcher, EntityStore, FreshnessManager, LibraryExpander, YoutubeLinkResolver};
use resonance_lastfm_client::LastfmClient;
use resonance_spotify_client::SpotifyClient;
use resonance_youtube_client::YoutubeClient;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod loops;

use config::Config;
use loops::chart_matcher::ChartMatcherLoop;
use loops::chart_scraper::ChartScraperLoop;
use loops::daily_refresh::DailyRefreshLoop;
use loops::genre_backfill::GenreBackfillLoop;
use loops::library_refresh::LibraryRefreshLoop;
use loops::youtube_prefetch::YoutubePrefetchLoop;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resonance_worker=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    tracing::info!("starting resonance-worker");

    let config = Config::from_env()?;

    if !config.common.has_spotify() {
        anyhow::bail!("SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET are required: every background loop syncs against the Spotify-shaped metadata provider");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.common.database.max_connections)
        .min_connections(config.common.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.common.database.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.common.database.idle_timeout_secs))
        .connect(&config.common.database.url)
        .await?;
    tracing::info!("connected to postgres");

    let store = EntityStore::new(pool);
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
    let freshness = FreshnessManager::new(store.clone(), writer.clone(), spotify, lastfm.clone());
    let matcher = ChartMatcher::new(store.clone());
    let resolver = YoutubeLinkResolver::new(
        youtube,
        writer,
        store.clone(),
        None,
        config.common.youtube.ytdlp_fallback_enabled,
        config.common.youtube.ytdlp_daily_limit,
        config.common.youtube.ytdlp_min_interval_seconds,
        config.common.storage.fallback_log_path(),
        config.common.storage.log_retention_days,
        None,
    );

    // No HTML chart parser is wired in: scraping a real Billboard-shaped
    // site is an external collaborator out of scope for this crate
    // (spec.md §1). The scraper loop still runs so the matcher keeps
    // re-joining rows a deployment might load by hand.
    let chart_scraper: Option<std::sync::Arc<dyn resonance_catalog_core::ChartScraper>> = None;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let daily_refresh = DailyRefreshLoop::new(
        store.clone(),
        expander,
        freshness.clone(),
        config.daily_refresh_interval_hours,
        shutdown_tx.subscribe(),
    );
    let genre_backfill = GenreBackfillLoop::new(
        store.clone(),
        lastfm,
        config.genre_backfill_interval_hours,
        config.genre_backfill_batch_size,
        config.genre_backfill_top_n,
        shutdown_tx.subscribe(),
    );
    let library_refresh = LibraryRefreshLoop::new(
        store.clone(),
        freshness,
        config.library_refresh_interval_hours,
        config.library_refresh_batch_size,
        shutdown_tx.subscribe(),
    );
    let youtube_prefetch = YoutubePrefetchLoop::new(
        store.clone(),
        resolver,
        config.youtube_prefetch_interval_minutes,
        config.youtube_prefetch_batch_size,
        shutdown_tx.subscribe(),
    );
    let chart_scraper_loop = ChartScraperLoop::new(
        store,
        matcher.clone(),
        chart_scraper,
        config.chart_names.clone(),
        config.common.chart.clone(),
        shutdown_tx.subscribe(),
    );
    let chart_matcher_loop = ChartMatcherLoop::new(
        matcher,
        config.chart_names,
        config.common.chart.match_refresh_interval_hours,
        shutdown_tx.subscribe(),
    );

    let handles = vec![
        tokio::spawn(daily_refresh.run()),
        tokio::spawn(genre_backfill.run()),
        tokio::spawn(library_refresh.run()),
        tokio::spawn(youtube_prefetch.run()),
        tokio::spawn(chart_scraper_loop.run()),
        tokio::spawn(chart_matcher_loop.run()),
    ];

    tracing::info!("worker running, press Ctrl+C to shut down");
    shutdown_signal().await;
    tracing::info!("shutdown signal received, stopping loops");

    let _ = shutdown_tx.send(());

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "background loop task panicked");
        }
    }

    tracing::info!("worker shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
