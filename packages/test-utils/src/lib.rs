//! Shared test utilities for the Resonance workspace.
//!
//! Provides `wiremock`-backed doubles for the three external providers
//! (Spotify-shaped metadata, Last.fm-shaped stats/similarity,
//! YouTube-shaped video search) so `apps/api` and `apps/worker` integration
//! tests never need live network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use resonance_test_utils::MockSpotifyServer;
//!
//! #[tokio::test]
//! async fn test_with_mock() {
//!     let spotify = MockSpotifyServer::start().await;
//!     spotify.mock_token_exchange().await;
//!     spotify.mock_search_artists("gorillaz", &[("1", "Gorillaz")]).await;
//!     // point a SpotifyClient at spotify.url()
//! }
//! ```

mod lastfm;
mod spotify;
mod youtube;

pub use lastfm::MockLastfmServer;
pub use spotify::MockSpotifyServer;
pub use youtube::MockYoutubeServer;
