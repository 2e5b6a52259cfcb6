//! Spotify-shaped metadata provider client for Resonance
//!
//! Client-credentials token exchange, artist/album/track lookups and
//! search, normalized to the provider contract in spec §6.2.
//!
//! # Environment Variables
//!
//! - `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET`: credentials (required)

mod client;
mod error;
mod models;

pub use client::SpotifyClient;
pub use error::{SpotifyError, SpotifyResult};
pub use models::{Album, AlbumGroup, Artist, ExternalUrls, Followers, Image, Track};
