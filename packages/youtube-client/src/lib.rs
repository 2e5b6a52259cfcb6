//! YouTube-shaped video provider client for Resonance
//!
//! A rotating ring of API keys, a shared rate-limiter, and calendar-day
//! quota tracking anchored at a configurable local hour (§4.2, §4.7).
//!
//! # Environment Variables
//!
//! - `YOUTUBE_API_KEY`, `YOUTUBE_API_KEY_2`, `YOUTUBE_API_KEYS`: key ring
//! - `YOUTUBE_QUOTA_RESET_HOUR`, `YOUTUBE_MIN_INTERVAL_SECONDS`: policy

mod client;
mod error;
mod models;

pub use client::YoutubeClient;
pub use error::{YoutubeError, YoutubeResult};
pub use models::{Thumbnail, Thumbnails, Video};
