//! Background Loops (C8, §4.8): six independent cooperative tasks, each an
//! outer loop with an explicit sleep and a cooperative shutdown check,
//! generalized from the teacher's `JobRunner::run` select!+sleep+shutdown
//! shape (`apps/worker/src/jobs/mod.rs`) into one struct per loop instead
//! of one runner draining a shared queue.

pub mod chart_matcher;
pub mod chart_scraper;
pub mod daily_refresh;
pub mod genre_backfill;
pub mod library_refresh;
pub mod youtube_prefetch;
