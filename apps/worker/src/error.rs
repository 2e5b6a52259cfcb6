//! Background loop error taxonomy (§7).
//!
//! Wraps `resonance_catalog_core::CoreError` plus the variants that only
//! make sense inside a loop iteration (cancellation on shutdown, chart
//! scrape failures against the external collaborator).

use resonance_catalog_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The loop's shutdown signal fired mid-iteration; the iteration was
    /// abandoned rather than left half-applied.
    #[error("loop cancelled: {0}")]
    LoopCancelled(&'static str),

    /// The chart-scraping collaborator failed to return entries for a
    /// chart/date pair.
    #[error("chart scrape failed for {chart} ({date}): {reason}")]
    ChartScrapeFailed { chart: String, date: String, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WorkerError {
    pub fn chart_scrape_failed(
        chart: impl Into<String>,
        date: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ChartScrapeFailed { chart: chart.into(), date: date.into(), reason: reason.into() }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Core(core) => core.is_retryable(),
            Self::ChartScrapeFailed { .. } => true,
            Self::LoopCancelled(_) | Self::Configuration(_) | Self::Internal(_) => false,
        }
    }

    /// Logs at a severity matching the error's impact (§7 propagation policy).
    pub fn log(&self) {
        match self {
            Self::Core(core) => match core.severity() {
                resonance_catalog_core::CoreErrorSeverity::Error => {
                    tracing::error!(error = %self, "loop iteration failed")
                }
                resonance_catalog_core::CoreErrorSeverity::Warning => {
                    tracing::warn!(error = %self, "loop iteration degraded")
                }
                resonance_catalog_core::CoreErrorSeverity::Info => {
                    tracing::info!(error = %self, "loop iteration skipped")
                }
            },
            Self::LoopCancelled(_) => tracing::info!(error = %self, "loop shutting down"),
            Self::ChartScrapeFailed { .. } => tracing::warn!(error = %self, "chart scrape failed"),
            Self::Configuration(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "unexpected worker error")
            }
        }
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_not_found_is_not_retryable() {
        let err = WorkerError::Core(CoreError::NotFound { resource_type: "artist", id: "1".into() });
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_chart_scrape_failed_is_retryable() {
        let err = WorkerError::chart_scrape_failed("hot-100", "2026-07-25", "connection reset");
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "chart scrape failed for hot-100 (2026-07-25): connection reset"
        );
    }

    #[test]
    fn test_loop_cancelled_not_retryable() {
        assert!(!WorkerError::LoopCancelled("daily_refresh").is_retryable());
    }
}
