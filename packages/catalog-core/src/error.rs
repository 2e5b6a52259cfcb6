//! Error taxonomy for the catalog core (§7).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Requested entity does not exist locally.
    #[error("{resource_type} not found: {id}")]
    NotFound { resource_type: &'static str, id: String },

    /// A provider reported its quota/daily budget is exhausted; retrying
    /// before the quota window rolls over is pointless (§4.2, §7).
    #[error("provider quota exhausted: {0}")]
    QuotaExhausted(String),

    /// A provider asked the caller to back off for a known duration.
    #[error("rate limited, retry after {cooldown_secs}s")]
    RateLimited { cooldown_secs: u64 },

    /// A transient failure (network blip, 5xx, timeout) worth retrying.
    #[error("transient error: {0}")]
    Transient(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Caller-supplied data failed a structural invariant.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Deletion refused because a favorite still references the row (§4.4).
    #[error("protected deletion: {reason}")]
    ProtectedDeletion { reason: String },

    /// A store-level failure that survived the writer's single retry (§4.4).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else, not expected to be handled specially by a caller.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    pub fn protected_deletion(resource_type: &'static str, id: i64) -> Self {
        Self::ProtectedDeletion {
            reason: format!("cannot delete {resource_type} {id}: referenced by a favorite"),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether a caller should expect a retry to succeed (§7 propagation
    /// policy: background loops retry these, request handlers degrade).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::QuotaExhausted(_) | Self::RateLimited { .. } | Self::Transient(_) | Self::Database(_)
        )
    }

    pub fn severity(&self) -> CoreErrorSeverity {
        match self {
            Self::Database(_) | Self::Internal { .. } => CoreErrorSeverity::Error,
            Self::QuotaExhausted(_) | Self::RateLimited { .. } | Self::Transient(_) => CoreErrorSeverity::Warning,
            Self::NotFound { .. } | Self::Validation { .. } | Self::ProtectedDeletion { .. } => {
                CoreErrorSeverity::Info
            }
            Self::Io(_) | Self::Serialization(_) => CoreErrorSeverity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorSeverity {
    Error,
    Warning,
    Info,
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exhausted_is_retryable() {
        assert!(CoreError::QuotaExhausted("youtube".into()).is_retryable());
    }

    #[test]
    fn test_validation_is_not_retryable() {
        assert!(!CoreError::validation("bad input").is_retryable());
    }

    #[test]
    fn test_protected_deletion_message() {
        let err = CoreError::protected_deletion("track", 42);
        assert!(err.to_string().contains("track 42"));
    }
}
