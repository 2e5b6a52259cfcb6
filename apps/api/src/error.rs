//! Request-path error taxonomy (§7).
//!
//! Wraps `resonance_catalog_core::CoreError` plus a handful of variants that
//! only make sense at the HTTP boundary (bad query params, missing auth
//! headers for provider-facing endpoints, body parsing).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use resonance_catalog_core::CoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("invalid query parameter {name}: {reason}")]
    InvalidQueryParam { name: &'static str, reason: String },

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("upstream provider unavailable: {0}")]
    ServiceBusy(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid_query_param(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidQueryParam { name, reason: reason.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Core(core) => match core {
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
                CoreError::ProtectedDeletion { .. } => StatusCode::CONFLICT,
                CoreError::QuotaExhausted(_) | CoreError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                CoreError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
                CoreError::Database(_) | CoreError::Io(_) | CoreError::Serialization(_) | CoreError::Internal { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::InvalidQueryParam { .. } | Self::InvalidBody(_) | Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::ServiceBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Core(core) => match core {
                CoreError::NotFound { .. } => "not_found",
                CoreError::Validation { .. } => "validation_error",
                CoreError::ProtectedDeletion { .. } => "protected_deletion",
                CoreError::QuotaExhausted(_) => "quota_exhausted",
                CoreError::RateLimited { .. } => "rate_limited",
                CoreError::Transient(_) => "transient_error",
                CoreError::Database(_) => "database_error",
                CoreError::Io(_) => "io_error",
                CoreError::Serialization(_) => "serialization_error",
                CoreError::Internal { .. } => "internal_error",
            },
            Self::InvalidQueryParam { .. } => "invalid_query_param",
            Self::InvalidBody(_) => "invalid_body",
            Self::MissingField(_) => "missing_field",
            Self::ServiceBusy(_) => "service_busy",
            Self::Configuration(_) => "configuration_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Logs at a severity matching the error's impact (§7 propagation policy).
    pub fn log(&self) {
        match self {
            Self::Core(core) => match core.severity() {
                resonance_catalog_core::CoreErrorSeverity::Error => {
                    tracing::error!(error = %self, "request failed")
                }
                resonance_catalog_core::CoreErrorSeverity::Warning => {
                    tracing::warn!(error = %self, "request degraded")
                }
                resonance_catalog_core::CoreErrorSeverity::Info => {
                    tracing::info!(error = %self, "request rejected")
                }
            },
            Self::InvalidQueryParam { .. } | Self::InvalidBody(_) | Self::MissingField(_) => {
                tracing::info!(error = %self, "bad request")
            }
            Self::ServiceBusy(_) => tracing::warn!(error = %self, "upstream busy"),
            Self::Configuration(_) | Self::Internal(_) => tracing::error!(error = %self, "unexpected error"),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let body = ErrorBody { error: self.error_code(), message: self.to_string() };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::Core(CoreError::NotFound { resource_type: "artist", id: "1".into() });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "not_found");
    }

    #[test]
    fn test_quota_exhausted_maps_to_429() {
        let err = ApiError::Core(CoreError::QuotaExhausted("youtube".into()));
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_invalid_query_param_maps_to_400() {
        let err = ApiError::invalid_query_param("limit", "must be positive");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "invalid_query_param");
    }
}
