use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Fixed body returned when the selected backend cannot be reached.
pub const SERVICE_UNAVAILABLE_BODY: &str = "Service Unavailable";

/// Fixed body returned for unmatched routes.
pub const NOT_FOUND_BODY: &str = "Not Found";

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Upstream Errors
///
/// Transport failures are split by cause so they can be logged and counted
/// separately, but every one of them surfaces to the caller as the same
/// `503 Service Unavailable`:
///
/// - `UpstreamUnavailable` - connect, DNS, TLS or reset failures
/// - `UpstreamTimeout` - the exchange exceeded the configured deadline
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Upstream {target} unavailable: {reason}")]
    UpstreamUnavailable { target: String, reason: String },

    #[error("Upstream {target} timed out after {elapsed_ms}ms")]
    UpstreamTimeout { target: String, elapsed_ms: u128 },

    #[error("Invalid backend target: {0}")]
    InvalidTarget(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Short label used for the `kind` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UpstreamUnavailable { .. } => "connect",
            AppError::UpstreamTimeout { .. } => "timeout",
            AppError::InvalidTarget(_) => "invalid_target",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
            AppError::ConfigError(_) => "config",
        }
    }

    /// Whether this error came from talking to a backend.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamUnavailable { .. } | AppError::UpstreamTimeout { .. }
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Clients only get fixed bodies. Upstream failures are logged by the
        // gateway handler, which knows the original path.
        let (status, body) = match &self {
            AppError::UpstreamUnavailable { .. } | AppError::UpstreamTimeout { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, SERVICE_UNAVAILABLE_BODY)
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, NOT_FOUND_BODY),
            AppError::InvalidTarget(_) | AppError::Internal(_) | AppError::ConfigError(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        (
            status,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
