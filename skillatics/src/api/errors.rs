//! API gateway error types.

use crate::auth::AuthError;
use thiserror::Error;

/// Failures of a backend call, as seen by the page that made it
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset, etc.
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Backend answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Endpoint requires a token and none is stored
    #[error("Not logged in")]
    NotAuthenticated,

    /// Input rejected before anything was sent
    #[error("{0}")]
    Validation(String),

    /// Session store failure while applying a response
    #[error(transparent)]
    Session(#[from] AuthError),
}

impl ApiError {
    /// Build a status error, preferring the backend's `{"error": ".."}` text
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                ["error", "message", "msg"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
            })
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<'))
                    .then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| default_reason(status).to_string());

        ApiError::Status { status, message }
    }

    /// Whether an idempotent request may be sent again
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text rendered inline as `Error: <message>`
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Network(_) => "Could not reach the server".to_string(),
            ApiError::Timeout => "The server took too long to respond".to_string(),
            ApiError::Decode(_) => "Unexpected response from the server".to_string(),
            ApiError::NotAuthenticated => "Please log in again".to_string(),
            ApiError::Validation(message) => message.clone(),
            ApiError::Session(e) => e.client_message(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

fn default_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not found",
        409 => "Conflict",
        429 => "Too many requests",
        500..=599 => "Server error",
        _ => "Request failed",
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_uses_backend_error_field() {
        let err = ApiError::from_status(404, r#"{"error": "No questions available"}"#);
        assert_eq!(err.user_message(), "No questions available");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_status_falls_back_to_reason() {
        let err = ApiError::from_status(503, "<html>bad gateway</html>");
        assert_eq!(err.user_message(), "Server error");
    }

    #[test]
    fn test_status_plain_text_body() {
        let err = ApiError::from_status(400, "Missing fields");
        assert_eq!(err.user_message(), "Missing fields");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::Network("reset".to_string()).is_retryable());
        assert!(ApiError::from_status(502, "").is_retryable());
        assert!(ApiError::from_status(429, "").is_retryable());
        assert!(!ApiError::from_status(400, "").is_retryable());
        assert!(!ApiError::from_status(404, "").is_retryable());
        assert!(!ApiError::Validation("bad".to_string()).is_retryable());
        assert!(!ApiError::NotAuthenticated.is_retryable());
    }
}
