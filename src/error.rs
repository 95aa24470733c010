//! Error types and handling.

use reqwest::StatusCode;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// No HTTP response was received (connect failure, timeout, proxy)
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Backend rejected the bearer token
    #[error("Session expired, please log in again")]
    Unauthorized,

    /// Signed-in role may not perform the action
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Any other HTTP client failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored session is missing or unreadable
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Excel export error
    #[error("Export error: {0}")]
    Export(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a config error with message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a session error with message
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create a forbidden error with message
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Classify a reqwest failure that happened before a response arrived.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            return Self::Network(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::from_status(status, String::new());
        }
        if err.is_decode() {
            return Self::Network(format!("Malformed response: {err}"));
        }
        Self::Http(err)
    }

    /// Build an error from a non-success status and its raw body.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden(extract_message(&body).unwrap_or_else(|| "forbidden".to_string())),
            _ => Self::Server {
                status: status.as_u16(),
                message: extract_message(&body).unwrap_or_default(),
            },
        }
    }

    /// Build an error for a rejected sign-in.
    ///
    /// A 401 here means bad credentials, not an expired token.
    pub fn from_login_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Validation(
                extract_message(&body).unwrap_or_else(|| "Invalid username or password".to_string()),
            ),
            _ => Self::from_status(status, body),
        }
    }

    /// Whether the UI should drop back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Human-readable text for a toast notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Unable to reach the server. Check your connection and try again.".to_string(),
            Self::Server { status, message } if message.is_empty() => {
                format!("Server responded with status {status}")
            }
            Self::Server { status, message } => format!("Server error ({status}): {message}"),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::Forbidden(msg) => format!("Access denied: {msg}"),
            Self::Validation(msg) => msg.clone(),
            other => format!("An error occurred: {other}"),
        }
    }
}

/// Pull a human message out of a backend error body.
///
/// Accepts `{"message": ..}` or `{"error": ..}`; anything else is returned trimmed.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["message", "error", "detail"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return Some(msg.to_string());
            }
        }
    }

    Some(trimmed.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_status() {
        let err = AppError::from_status(StatusCode::UNAUTHORIZED, String::new());
        assert!(err.requires_login());
    }

    #[test]
    fn test_login_rejection_is_not_expiry() {
        let err = AppError::from_login_status(StatusCode::UNAUTHORIZED, r#"{"error":"Bad credentials"}"#.to_string());
        assert!(!err.requires_login());
        assert_eq!(err.user_message(), "Bad credentials");

        let err = AppError::from_login_status(StatusCode::INTERNAL_SERVER_ERROR, String::new());
        assert!(matches!(err, AppError::Server { status: 500, .. }));
    }

    #[test]
    fn test_server_message_from_json_body() {
        let err = AppError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Email already registered"}"#.to_string(),
        );
        match err {
            AppError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Email already registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_server_message_from_error_field() {
        let err = AppError::from_status(StatusCode::CONFLICT, r#"{"error":"Duplicate"}"#.to_string());
        assert_eq!(err.user_message(), "Server error (409): Duplicate");
    }

    #[test]
    fn test_server_message_plain_text() {
        let err = AppError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom\n".to_string());
        assert_eq!(err.user_message(), "Server error (500): boom");
    }

    #[test]
    fn test_server_without_body() {
        let err = AppError::from_status(StatusCode::NOT_FOUND, String::new());
        assert_eq!(err.user_message(), "Server responded with status 404");
    }

    #[test]
    fn test_forbidden_status() {
        let err = AppError::from_status(StatusCode::FORBIDDEN, String::new());
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(!err.requires_login());
    }

    #[test]
    fn test_network_message() {
        let err = AppError::Network("connection refused".to_string());
        assert!(err.user_message().starts_with("Unable to reach the server"));
    }

    #[test]
    fn test_validation_message_passthrough() {
        let err = AppError::validation("Reason is required");
        assert_eq!(err.user_message(), "Reason is required");
    }
}
