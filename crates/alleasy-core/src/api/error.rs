use serde::Deserialize;
use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Credentials rejected (status {status}): {message}")]
    AuthRejected { status: u16, message: String },

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Server error (status {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Failure payload the demo API sends alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Prefer the `{"error": "..."}` message over the raw body
    fn message_from_body(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::message_from_body(body);
        match status.as_u16() {
            code @ (400 | 401) => ApiError::AuthRejected {
                status: code,
                message,
            },
            404 => ApiError::NotFound(message),
            code => ApiError::ServerError {
                status: code,
                message,
            },
        }
    }

    /// HTTP status carried by the failure, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthRejected { status, .. } | ApiError::ServerError { status, .. } => {
                Some(*status)
            }
            ApiError::NotFound(_) => Some(404),
            ApiError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidResponse(_) => None,
        }
    }

    /// True when the server rejected the bearer token (session expired)
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::AuthRejected { .. } => ErrorKind::AuthRejected,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            // A 2xx body we cannot parse is the server's fault, not the network's
            ApiError::ServerError { .. } | ApiError::InvalidResponse(_) => ErrorKind::Server,
            ApiError::NetworkError(_) => ErrorKind::Network,
        }
    }

    /// Text suitable for showing to the person at the keyboard
    pub fn user_message(&self) -> String {
        match self {
            ApiError::AuthRejected { .. } => "Invalid email or password".to_string(),
            ApiError::NotFound(_) => "User not found. Check the email address.".to_string(),
            ApiError::ServerError { status, .. } => format!("Server error: {}", status),
            ApiError::InvalidResponse(_) => "Unexpected response from server".to_string(),
            ApiError::NetworkError(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to reach the server. Check your connection.".to_string()
            }
        }
    }
}
