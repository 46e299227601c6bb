//! Error types for the record store client.
//!
//! # Design
//! The store treats every variant the same way: the failure becomes the
//! session-wide error message and any optimistic change is reverted. The
//! variants exist so the message says where the request went wrong.

use thiserror::Error;

/// Errors returned by `RecordClient` build and parse methods.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-2xx status. `message` is the status
    /// text as received, or `HTTP <status>` when the server sent none.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    /// The host could not complete the round trip at all.
    #[error("{0}")]
    Transport(String),

    /// The response body could not be decoded into the expected records.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Build a `RequestFailed` from a status line, falling back to the code
    /// when the reason phrase is empty (HTTP/2 responses carry none).
    pub fn request_failed(status: u16, status_text: &str) -> Self {
        let message = if status_text.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            status_text.to_string()
        };
        ApiError::RequestFailed { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_surfaces_status_text_verbatim() {
        let err = ApiError::request_failed(422, "Unprocessable Entity");
        assert_eq!(err.to_string(), "Unprocessable Entity");
    }

    #[test]
    fn request_failed_without_status_text_uses_code() {
        let err = ApiError::request_failed(503, "");
        assert_eq!(err.to_string(), "HTTP 503");
    }

    #[test]
    fn transport_error_displays_message() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "connection refused");
    }
}
