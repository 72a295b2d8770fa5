//! Error types for the ZLMediaKit API client.

use thiserror::Error;

use crate::envelope::Envelope;

/// Errors returned by [`ZlmClient`](crate::ZlmClient) and the endpoint catalog.
///
/// Every failure is surfaced to the immediate caller; nothing is retried
/// or logged above `debug` level inside the library.
#[derive(Error, Debug)]
pub enum Error {
    /// Client configuration is missing or invalid.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The process-wide client was requested before it was initialized.
    #[error("ZLMediaKit client is not configured; call global::init first")]
    NotConfigured,

    /// The HTTP request could not be constructed.
    #[error("failed to build HTTP request: {0}")]
    BuildRequest(#[source] reqwest::Error),

    /// The request parameters could not be serialized.
    #[error("failed to serialize request parameters: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Connection, TLS, timeout, or body read failure.
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The caller's cancellation token fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The caller's deadline passed before the response arrived.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The server answered with a status outside `200..300`.
    #[error("API request failed (HTTP {status}): {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body is not a valid envelope.
    #[error("failed to decode API response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope decoded but reported `code != 0`.
    ///
    /// The decoded envelope is kept so callers can still inspect `data`.
    #[error("API returned error: code={}, message={}", .0.code, .0.message())]
    Api(Box<Envelope>),
}

impl Error {
    /// Returns the decoded envelope of a logical API error.
    #[must_use]
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Self::Api(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Consumes the error, returning the envelope of a logical API error.
    #[must_use]
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            Self::Api(envelope) => Some(*envelope),
            _ => None,
        }
    }

    /// Returns the envelope `code` of a logical API error.
    #[must_use]
    pub fn api_code(&self) -> Option<i64> {
        self.envelope().map(|e| e.code)
    }

    /// Returns the HTTP status of a non-2xx response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the configured transport timeout fired.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Result type for ZLMediaKit API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_api_error_display_contains_code_and_message() {
        // Arrange
        let envelope = Envelope::decode_unchecked(br#"{"code":-100,"msg":"Incorrect secret"}"#)
            .unwrap();

        // Act
        let err = Error::Api(Box::new(envelope));

        // Assert
        let text = err.to_string();
        assert!(text.contains("code=-100"));
        assert!(text.contains("Incorrect secret"));
        assert_eq!(err.api_code(), Some(-100));
    }

    #[test]
    fn test_http_status_error_display() {
        // Arrange & Act
        let err = Error::HttpStatus {
            status: 500,
            body: String::from("boom"),
        };

        // Assert
        assert_eq!(err.to_string(), "API request failed (HTTP 500): boom");
        assert_eq!(err.status(), Some(500));
        assert!(err.envelope().is_none());
    }

    #[test]
    fn test_into_envelope_only_for_api_errors() {
        // Arrange
        let envelope = Envelope::decode_unchecked(br#"{"code":1,"data":{"k":"v"}}"#).unwrap();

        // Act
        let api = Error::Api(Box::new(envelope)).into_envelope();
        let other = Error::Cancelled.into_envelope();

        // Assert
        assert_eq!(api.unwrap().code, 1);
        assert!(other.is_none());
    }
}
