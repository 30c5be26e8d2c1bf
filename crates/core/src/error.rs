//! Error types for Gleaner operations.
//!
//! This module defines the main error type [`GleanerError`]. Most of the
//! retrieval path never surfaces these to callers: a failed strategy records
//! its error and the pipeline moves on, and a total failure is turned into
//! synthetic content. Errors do surface from URL validation, from reading
//! local input, and from the format converters.
//!
//! # Example
//!
//! ```rust
//! use gleaner_core::{GleanerError, Result};
//!
//! fn non_empty(body: &str) -> Result<&str> {
//!     if body.trim().is_empty() {
//!         return Err(GleanerError::EmptyBody);
//!     }
//!     Ok(body)
//! }
//! # assert!(non_empty("").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for retrieval, extraction and conversion.
#[derive(Error, Debug)]
pub enum GleanerError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when a strategy exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a URL cannot be parsed or does not use http/https.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    /// The response body was empty or whitespace only.
    #[error("Response body was empty")]
    EmptyBody,

    /// A relay answered, but its envelope could not be unwrapped.
    #[error("Relay {relay} returned an unusable payload: {reason}")]
    RelayPayload { relay: String, reason: String },

    /// A payload was fetched but failed validation.
    #[error("Payload rejected: {0}")]
    Rejected(String),

    /// HTML parsing errors.
    ///
    /// Returned when HTML cannot be parsed or a CSS selector is invalid.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// No content could be extracted from the document.
    #[error("No content could be extracted from the document")]
    NoContent,

    /// File not found.
    ///
    /// Returned when attempting to read a file that doesn't exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File I/O errors.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// An output format name was not recognized.
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    /// The paginated layout could not be produced.
    #[error("Layout failed: {0}")]
    Layout(String),

    /// A record or layout could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for GleanerError.
///
/// This is a convenience alias for `std::result::Result<T, GleanerError>`.
pub type Result<T> = std::result::Result<T, GleanerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GleanerError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_http_status_error() {
        let err = GleanerError::HttpStatus { status: 403 };
        assert_eq!(err.to_string(), "HTTP 403");
    }

    #[test]
    fn test_timeout_error() {
        let err = GleanerError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_relay_payload_error_names_relay() {
        let err = GleanerError::RelayPayload { relay: "allorigins".to_string(), reason: "missing contents".to_string() };
        let message = err.to_string();
        assert!(message.contains("allorigins"));
        assert!(message.contains("missing contents"));
    }
}
