//! Error types for the Instagram source
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Upstream Graph API failures are carried as [`ApiError`] so the retry
//! layer can classify them without string matching on display output.

use crate::retry::{classify, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The main error type for the Instagram source
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Upstream Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Graph API error: {0}")]
    Api(ApiError),

    #[error("Expected empty response: {0}")]
    ExpectedEmpty(ApiError),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: ApiError },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // Stream Errors
    // ============================================================================
    #[error("Stream '{stream}' is not available")]
    StreamNotFound { stream: String },

    #[error("Message invalid: {message}")]
    InvalidMessage { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a stream-not-found error
    pub fn stream_not_found(stream: impl Into<String>) -> Self {
        Self::StreamNotFound {
            stream: stream.into(),
        }
    }

    /// Create an invalid message error
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            message: message.into(),
        }
    }

    /// The upstream error behind this error, if any
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) | Error::ExpectedEmpty(e) => Some(e),
            Error::RetriesExhausted { last, .. } => Some(last),
            _ => None,
        }
    }

    /// Classify this error. Anything that did not come from the Graph API is fatal.
    pub fn verdict(&self) -> Verdict {
        match self {
            Error::Api(e) => classify(e),
            Error::ExpectedEmpty(_) => Verdict::ExpectedEmpty,
            _ => Verdict::Fatal,
        }
    }

    /// Check if this error is an expected-empty condition
    pub fn is_expected_empty(&self) -> bool {
        matches!(self, Error::ExpectedEmpty(_))
    }
}

/// Result type alias for the Instagram source
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

// ============================================================================
// Upstream Error
// ============================================================================

/// A failed Graph API call, as reported by the API
///
/// Mirrors the `{"error": {...}}` envelope the Graph API returns, plus the
/// HTTP status of the response. Transport failures (timeouts, refused
/// connections) are represented with no status and `is_transient` set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status of the failed response
    #[serde(default)]
    pub http_status: Option<u16>,

    /// Vendor error code (`error.code`)
    #[serde(default)]
    pub code: Option<i64>,

    /// Vendor error subcode (`error.error_subcode`)
    #[serde(default)]
    pub error_subcode: Option<i64>,

    /// Vendor error type (`error.type`), e.g. `OAuthException`
    #[serde(default)]
    pub error_type: Option<String>,

    /// Vendor transience flag (`error.is_transient`)
    #[serde(default)]
    pub is_transient: bool,

    /// Error message
    #[serde(default)]
    pub message: String,

    /// User-facing title, present on some insight errors
    #[serde(default)]
    pub error_user_title: Option<String>,

    /// Trace id for support requests
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

/// Raw `error` object of a Graph API error body
#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    error_subcode: Option<i64>,
    #[serde(default)]
    is_transient: bool,
    #[serde(default)]
    error_user_title: Option<String>,
    #[serde(default)]
    fbtrace_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

impl ApiError {
    /// Create an error with just a status and message
    pub fn new(http_status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            http_status,
            message: message.into(),
            ..Self::default()
        }
    }

    /// Create a transient transport error (timeout, connection reset)
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            is_transient: true,
            message: message.into(),
            ..Self::default()
        }
    }

    /// Parse a Graph API error response body.
    ///
    /// Bodies that are not a Graph error envelope keep the raw text as the message.
    pub fn from_response(http_status: u16, body: &str) -> Self {
        match serde_json::from_str::<GraphErrorEnvelope>(body) {
            Ok(envelope) => {
                let e = envelope.error;
                Self {
                    http_status: Some(http_status),
                    code: e.code,
                    error_subcode: e.error_subcode,
                    error_type: e.error_type,
                    is_transient: e.is_transient,
                    message: e.message,
                    error_user_title: e.error_user_title,
                    fbtrace_id: e.fbtrace_id,
                }
            }
            Err(_) => Self::new(Some(http_status), body),
        }
    }

    /// Set the vendor code
    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the vendor subcode
    #[must_use]
    pub fn with_subcode(mut self, subcode: i64) -> Self {
        self.error_subcode = Some(subcode);
        self
    }

    /// Set the vendor error type
    #[must_use]
    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    /// Mark as transient
    #[must_use]
    pub fn with_transient(mut self, transient: bool) -> Self {
        self.is_transient = transient;
        self
    }

    /// The most useful human-readable description of this error
    pub fn details(&self) -> &str {
        self.error_user_title.as_deref().unwrap_or(&self.message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.http_status {
            write!(f, "HTTP {status} ")?;
        }
        if let Some(code) = self.code {
            write!(f, "code={code} ")?;
        }
        if let Some(subcode) = self.error_subcode {
            write!(f, "subcode={subcode} ")?;
        }
        if let Some(error_type) = &self.error_type {
            write!(f, "type={error_type} ")?;
        }
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("access_token");
        assert_eq!(
            err.to_string(),
            "Missing required config field: access_token"
        );

        let err = Error::stream_not_found("reels");
        assert_eq!(err.to_string(), "Stream 'reels' is not available");
    }

    #[test]
    fn test_api_error_from_graph_body() {
        let body = r#"{
            "error": {
                "message": "(#10) Not enough viewers for the media to show insights",
                "type": "OAuthException",
                "code": 10,
                "error_subcode": 2108006,
                "is_transient": false,
                "error_user_title": "Media Posted Before Business Account Conversion",
                "fbtrace_id": "AbC123"
            }
        }"#;

        let err = ApiError::from_response(400, body);
        assert_eq!(err.http_status, Some(400));
        assert_eq!(err.code, Some(10));
        assert_eq!(err.error_subcode, Some(2_108_006));
        assert_eq!(err.error_type.as_deref(), Some("OAuthException"));
        assert!(!err.is_transient);
        assert_eq!(
            err.details(),
            "Media Posted Before Business Account Conversion"
        );
        assert_eq!(err.fbtrace_id.as_deref(), Some("AbC123"));
    }

    #[test]
    fn test_api_error_from_non_graph_body() {
        let err = ApiError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.http_status, Some(502));
        assert!(err.code.is_none());
        assert_eq!(err.message, "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::new(Some(400), "Invalid parameter")
            .with_code(100)
            .with_subcode(33);
        assert_eq!(
            err.to_string(),
            "HTTP 400 code=100 subcode=33 Invalid parameter"
        );
    }

    #[test]
    fn test_verdict_of_non_api_errors_is_fatal() {
        assert_eq!(Error::config("bad").verdict(), Verdict::Fatal);
        assert_eq!(Error::decode("bad").verdict(), Verdict::Fatal);
        assert_eq!(
            Error::ExpectedEmpty(ApiError::default()).verdict(),
            Verdict::ExpectedEmpty
        );
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
