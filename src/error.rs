//! Unified error handling for the civicsync crate
//!
//! Domain-specific errors ([`FetchError`], [`ParseError`]) cover the feed and
//! extraction layers; the crate-wide [`Error`] enum wraps them together with
//! the infrastructure errors so they can cross module boundaries without
//! losing detail.

use std::io;
use thiserror::Error;

/// Errors that can occur while fetching an upstream feed or geocode response
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server responded with a non-success status code
    #[error("server error from {source_name}: status {status}")]
    ServerError { source_name: &'static str, status: u16 },

    /// Feed body could not be deserialized
    #[error("malformed feed body from {source_name}: {detail}")]
    MalformedBody {
        source_name: &'static str,
        detail: String,
    },

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors that can occur during text extraction
///
/// Regex extractors that are allowed to degrade (address decomposition, time
/// ranges) return sentinels instead of these; `ParseError` is reserved for
/// inputs that must have a fixed shape.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Republic-era date token does not match the 7-digit YYYMMDD shape
    #[error("invalid ROC date token: {0:?}")]
    InvalidRocDate(String),

    /// Date digits matched but do not form a calendar date
    #[error("date out of range: {year}-{month}-{day}")]
    DateOutOfRange { year: i32, month: u32, day: u32 },
}

/// Errors that can occur while resolving an address or coordinate
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// HTTP transport failure
    #[error("geocode request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Geocoding service returned a non-success status
    #[error("geocode service status {0}")]
    Status(u16),

    /// Service answered but had no result for the query
    #[error("no geocode result for {query:?}")]
    NoResult { query: String },
}

/// Unified error type for the civicsync crate
#[derive(Error, Debug)]
pub enum Error {
    /// Feed fetch errors
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Text extraction errors
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Geocoding errors
    #[error("geocode error: {0}")]
    Geocode(#[from] GeocodeError),

    /// Database errors
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when retrying the same run later could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Fetch(_) | Self::Geocode(GeocodeError::Http(_)) | Self::Io(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Fetch(FetchError::Http(err))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_is_recoverable() {
        let err = Error::Fetch(FetchError::ServerError {
            source_name: "water",
            status: 503,
        });
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_parse_error_is_not_recoverable() {
        let err = Error::Parse(ParseError::InvalidRocDate("abcdefg".into()));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_display_includes_context() {
        let err = Error::Fetch(FetchError::MalformedBody {
            source_name: "road",
            detail: "missing field `result`".into(),
        });
        let msg = err.to_string();
        assert!(msg.contains("road"));
        assert!(msg.contains("result"));
    }
}
