//! Error types for Shelfmark operations.
//!
//! The ingestion pipeline itself never fails: [`crate::ContentProxy::update_entry`]
//! returns `()`. The variants below surface from the pieces around it, namely the
//! per-field updaters, the tagger, the configuration loader and the HTTP transport.
//! The pipeline turns every one of them into a log line.
//!
//! # Example
//!
//! ```rust
//! use shelfmark_core::{Result, ShelfmarkError};
//!
//! fn require_host(url: &str) -> Result<()> {
//!     if !url.contains("://") {
//!         return Err(ShelfmarkError::InvalidUrl(url.to_string()));
//!     }
//!     Ok(())
//! }
//! # assert!(require_host("example.com").is_err());
//! ```

use thiserror::Error;

/// Main error type for ingestion and configuration operations.
#[derive(Error, Debug)]
pub enum ShelfmarkError {
    /// HTTP request errors from reqwest.
    ///
    /// The pipeline never sees this variant: [`crate::HttpFetcher`] folds transport
    /// failures into a failed body.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A language tag did not pass locale validation.
    #[error("Language validation failed for {value:?}: {}", reasons.join("; "))]
    InvalidLocale { value: String, reasons: Vec<String> },

    /// A preview picture did not pass URL validation.
    #[error("Preview picture validation failed for {value:?}: {}", reasons.join("; "))]
    InvalidPreviewPicture { value: String, reasons: Vec<String> },

    /// A publication date could not be interpreted.
    #[error("Could not parse date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },

    /// Automatic tagging failed.
    #[error("Tagging failed: {0}")]
    Tagging(String),

    /// Configuration errors.
    ///
    /// Returned when a configuration file is unreadable, malformed, or holds
    /// values outside their accepted range.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ShelfmarkError.
pub type Result<T> = std::result::Result<T, ShelfmarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShelfmarkError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_locale_error_lists_reasons() {
        let err = ShelfmarkError::InvalidLocale {
            value: "xx_YY".to_string(),
            reasons: vec!["unknown language".to_string(), "unknown region".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("xx_YY"));
        assert!(message.contains("unknown language; unknown region"));
    }

    #[test]
    fn test_timeout_error() {
        let err = ShelfmarkError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
