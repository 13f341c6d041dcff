// src/error.rs

//! Unified error handling for the downloader.
//!
//! `AppError` covers infrastructure faults. Discovery and chapter failures are
//! expected outcomes and are classified by [`DiscoveryError`] and
//! [`ChapterError`] instead.

use std::fmt;

use thiserror::Error;

/// Result type alias for downloader operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Why a novel could not be discovered.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum DiscoveryError {
    /// The catalog or result page did not load in time
    #[error("navigation timed out")]
    NavigationTimeout,

    /// The catalog or result page failed to load for another reason
    #[error("navigation failed")]
    NavigationFailed,

    /// The home page has no usable search form
    #[error("search form not found")]
    SearchFormNotFound,

    /// The search matched several novels
    #[error("ambiguous result")]
    AmbiguousResult,

    /// The search matched nothing
    #[error("novel not found")]
    NotFound,
}

/// Why a single chapter could not be fetched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ChapterError {
    /// The chapter page did not load in time
    #[error("navigation timed out")]
    NavigationTimeout,

    /// The chapter page failed to load for another reason
    #[error("navigation failed")]
    NavigationFailed,

    /// Title or content element never became visible
    #[error("element not found")]
    ElementNotFound,

    /// Title or body was empty after normalization
    #[error("empty content")]
    EmptyContent,

    /// The segment worker stopped before reaching this chapter
    #[error("worker aborted")]
    WorkerAborted,

    /// The segment's part file could not be written
    #[error("output write failed")]
    WriteFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_error_message() {
        let err = AppError::selector("[[x", "unexpected token");
        assert_eq!(err.to_string(), "Invalid selector '[[x': unexpected token");
    }

    #[test]
    fn taxonomy_display() {
        assert_eq!(DiscoveryError::AmbiguousResult.to_string(), "ambiguous result");
        assert_eq!(ChapterError::EmptyContent.to_string(), "empty content");
        assert_eq!(ChapterError::WriteFailed.to_string(), "output write failed");
    }
}
