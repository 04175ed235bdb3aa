//! Error types for Whatson.
//!
//! Library crates use [`WhatsonError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Whatson operations.
#[derive(Debug, thiserror::Error)]
pub enum WhatsonError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a source listing.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or field extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unknown status, missing record, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// An ingestion run was requested while another is still in flight.
    #[error("an ingestion run is already in progress")]
    RunInProgress,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WhatsonError>;

impl WhatsonError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = WhatsonError::config("missing default city");
        assert_eq!(err.to_string(), "config error: missing default city");

        let err = WhatsonError::validation("unknown status 'archived'");
        assert!(err.to_string().contains("archived"));
    }
}
