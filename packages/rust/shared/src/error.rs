//! Error types for PileLog.
//!
//! Library crates use [`PileLogError`] via `thiserror`.
//! The bot binary wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all PileLog operations.
#[derive(Debug, thiserror::Error)]
pub enum PileLogError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level HTTP failure (connect, timeout, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}")]
    Backend { status: String },

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PileLogError>;

impl PileLogError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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
