//! src/error.rs
//! ============================================================================
//! # `ReaderError`: Unified Error Type for the Reader
//!
//! Navigation errors (`OutOfRange`, `InvalidPage`) are rejected requests, not
//! failures: the session logs them and leaves its state untouched. The
//! remaining variants cover configuration, persistence and page fetching.

use std::{io, path::PathBuf};
use thiserror::Error;

pub type ReaderResult<T> = Result<T, ReaderError>;

/// Unified error type for all reader operations.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Jump target outside `[0, spread_count - 1]`.
    #[error("Spread index {index} out of range (spread count: {spread_count})")]
    OutOfRange { index: usize, spread_count: usize },

    /// Jump target outside `[1, page_count]`.
    #[error("Invalid page {page} (page count: {page_count})")]
    InvalidPage { page: usize, page_count: usize },

    /// Action that needs an open chapter arrived while none is open.
    #[error("No chapter is open")]
    NoChapter,

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Config value rejected by validation.
    #[error("Invalid config: {field} - {message}")]
    InvalidConfig { field: String, message: String },

    /// Config file I/O error with path.
    #[error("Failed to access config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Preference store failure.
    #[error("Preference store error: {0}")]
    Preferences(String),

    /// Standard IO error, auto-converted from `io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Page fetch failed. Never surfaces through navigation.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Any other error, with description.
    #[error("Unexpected error: {0}")]
    Other(String),
}

impl ReaderError {
    #[must_use]
    pub const fn out_of_range(index: usize, spread_count: usize) -> Self {
        Self::OutOfRange {
            index,
            spread_count,
        }
    }

    #[must_use]
    pub const fn invalid_page(page: usize, page_count: usize) -> Self {
        Self::InvalidPage { page, page_count }
    }

    /// Create an invalid configuration error
    pub fn invalid_config<S1: Into<String>, S2: Into<String>>(field: S1, message: S2) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a page fetch failure error
    pub fn fetch_failed<S1: Into<String>, S2: Into<String>>(url: S1, reason: S2) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Rejected navigation requests. Callers ignore or log these.
    #[must_use]
    pub const fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::OutOfRange { .. } | Self::InvalidPage { .. } | Self::NoChapter
        )
    }
}

// Allow conversion from `anyhow::Error` as fallback.
impl From<anyhow::Error> for ReaderError {
    fn from(e: anyhow::Error) -> Self {
        Self::Other(e.to_string())
    }
}
