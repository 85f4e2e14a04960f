//! Error types for feed fetching, configuration and tree construction.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error from a feed transport or parser.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while building or refreshing the feed tree.
#[derive(Debug, Error)]
pub enum RssfsError {
    /// The remote source could not be reached or returned a bad response.
    #[error("Failed to fetch feed {url}: {source}")]
    Fetch {
        /// Feed URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },

    /// The remote document is not a feed we can parse.
    #[error("Failed to parse feed {url}: {source}")]
    Parse {
        /// Feed URL.
        url: String,
        /// Underlying parser error.
        #[source]
        source: BoxError,
    },

    /// The configuration file is missing, unreadable or malformed.
    #[error("Invalid configuration {}: {message}", path.display())]
    Config {
        /// Path of the offending file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The identity of the invoking user could not be resolved.
    #[error("Failed to resolve the invoking user: {0}")]
    Identity(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RssfsError {
    /// Builds a [`RssfsError::Fetch`] from any transport error.
    pub fn fetch(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        RssfsError::Fetch {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Builds a [`RssfsError::Parse`] from any parser error.
    pub fn parse(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        RssfsError::Parse {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Returns the feed URL this error relates to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            RssfsError::Fetch { url, .. } | RssfsError::Parse { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Result type for rssfs core operations.
pub type RssfsResult<T> = Result<T, RssfsError>;
