//! Configuration file support.
//!
//! Configuration is stored at `~/.config/rssfs/config.toml` (XDG standard)
//! or `~/Library/Application Support/rssfs/config.toml` on macOS.
//!
//! # Example configuration
//!
//! ```toml
//! mountpoint = "/home/user/rss"
//!
//! [[category]]
//! name = "Tech"
//!
//! [[category.feed]]
//! url = "https://news.ycombinator.com/rss"
//!
//! [[category.feed]]
//! url = "https://lobste.rs/rss"
//! ```

use crate::error::{RssfsError, RssfsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Where to mount the filesystem.
    pub mountpoint: Option<PathBuf>,

    /// Categories, each becoming a top-level directory.
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryConfig>,
}

/// A category of feeds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryConfig {
    /// Directory name (sanitized before use).
    pub name: String,

    /// Feeds listed under this category.
    #[serde(default, rename = "feed")]
    pub feeds: Vec<FeedConfig>,
}

/// A single remote feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Feed URL.
    pub url: String,
}

impl Config {
    /// Loads configuration from `path`.
    ///
    /// Unlike optional CLI configs, a missing file is an error: without it
    /// there is nothing to mount.
    pub fn load(path: &Path) -> RssfsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RssfsError::Config {
            path: path.to_path_buf(),
            message: format!("failed to read: {e}"),
        })?;
        Self::parse(path, &content)
    }

    /// Parses configuration text; `path` is only used in error messages.
    pub fn parse(path: &Path, content: &str) -> RssfsResult<Self> {
        toml::from_str(content).map_err(|e| RssfsError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Returns the mountpoint, preferring `cli_override` over the file value.
    ///
    /// A relative `mountpoint` in the file is taken relative to the directory
    /// holding the file at `path`. The command-line value is used as given.
    pub fn resolve_mountpoint(
        &self,
        path: &Path,
        cli_override: Option<PathBuf>,
    ) -> RssfsResult<PathBuf> {
        if let Some(mountpoint) = cli_override {
            return Ok(mountpoint);
        }
        let mountpoint = self.mountpoint.as_ref().ok_or_else(|| RssfsError::Config {
            path: path.to_path_buf(),
            message: "no mountpoint configured (set `mountpoint` or pass --mountpoint)"
                .to_string(),
        })?;
        if mountpoint.is_absolute() {
            return Ok(mountpoint.clone());
        }
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(base.join(mountpoint))
    }

    /// Total number of configured feeds.
    pub fn feed_count(&self) -> usize {
        self.categories.iter().map(|c| c.feeds.len()).sum()
    }
}

/// Get the path to the configuration file.
///
/// Uses the XDG config directory on Linux, Application Support on macOS.
pub fn config_path() -> RssfsResult<PathBuf> {
    let base_dirs = directories::BaseDirs::new().ok_or_else(|| RssfsError::Config {
        path: PathBuf::from("~"),
        message: "could not determine home directory".to_string(),
    })?;
    Ok(base_dirs.config_dir().join("rssfs").join("config.toml"))
}
