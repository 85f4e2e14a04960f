//! Remote feed retrieval.
//!
//! The tree only needs a flat list of items per feed URL; [`FeedSource`] is
//! the seam between the tree and the network. [`HttpFeedSource`] is the
//! production implementation: a blocking HTTP GET followed by an RSS / Atom /
//! JSON Feed parse.

use crate::error::{RssfsError, RssfsResult};
use chrono::{DateTime, Utc};
use std::io::Read;
use std::time::Duration;
use tracing::{debug, warn};

/// One entry of a fetched feed, before rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    /// Item title as published.
    pub title: String,
    /// Link to the original article.
    pub link: String,
    /// Author name, if the feed carries one.
    pub author: Option<String>,
    /// Last update time, if present.
    pub updated: Option<DateTime<Utc>>,
    /// Publication time, if present.
    pub published: Option<DateTime<Utc>>,
    /// Body content (usually HTML).
    pub content: String,
}

impl RawItem {
    /// The item's timestamp: update time, else publish time, else `now`.
    pub fn timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.updated.or(self.published).unwrap_or(now)
    }
}

/// A fetched feed: its title and items in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedFeed {
    /// Feed title.
    pub title: String,
    /// Items in the order the remote document lists them.
    pub items: Vec<RawItem>,
}

/// Source of feed documents.
///
/// Implementations block for the duration of the remote I/O and are shared
/// between tree-builder workers and refresh workers.
pub trait FeedSource: Send + Sync {
    /// Fetches and parses the feed at `url`.
    fn fetch(&self, url: &str) -> RssfsResult<FetchedFeed>;
}

/// Default HTTP timeout for a single feed fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a feed document body.
const MAX_FEED_BYTES: u64 = 16 * 1024 * 1024;

/// Fetches feeds over HTTP(S) with `ureq` and parses them with `feed-rs`.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    agent: ureq::Agent,
}

impl HttpFeedSource {
    /// Creates a source with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Creates a source whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .user_agent(concat!("rssfs/", env!("CARGO_PKG_VERSION")))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpFeedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch(&self, url: &str) -> RssfsResult<FetchedFeed> {
        debug!(url = %url, "Fetching feed");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| RssfsError::fetch(url, e))?;

        let mut body = Vec::new();
        response
            .into_body()
            .into_reader()
            .take(MAX_FEED_BYTES)
            .read_to_end(&mut body)
            .map_err(|e| RssfsError::fetch(url, e))?;

        let feed = parse_feed(url, &body)?;
        debug!(url = %url, items = feed.items.len(), "Fetched feed");
        Ok(feed)
    }
}

/// Parses a feed document into a [`FetchedFeed`].
///
/// A feed without a title is named after its URL.
pub fn parse_feed(url: &str, body: &[u8]) -> RssfsResult<FetchedFeed> {
    let parsed = feed_rs::parser::parse(body).map_err(|e| {
        warn!(url = %url, error = %e, "Feed parse failed");
        RssfsError::parse(url, e)
    })?;

    let title = parsed
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| url.to_string());

    let items = parsed.entries.into_iter().map(convert_entry).collect();
    Ok(FetchedFeed { title, items })
}

fn convert_entry(entry: feed_rs::model::Entry) -> RawItem {
    let content = entry
        .content
        .and_then(|c| c.body)
        .or_else(|| entry.summary.map(|s| s.content))
        .unwrap_or_default();

    RawItem {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        link: entry
            .links
            .into_iter()
            .next()
            .map(|l| l.href)
            .unwrap_or_default(),
        author: entry.authors.into_iter().next().map(|p| p.name),
        updated: entry.updated,
        published: entry.published,
        content,
    }
}
