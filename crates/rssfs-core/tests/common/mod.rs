//! In-memory feed source shared by the integration tests.

// Not all tests use every helper
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rssfs_core::{FeedSource, FetchedFeed, RawItem, RssfsError, RssfsResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves canned feeds by URL. Each URL may hold several versions which are
/// handed out round-robin, one per fetch.
#[derive(Default)]
pub struct MemorySource {
    feeds: Mutex<HashMap<String, Vec<FetchedFeed>>>,
    cursor: AtomicUsize,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single version of a feed.
    pub fn insert(&self, url: &str, feed: FetchedFeed) {
        self.feeds.lock().insert(url.to_string(), vec![feed]);
    }

    /// Registers several versions served in rotation.
    pub fn insert_versions(&self, url: &str, versions: Vec<FetchedFeed>) {
        self.feeds.lock().insert(url.to_string(), versions);
    }

    /// Makes `url` unreachable.
    pub fn remove(&self, url: &str) {
        self.feeds.lock().remove(url);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeedSource for MemorySource {
    fn fetch(&self, url: &str) -> RssfsResult<FetchedFeed> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let feeds = self.feeds.lock();
        let versions = feeds
            .get(url)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RssfsError::fetch(url, "connection refused"))?;
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst) % versions.len();
        Ok(versions[idx].clone())
    }
}

/// A dated item, so that its rendering does not depend on the clock.
pub fn item(title: &str, body: &str) -> RawItem {
    RawItem {
        title: title.to_string(),
        link: format!("http://x/{body}"),
        author: Some("tester".to_string()),
        updated: None,
        published: Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        content: body.to_string(),
    }
}

pub fn feed(title: &str, items: Vec<RawItem>) -> FetchedFeed {
    FetchedFeed {
        title: title.to_string(),
        items,
    }
}
