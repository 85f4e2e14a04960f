//! Test harness: a filesystem over canned feeds, without a kernel mount.

// Not all tests use every helper
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rssfs_core::{
    CategoryConfig, FeedConfig, FeedSource, FetchedFeed, HtmlRenderer, Materializer, Owner,
    RawItem, RssfsError, RssfsResult, TreeBuilder,
};
use rssfs_fuse::{FuseResult, MountConfig, ROOT_INODE, RssFS};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const FEED_URL: &str = "http://x/feed";

/// Canned feeds by URL; several versions of one URL are served in rotation.
#[derive(Default)]
pub struct CannedFeeds {
    feeds: Mutex<HashMap<String, Vec<FetchedFeed>>>,
    cursor: AtomicUsize,
}

impl CannedFeeds {
    pub fn set(&self, url: &str, versions: Vec<FetchedFeed>) {
        self.feeds.lock().insert(url.to_string(), versions);
    }

    pub fn fail(&self, url: &str) {
        self.feeds.lock().remove(url);
    }
}

impl FeedSource for CannedFeeds {
    fn fetch(&self, url: &str) -> RssfsResult<FetchedFeed> {
        let feeds = self.feeds.lock();
        let versions = feeds
            .get(url)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RssfsError::fetch(url, "connection refused"))?;
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst) % versions.len();
        Ok(versions[idx].clone())
    }
}

pub fn item(title: &str, body: &str) -> RawItem {
    RawItem {
        title: title.to_string(),
        link: format!("http://x/{body}"),
        author: None,
        updated: Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()),
        published: None,
        content: body.to_string(),
    }
}

pub fn feed(title: &str, items: Vec<RawItem>) -> FetchedFeed {
    FetchedFeed {
        title: title.to_string(),
        items,
    }
}

pub fn category(name: &str, urls: &[&str]) -> CategoryConfig {
    CategoryConfig {
        name: name.to_string(),
        feeds: urls
            .iter()
            .map(|url| FeedConfig {
                url: (*url).to_string(),
            })
            .collect(),
    }
}

/// A mounted-in-memory filesystem with one category "Tech" holding one feed.
pub struct Harness {
    pub fs: RssFS,
    pub source: Arc<CannedFeeds>,
}

impl Harness {
    pub fn new(initial: FetchedFeed) -> Self {
        let source = Arc::new(CannedFeeds::default());
        source.set(FEED_URL, vec![initial]);
        Self::with_categories(source, vec![category("Tech", &[FEED_URL])])
    }

    /// A filesystem over arbitrary categories; `source` must serve every URL.
    pub fn with_categories(source: Arc<CannedFeeds>, categories: Vec<CategoryConfig>) -> Self {
        let root = TreeBuilder::new(source.clone())
            .build(&categories)
            .expect("tree build");
        let materializer = Materializer::new(source.clone(), Arc::new(HtmlRenderer));
        let config = MountConfig::default().refresh_workers(2);
        let fs = RssFS::new(&root, materializer, Owner::new(1000, 1000), &config)
            .expect("filesystem");
        Self { fs, source }
    }

    pub fn tech(&self) -> u64 {
        self.fs.lookup_child(ROOT_INODE, "Tech").expect("Tech").ino
    }

    pub fn feed_ino(&self, title: &str) -> u64 {
        self.fs.lookup_child(self.tech(), title).expect("feed").ino
    }

    /// Entry names of a listing, `.` and `..` excluded.
    pub fn names(&self, ino: u64) -> FuseResult<Vec<String>> {
        Ok(self
            .fs
            .list(ino)?
            .iter()
            .skip(2)
            .map(|e| e.name.clone())
            .collect())
    }

    /// Inode numbers of a listing, `.` and `..` excluded.
    pub fn item_inos(&self, ino: u64) -> FuseResult<BTreeSet<u64>> {
        Ok(self.fs.list(ino)?.iter().skip(2).map(|e| e.ino).collect())
    }
}
