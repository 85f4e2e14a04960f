//! Concurrent construction of the category and feed levels of the tree.
//!
//! Each category, and each feed inside a category, is fetched by its own
//! worker thread. Workers push their result into a bounded channel and a
//! single collector drains it until every unit has reported, then sorts the
//! results by name and assembles the parent directory in one step. Partial
//! directories are never visible: the root is only returned once every
//! category is complete.
//!
//! Items are not fetched here; a feed's items are materialized lazily when its
//! directory is listed.
//!
//! Feed nodes are created only once every category is in, since a feed's
//! identifier depends on whether its title also appears in another category.

use crate::config::{CategoryConfig, FeedConfig};
use crate::error::RssfsResult;
use crate::feed::FeedSource;
use crate::names::{disambiguate, sanitize};
use crate::tree::{ChildSet, Node};
use crossbeam_channel::bounded;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};

/// Default capacity of the fan-in result queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

/// Builds the root → category → feed skeleton from configuration.
pub struct TreeBuilder {
    source: Arc<dyn FeedSource>,
    queue_capacity: usize,
}

impl std::fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("queue_capacity", &self.queue_capacity)
            .finish_non_exhaustive()
    }
}

/// A category whose feeds are fetched but whose own name is not final yet.
struct CategoryDraft {
    index: usize,
    key: String,
    sanitized: String,
    feeds: Vec<NamedFeed>,
}

/// A feed with its final directory name.
struct NamedFeed {
    /// Identity key within the category.
    key: String,
    name: String,
    url: String,
}

/// A fetched feed waiting for name disambiguation.
struct FeedDraft {
    title: String,
    sanitized: String,
    url: String,
}

impl TreeBuilder {
    /// Creates a builder fetching through `source`.
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self {
            source,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Sets the fan-in queue capacity (minimum 1).
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Fetches every configured feed and returns the assembled root.
    ///
    /// Any fetch failure aborts the whole build.
    pub fn build(&self, categories: &[CategoryConfig]) -> RssfsResult<Arc<Node>> {
        let start = Instant::now();
        let indexed: Vec<(usize, &CategoryConfig)> = categories.iter().enumerate().collect();

        let mut drafts = fan_out(&indexed, self.queue_capacity, |&(index, category)| {
            self.build_category(index, category)
        })?;
        drafts.sort_by(|a, b| a.sanitized.cmp(&b.sanitized).then(a.index.cmp(&b.index)));

        let names = disambiguate(drafts.iter().map(|d| &d.sanitized));
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for feed in drafts.iter().flat_map(|d| &d.feeds) {
            *occurrences.entry(feed.key.as_str()).or_default() += 1;
        }

        let now = SystemTime::now();
        let mut children = Vec::with_capacity(drafts.len());
        for (draft, name) in drafts.iter().zip(names) {
            let category_key = identity_key(&draft.key, &draft.sanitized, &name);
            let feeds = draft.feeds.iter().map(|feed| {
                let shared = occurrences.get(feed.key.as_str()).is_some_and(|&n| n > 1);
                let key = if shared {
                    format!("{category_key}/{}", feed.key)
                } else {
                    feed.key.clone()
                };
                Arc::new(Node::feed(&key, feed.name.clone(), feed.url.clone(), now))
            });
            let feeds = ChildSet::from_nodes(feeds.collect::<Vec<_>>());
            children.push(Arc::new(Node::category(category_key, name.clone(), feeds, now)));
        }
        let root = Arc::new(Node::root(ChildSet::from_nodes(children), now));

        info!(
            categories = categories.len(),
            feeds = categories.iter().map(|c| c.feeds.len()).sum::<usize>(),
            elapsed_ms = start.elapsed().as_millis(),
            "Feed tree built"
        );
        Ok(root)
    }

    fn build_category(&self, index: usize, category: &CategoryConfig) -> RssfsResult<CategoryDraft> {
        debug!(category = %category.name, feeds = category.feeds.len(), "Building category");

        let mut drafts = fan_out(&category.feeds, self.queue_capacity, |feed| {
            self.fetch_feed(feed)
        })?;
        drafts.sort_by(|a, b| a.sanitized.cmp(&b.sanitized).then_with(|| a.url.cmp(&b.url)));

        let names = disambiguate(drafts.iter().map(|d| &d.sanitized));
        let feeds = drafts
            .into_iter()
            .zip(names)
            .map(|(draft, name)| NamedFeed {
                key: identity_key(&draft.title, &draft.sanitized, &name).to_string(),
                name,
                url: draft.url,
            })
            .collect();

        Ok(CategoryDraft {
            index,
            key: category.name.clone(),
            sanitized: sanitize(&category.name),
            feeds,
        })
    }

    fn fetch_feed(&self, feed: &FeedConfig) -> RssfsResult<FeedDraft> {
        let fetched = self.source.fetch(&feed.url).inspect_err(|e| {
            warn!(url = %feed.url, error = %e, "Failed to fetch feed during tree build");
        })?;
        debug!(url = %feed.url, title = %fetched.title, "Fetched feed title");
        Ok(FeedDraft {
            sanitized: sanitize(&fetched.title),
            title: fetched.title,
            url: feed.url.clone(),
        })
    }
}

/// Key an entry's identifier is derived from.
///
/// Normally the raw name; entries that needed a ` [n]` suffix are keyed by
/// their final name so that duplicates within one directory get distinct
/// identifiers.
fn identity_key<'a>(raw: &'a str, sanitized: &str, name: &'a str) -> &'a str {
    if name == sanitized { raw } else { name }
}

/// Runs `work` on every unit concurrently, one thread per unit, and collects
/// the results through a bounded queue in completion order.
///
/// Returns the first error reported; workers still in flight finish their
/// current fetch and their results are discarded.
fn fan_out<T, R, F>(units: &[T], capacity: usize, work: F) -> RssfsResult<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> RssfsResult<R> + Sync,
{
    if units.is_empty() {
        return Ok(Vec::new());
    }

    thread::scope(|scope| {
        let (tx, rx) = bounded(capacity.max(1));
        for unit in units {
            let tx = tx.clone();
            let work = &work;
            scope.spawn(move || {
                // The collector hangs up early on the first error.
                let _ = tx.send(work(unit));
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(units.len());
        for result in rx.iter().take(units.len()) {
            results.push(result?);
        }
        Ok(results)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RssfsError;
    use crate::feed::FetchedFeed;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct StubSource {
        titles: HashMap<String, String>,
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn with(mut self, url: &str, title: &str) -> Self {
            self.titles.insert(url.to_string(), title.to_string());
            self
        }

        fn slow(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }
    }

    impl FeedSource for StubSource {
        fn fetch(&self, url: &str) -> RssfsResult<FetchedFeed> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(url) {
                thread::sleep(*delay);
            }
            let title = self
                .titles
                .get(url)
                .ok_or_else(|| RssfsError::fetch(url, "unreachable"))?;
            Ok(FetchedFeed {
                title: title.clone(),
                items: Vec::new(),
            })
        }
    }

    fn category(name: &str, urls: &[&str]) -> CategoryConfig {
        CategoryConfig {
            name: name.to_string(),
            feeds: urls
                .iter()
                .map(|u| FeedConfig { url: (*u).to_string() })
                .collect(),
        }
    }

    fn names(node: &Node) -> Vec<String> {
        node.list().iter().map(|n| n.name().to_string()).collect()
    }

    #[test]
    fn test_builds_sorted_tree() {
        let source = StubSource::default()
            .with("http://a", "Zeta")
            .with("http://b", "Alpha")
            .with("http://c", "News");
        let root = TreeBuilder::new(Arc::new(source))
            .build(&[
                category("Tech", &["http://a", "http://b"]),
                category("Daily", &["http://c"]),
            ])
            .unwrap();

        assert_eq!(names(&root), vec!["Daily", "Tech"]);
        let tech = root.lookup("Tech").unwrap();
        assert_eq!(names(&tech), vec!["Alpha", "Zeta"]);
        assert_eq!(tech.id(), crate::id::category_id("Tech"));

        let zeta = tech.lookup("Zeta").unwrap();
        assert_eq!(zeta.url(), Some("http://a"));
        assert_eq!(zeta.id(), crate::id::feed_id("Zeta"));
        // Items are lazy.
        assert!(zeta.list().is_empty());
    }

    #[test]
    fn test_order_independent_of_completion() {
        let source = StubSource::default()
            .with("http://a", "First")
            .with("http://b", "Second")
            .slow("http://a", Duration::from_millis(50));
        let root = TreeBuilder::new(Arc::new(source))
            .build(&[category("C", &["http://a", "http://b"])])
            .unwrap();
        assert_eq!(names(&root.lookup("C").unwrap()), vec!["First", "Second"]);
    }

    #[test]
    fn test_colliding_names_disambiguated() {
        let source = StubSource::default()
            .with("http://a", "Blog")
            .with("http://b", "Blog")
            .with("http://c", "Blog: news");
        let root = TreeBuilder::new(Arc::new(source))
            .build(&[
                category("Tech", &["http://b", "http://a", "http://c"]),
                category("Tech", &[]),
            ])
            .unwrap();

        assert_eq!(names(&root), vec!["Tech", "Tech [1]"]);
        assert_ne!(
            root.lookup("Tech").unwrap().id(),
            root.lookup("Tech [1]").unwrap().id()
        );
        let tech = root.lookup("Tech").unwrap();
        assert_eq!(names(&tech), vec!["Blog", "Blog [1]", "Blog- news"]);
        // Ties are broken by URL, not by completion order.
        assert_eq!(tech.lookup("Blog").unwrap().url(), Some("http://a"));
        assert_eq!(tech.lookup("Blog [1]").unwrap().url(), Some("http://b"));
        assert_eq!(tech.lookup("Blog").unwrap().id(), crate::id::feed_id("Blog"));
        assert_eq!(
            tech.lookup("Blog [1]").unwrap().id(),
            crate::id::feed_id("Blog [1]")
        );
    }

    #[test]
    fn test_same_feed_title_in_two_categories_gets_distinct_ids() {
        let source = StubSource::default()
            .with("http://tech/blog", "Blog")
            .with("http://news/blog", "Blog")
            .with("http://news/daily", "Daily");
        let root = TreeBuilder::new(Arc::new(source))
            .build(&[
                category("Tech", &["http://tech/blog"]),
                category("News", &["http://news/blog", "http://news/daily"]),
            ])
            .unwrap();

        let tech_blog = root.lookup("Tech").unwrap().lookup("Blog").unwrap();
        let news_blog = root.lookup("News").unwrap().lookup("Blog").unwrap();
        assert_ne!(tech_blog.id(), news_blog.id());
        assert_eq!(tech_blog.id(), crate::id::feed_id("Tech/Blog"));
        assert_eq!(news_blog.id(), crate::id::feed_id("News/Blog"));
        assert_eq!(news_blog.url(), Some("http://news/blog"));

        // Titles that appear once keep their plain key.
        let daily = root.lookup("News").unwrap().lookup("Daily").unwrap();
        assert_eq!(daily.id(), crate::id::feed_id("Daily"));
    }

    #[test]
    fn test_any_failure_aborts_build() {
        let source = StubSource::default().with("http://ok", "Fine");
        let err = TreeBuilder::new(Arc::new(source))
            .build(&[category("A", &["http://ok", "http://down"])])
            .unwrap_err();
        assert_eq!(err.url(), Some("http://down"));
    }

    #[test]
    fn test_empty_config() {
        let root = TreeBuilder::new(Arc::new(StubSource::default()))
            .build(&[])
            .unwrap();
        assert!(root.list().is_empty());
    }

    #[test]
    fn test_fetches_each_feed_once_with_small_queue() {
        let source = Arc::new(
            (0..30).fold(StubSource::default(), |s, i| {
                s.with(&format!("http://f/{i}"), &format!("Feed {i:02}"))
            }),
        );
        let urls: Vec<String> = (0..30).map(|i| format!("http://f/{i}")).collect();
        let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();

        let root = TreeBuilder::new(source.clone())
            .queue_capacity(2)
            .build(&[category("Many", &url_refs)])
            .unwrap();

        assert_eq!(root.lookup("Many").unwrap().list().len(), 30);
        assert_eq!(source.calls.load(Ordering::SeqCst), 30);
    }
}
