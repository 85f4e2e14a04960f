//! Turning a feed's fetched items into file nodes.

use crate::error::RssfsResult;
use crate::feed::{FeedSource, RawItem};
use crate::names::{disambiguate, sanitize};
use crate::render::Renderer;
use crate::tree::{Node, NodeKind, Snapshot};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Fetches, renders and names the items of a feed.
#[derive(Clone)]
pub struct Materializer {
    source: Arc<dyn FeedSource>,
    renderer: Arc<dyn Renderer>,
}

impl std::fmt::Debug for Materializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materializer").finish_non_exhaustive()
    }
}

impl Materializer {
    /// Creates a materializer over the given collaborators.
    pub fn new(source: Arc<dyn FeedSource>, renderer: Arc<dyn Renderer>) -> Self {
        Self { source, renderer }
    }

    /// The feed source shared with the tree builder.
    pub fn source(&self) -> &Arc<dyn FeedSource> {
        &self.source
    }

    /// Fetches `url` and returns its items as file nodes in listing order.
    ///
    /// Fails as a whole if the fetch fails; no partial list is produced.
    pub fn materialize(&self, url: &str) -> RssfsResult<Vec<Arc<Node>>> {
        let feed = self.source.fetch(url)?;
        Ok(build_items(feed.items, self.renderer.as_ref(), Utc::now()))
    }

    /// Re-materializes a feed node's items and swaps them in.
    ///
    /// Returns the snapshot that this call installed, so the caller lists
    /// exactly the set it produced even if another refresh lands right after.
    /// On failure the previous items are dropped as well: a feed that cannot
    /// be fetched serves no stale files.
    pub fn refresh(&self, feed: &Node) -> RssfsResult<Snapshot> {
        let NodeKind::Feed { url, items } = feed.kind() else {
            return Ok(feed.children().map(|c| c.snapshot()).unwrap_or_default());
        };

        let start = Instant::now();
        match self.materialize(url) {
            Ok(nodes) => {
                let snapshot = items.replace(nodes);
                debug!(
                    feed = feed.name(),
                    items = snapshot.len(),
                    elapsed_ms = start.elapsed().as_millis(),
                    "Refreshed feed"
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(feed = feed.name(), url = %url, error = %e, "Feed refresh failed");
                items.replace(Vec::new());
                Err(e)
            }
        }
    }
}

/// Builds item nodes from fetched items.
///
/// Items are stably sorted by sanitized title, names are disambiguated in
/// that order and suffixed with the renderer's extension. Each node is
/// identified by its rendered bytes and stamped with the item's update time,
/// else publish time, else `now`.
pub fn build_items(
    items: Vec<RawItem>,
    renderer: &dyn Renderer,
    now: DateTime<Utc>,
) -> Vec<Arc<Node>> {
    let mut keyed: Vec<(String, RawItem)> = items
        .into_iter()
        .map(|item| (sanitize(&item.title), item))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let names = disambiguate(keyed.iter().map(|(name, _)| name));

    keyed
        .into_iter()
        .zip(names)
        .map(|((_, item), name)| {
            let timestamp = item.timestamp(now);
            let rendered = renderer.render(&item, timestamp);
            Arc::new(Node::item(
                format!("{name}.{}", rendered.extension),
                Bytes::from(rendered.content),
                timestamp.into(),
            ))
        })
        .collect()
}
