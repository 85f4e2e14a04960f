//! The in-memory node hierarchy: root → category → feed → item.
//!
//! Container nodes own a [`ChildSet`], an immutable snapshot of their children
//! behind a swappable reference. Readers clone the current `Arc` and iterate
//! it without holding any lock; a refresh builds a complete new snapshot off
//! to the side and installs it with a single pointer swap, so a reader sees
//! either the old set or the new one, never a mix.
//!
//! A snapshot keeps its children in the order they were supplied. Builders
//! and the materializer hand them over already sorted by sanitized title, so
//! `Post.html` is listed before `Post [1].html`.

use crate::id::{self, ROOT_ID};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

/// Children of a directory in listing order, indexed by name.
#[derive(Debug, Default)]
pub struct Children {
    ordered: Vec<Arc<Node>>,
    by_name: HashMap<String, usize>,
}

impl Children {
    fn new(children: impl IntoIterator<Item = Arc<Node>>) -> Self {
        let mut set = Self::default();
        for child in children {
            match set.by_name.get(child.name()) {
                // Later entries win on duplicate names, keeping the first slot.
                Some(&slot) => set.ordered[slot] = child,
                None => {
                    set.by_name.insert(child.name().to_string(), set.ordered.len());
                    set.ordered.push(child);
                }
            }
        }
        set
    }

    /// Looks up a child by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Node>> {
        self.by_name.get(name).map(|&slot| &self.ordered[slot])
    }

    /// Whether a child named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Children in listing order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Node>> {
        self.ordered.iter()
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether there are no children.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a Arc<Node>;
    type IntoIter = std::slice::Iter<'a, Arc<Node>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A point-in-time view of a directory's children.
pub type Snapshot = Arc<Children>;

/// Concurrency-safe child collection of a container node.
#[derive(Debug, Default)]
pub struct ChildSet {
    current: RwLock<Snapshot>,
}

impl ChildSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding `children` in the given order.
    ///
    /// Later entries win on duplicate names; callers disambiguate first.
    pub fn from_nodes(children: impl IntoIterator<Item = Arc<Node>>) -> Self {
        Self {
            current: RwLock::new(Arc::new(Children::new(children))),
        }
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.current.read())
    }

    /// Returns the children in listing order.
    pub fn list(&self) -> Vec<Arc<Node>> {
        self.snapshot().iter().cloned().collect()
    }

    /// Looks up a child by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<Node>> {
        self.current.read().get(name).cloned()
    }

    /// Number of children in the current snapshot.
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Whether the current snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Atomically replaces the whole set and returns the installed snapshot.
    pub fn replace(&self, children: impl IntoIterator<Item = Arc<Node>>) -> Snapshot {
        let next: Snapshot = Arc::new(Children::new(children));
        *self.current.write() = Arc::clone(&next);
        next
    }
}

/// Variant-specific part of a node.
#[derive(Debug)]
pub enum NodeKind {
    /// The mount root; children are categories.
    Root(ChildSet),
    /// A category directory; children are feeds.
    Category(ChildSet),
    /// A feed directory; children are items, replaced on every listing.
    Feed {
        /// Remote URL the items are fetched from.
        url: String,
        /// Current item set.
        items: ChildSet,
    },
    /// A rendered feed item.
    Item {
        /// Immutable rendered document.
        content: Bytes,
    },
}

/// A node of the feed tree.
#[derive(Debug)]
pub struct Node {
    id: u64,
    name: String,
    modified: SystemTime,
    kind: NodeKind,
}

impl Node {
    /// Creates the root node.
    pub fn root(categories: ChildSet, modified: SystemTime) -> Self {
        Self {
            id: ROOT_ID,
            name: String::new(),
            modified,
            kind: NodeKind::Root(categories),
        }
    }

    /// Creates a category node. `key` is the configured category name.
    pub fn category(key: &str, name: String, feeds: ChildSet, modified: SystemTime) -> Self {
        Self {
            id: id::category_id(key),
            name,
            modified,
            kind: NodeKind::Category(feeds),
        }
    }

    /// Creates a feed node with no items. `key` is its identity key, see
    /// [`id::feed_id`].
    pub fn feed(key: &str, name: String, url: String, modified: SystemTime) -> Self {
        Self {
            id: id::feed_id(key),
            name,
            modified,
            kind: NodeKind::Feed {
                url,
                items: ChildSet::new(),
            },
        }
    }

    /// Creates an item node identified by its content.
    pub fn item(name: String, content: Bytes, modified: SystemTime) -> Self {
        Self {
            id: id::identify(&content),
            name,
            modified,
            kind: NodeKind::Item { content },
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name within the parent directory (empty for the root).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last-modified time; also used for access and change times.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Variant data.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether this node is a directory.
    pub fn is_dir(&self) -> bool {
        !matches!(self.kind, NodeKind::Item { .. })
    }

    /// Whether this node is a feed directory (refreshed on listing).
    pub fn is_feed(&self) -> bool {
        matches!(self.kind, NodeKind::Feed { .. })
    }

    /// Size reported to the kernel: content length for items, 0 otherwise.
    pub fn size(&self) -> u64 {
        match &self.kind {
            NodeKind::Item { content } => content.len() as u64,
            _ => 0,
        }
    }

    /// Item content, or `None` for directories.
    pub fn content(&self) -> Option<&Bytes> {
        match &self.kind {
            NodeKind::Item { content } => Some(content),
            _ => None,
        }
    }

    /// Feed URL, or `None` for other variants.
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Feed { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Child collection, or `None` for items.
    pub fn children(&self) -> Option<&ChildSet> {
        match &self.kind {
            NodeKind::Root(children) | NodeKind::Category(children) => Some(children),
            NodeKind::Feed { items, .. } => Some(items),
            NodeKind::Item { .. } => None,
        }
    }

    /// Looks up a child by name; always `None` for items.
    pub fn lookup(&self, name: &str) -> Option<Arc<Node>> {
        self.children().and_then(|c| c.lookup(name))
    }

    /// Children in listing order; empty for items.
    ///
    /// For feeds this is the last materialized set, without refreshing.
    pub fn list(&self) -> Vec<Arc<Node>> {
        self.children().map(ChildSet::list).unwrap_or_default()
    }

    /// Returns `[offset, offset + len)` of the item content, clamped to its
    /// length. Offsets past the end yield an empty slice.
    pub fn read(&self, offset: u64, len: usize) -> Bytes {
        let Some(content) = self.content() else {
            return Bytes::new();
        };
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(content.len());
        let end = start.saturating_add(len).min(content.len());
        content.slice(start..end)
    }
}
