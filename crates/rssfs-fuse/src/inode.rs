//! Inode management for the FUSE filesystem.
//!
//! Inode numbers are the nodes' own content-derived identifiers, so the table
//! is only a map from numbers the kernel has been told about back to the
//! nodes they name. Directories (root, categories, feeds) live for the whole
//! mount and are pinned. Item entries carry a lookup count and are evicted
//! either by `forget()` or when their feed is refreshed without them.

use dashmap::DashMap;
use rssfs_core::{Node, ROOT_ID};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The root inode number (FUSE convention).
pub const ROOT_INODE: u64 = ROOT_ID;

/// An entry in the inode table.
#[derive(Debug)]
pub struct InodeEntry {
    node: Arc<Node>,
    parent: u64,
    pinned: bool,
    /// Lookup count for proper `forget()` handling.
    nlookup: AtomicU64,
}

impl InodeEntry {
    fn pinned(node: Arc<Node>, parent: u64) -> Self {
        Self {
            node,
            parent,
            pinned: true,
            nlookup: AtomicU64::new(0),
        }
    }

    fn item(node: Arc<Node>, parent: u64, nlookup: u64) -> Self {
        Self {
            node,
            parent,
            pinned: false,
            nlookup: AtomicU64::new(nlookup),
        }
    }

    /// The node this inode names.
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Inode of the containing directory.
    pub fn parent(&self) -> u64 {
        self.parent
    }

    /// Whether this entry is exempt from eviction.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Increments the lookup count and returns the new value.
    pub fn inc_nlookup(&self) -> u64 {
        self.nlookup.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrements the lookup count by `count`, saturating at zero, and
    /// returns the new value.
    pub fn dec_nlookup(&self, count: u64) -> u64 {
        let mut current = self.nlookup.load(Ordering::Acquire);
        loop {
            let next = current.saturating_sub(count);
            match self.nlookup.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Returns the current lookup count.
    pub fn nlookup(&self) -> u64 {
        self.nlookup.load(Ordering::Relaxed)
    }
}

/// Thread-safe map from inode numbers to nodes.
#[derive(Debug, Default)]
pub struct InodeTable {
    inner: DashMap<u64, InodeEntry>,
}

impl InodeTable {
    /// Creates a table with the root, every category and every feed pinned.
    pub fn with_tree(root: &Arc<Node>) -> Self {
        let table = Self::default();
        table
            .inner
            .insert(ROOT_INODE, InodeEntry::pinned(Arc::clone(root), ROOT_INODE));
        for category in root.list() {
            let category_ino = category.id();
            for feed in category.list() {
                table
                    .inner
                    .insert(feed.id(), InodeEntry::pinned(feed, category_ino));
            }
            table
                .inner
                .insert(category_ino, InodeEntry::pinned(category, ROOT_INODE));
        }
        table
    }

    /// Returns the node for `inode`.
    pub fn get(&self, inode: u64) -> Option<Arc<Node>> {
        self.inner.get(&inode).map(|e| Arc::clone(e.node()))
    }

    /// Returns the parent inode of `inode`.
    pub fn parent_of(&self, inode: u64) -> Option<u64> {
        self.inner.get(&inode).map(|e| e.parent())
    }

    /// Returns the lookup count of `inode`, if present.
    pub fn nlookup(&self, inode: u64) -> Option<u64> {
        self.inner.get(&inode).map(|e| e.nlookup())
    }

    /// Registers `node` under `parent` and increments its lookup count.
    pub fn get_or_insert(&self, node: &Arc<Node>, parent: u64) -> u64 {
        self.register(node, parent, true)
    }

    /// Registers `node` under `parent` WITHOUT incrementing its lookup count.
    ///
    /// Per FUSE specification, returning entries from `readdir()` does not
    /// affect the lookup count.
    pub fn get_or_insert_no_lookup_inc(&self, node: &Arc<Node>, parent: u64) -> u64 {
        self.register(node, parent, false)
    }

    fn register(&self, node: &Arc<Node>, parent: u64, count_lookup: bool) -> u64 {
        let ino = node.id();
        let initial = u64::from(count_lookup);
        self.inner
            .entry(ino)
            .and_modify(|entry| {
                if entry.pinned {
                    // Directory identifiers win over colliding item hashes.
                    return;
                }
                // Same identifier means same rendered bytes; keep the newest node.
                entry.node = Arc::clone(node);
                entry.parent = parent;
                if count_lookup {
                    entry.inc_nlookup();
                }
            })
            .or_insert_with(|| InodeEntry::item(Arc::clone(node), parent, initial));
        ino
    }

    /// Decrements the lookup count for an inode.
    /// If the count reaches zero, the inode is evicted.
    /// Returns `true` if the inode was evicted.
    pub fn forget(&self, inode: u64, nlookup: u64) -> bool {
        self.inner
            .remove_if(&inode, |_, entry| {
                !entry.pinned && entry.dec_nlookup(nlookup) == 0
            })
            .is_some()
    }

    /// Drops unreferenced item entries of `parent` that are not in `keep`.
    ///
    /// Called after a feed refresh so that replaced items do not accumulate.
    /// Returns the number of evicted entries.
    pub fn prune_children(&self, parent: u64, keep: &HashSet<u64>) -> usize {
        let before = self.inner.len();
        self.inner.retain(|ino, entry| {
            entry.pinned || entry.parent != parent || entry.nlookup() > 0 || keep.contains(ino)
        });
        before.saturating_sub(self.inner.len())
    }

    /// Number of tracked inodes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
