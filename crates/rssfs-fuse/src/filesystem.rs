//! FUSE filesystem serving the feed tree.
//!
//! This module implements the fuser `Filesystem` trait on top of the
//! in-memory node tree from `rssfs-core`.
//!
//! # Request handling
//!
//! | Operation | Behavior |
//! |-----------|----------|
//! | lookup | Resolves a child by name, increments nlookup via `get_or_insert` |
//! | forget/batch_forget | Decrements nlookup; item inodes are evicted at 0 |
//! | getattr | Synthesized from the node; never touches the network |
//! | opendir/releasedir | Allocates/drops a handle holding the listing snapshot |
//! | readdir | Offset 0 takes a snapshot; feeds refresh on the worker pool |
//! | open/read | Read-only access to the item's immutable bytes |
//! | access | `EROFS` for write access, success otherwise |
//! | statfs | Synthetic, read-only |
//! | write, create, mkdir, unlink, rmdir, rename, setattr, ... | `EROFS` |
//! | xattr operations | `ENOTSUP` |
//!
//! The request-level logic lives on [`RssFS`] as plain methods returning
//! [`FuseResult`], so it can be exercised without a kernel mount; the trait
//! implementation only translates results into replies.

use crate::config::MountConfig;
use crate::error::{FuseError, FuseResult};
use crate::handles::{DirHandleTable, DirListingEntry, Listing};
use crate::inode::{InodeTable, ROOT_INODE};
use crate::refresh::{RefreshPool, RefreshTask};
use bytes::Bytes;
use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use libc::c_int;
use rssfs_core::{Materializer, Node, Owner, Snapshot};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, trace, warn};

/// Block size for filesystem statistics.
const BLOCK_SIZE: u32 = 4096;

/// File permissions (r--r--r--).
const FILE_PERM: u16 = 0o444;

/// Directory permissions (r-xr-xr-x).
const DIR_PERM: u16 = 0o555;

/// Longest name reported by `statfs`.
const NAME_MAX: u32 = 255;

/// State shared between the request loop and refresh workers.
struct FsState {
    inodes: InodeTable,
    dir_handles: DirHandleTable,
    materializer: Materializer,
    owner: Owner,
    ttl: Duration,
}

impl FsState {
    fn make_attr(&self, node: &Node) -> FileAttr {
        let time = node.modified();
        let (kind, perm, nlink) = if node.is_dir() {
            (FileType::Directory, DIR_PERM, 2)
        } else {
            (FileType::RegularFile, FILE_PERM, 1)
        };
        let size = node.size();
        FileAttr {
            ino: node.id(),
            size,
            blocks: size.div_ceil(u64::from(BLOCK_SIZE)),
            atime: time,
            mtime: time,
            ctime: time,
            crtime: time,
            kind,
            perm,
            nlink,
            uid: self.owner.uid,
            gid: self.owner.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    fn node(&self, ino: u64) -> FuseResult<Arc<Node>> {
        self.inodes.get(ino).ok_or(FuseError::InvalidInode(ino))
    }

    fn dir(&self, ino: u64) -> FuseResult<Arc<Node>> {
        let node = self.node(ino)?;
        if node.is_dir() {
            Ok(node)
        } else {
            Err(FuseError::NotADirectory(ino))
        }
    }

    fn file(&self, ino: u64) -> FuseResult<Arc<Node>> {
        let node = self.node(ino)?;
        if node.is_dir() {
            Err(FuseError::IsADirectory(ino))
        } else {
            Ok(node)
        }
    }

    fn lookup(&self, parent: u64, name: &str) -> FuseResult<FileAttr> {
        let dir = self.dir(parent)?;
        let child = dir
            .lookup(name)
            .ok_or_else(|| FuseError::NotFound(name.to_string()))?;
        self.inodes.get_or_insert(&child, parent);
        Ok(self.make_attr(&child))
    }

    /// Current children of `dir`, refreshing them first for feeds.
    fn children(&self, ino: u64, dir: &Node) -> FuseResult<Snapshot> {
        if !dir.is_feed() {
            return Ok(dir.children().map(|c| c.snapshot()).unwrap_or_default());
        }
        match self.materializer.refresh(dir) {
            Ok(snapshot) => {
                let keep: HashSet<u64> = snapshot.iter().map(|n| n.id()).collect();
                let pruned = self.inodes.prune_children(ino, &keep);
                if pruned > 0 {
                    debug!(inode = ino, pruned, "Pruned stale item inodes");
                }
                Ok(snapshot)
            }
            Err(e) => {
                self.inodes.prune_children(ino, &HashSet::new());
                Err(e.into())
            }
        }
    }

    fn list(&self, ino: u64) -> FuseResult<Listing> {
        let dir = self.dir(ino)?;
        let children = self.children(ino, &dir)?;
        let parent = self.inodes.parent_of(ino).unwrap_or(ROOT_INODE);

        let mut entries = Vec::with_capacity(children.len() + 2);
        entries.push(DirListingEntry::new(ino, FileType::Directory, "."));
        entries.push(DirListingEntry::new(parent, FileType::Directory, ".."));
        for child in children.iter() {
            // Per FUSE, readdir entries do not count as lookups.
            let child_ino = self.inodes.get_or_insert_no_lookup_inc(child, ino);
            let kind = if child.is_dir() {
                FileType::Directory
            } else {
                FileType::RegularFile
            };
            entries.push(DirListingEntry::new(child_ino, kind, child.name()));
        }
        Ok(Arc::new(entries))
    }

    fn read_dir(&self, ino: u64, fh: u64, offset: i64) -> FuseResult<Listing> {
        if self.dir_handles.ino(fh)? != ino {
            return Err(FuseError::InvalidHandle(fh));
        }
        if offset != 0
            && let Some(listing) = self.dir_handles.listing(fh)?
        {
            return Ok(listing);
        }
        let listing = self.list(ino)?;
        self.dir_handles.set_listing(fh, Arc::clone(&listing))?;
        Ok(listing)
    }
}

/// Adds the entries of `listing` after `offset` until the reply buffer is full.
///
/// Offsets handed to the kernel are entry index + 1.
fn fill_dir(reply: &mut ReplyDirectory, listing: &[DirListingEntry], offset: i64) {
    let skip = usize::try_from(offset).unwrap_or(0);
    for (index, entry) in listing.iter().enumerate().skip(skip) {
        let next = i64::try_from(index + 1).unwrap_or(i64::MAX);
        if reply.add(entry.ino, next, entry.kind, &entry.name) {
            break;
        }
    }
}

/// A feed listing waiting for a refresh worker.
struct FeedListing {
    state: Arc<FsState>,
    ino: u64,
    fh: u64,
    offset: i64,
    reply: ReplyDirectory,
}

impl RefreshTask for FeedListing {
    fn run(self: Box<Self>) {
        let Self {
            state,
            ino,
            fh,
            offset,
            mut reply,
        } = *self;
        match state.read_dir(ino, fh, offset) {
            Ok(listing) => {
                fill_dir(&mut reply, &listing, offset);
                reply.ok();
            }
            Err(e) => {
                warn!(inode = ino, error = %e, "Feed listing failed");
                reply.error(e.to_errno());
            }
        }
    }

    fn reject(self: Box<Self>, error: FuseError) {
        self.reply.error(error.to_errno());
    }
}

/// FUSE filesystem exposing feeds as a read-only directory tree.
pub struct RssFS {
    state: Arc<FsState>,
    pool: RefreshPool,
}

impl std::fmt::Debug for RssFS {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RssFS")
            .field("inodes", &self.state.inodes.len())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl RssFS {
    /// Creates a filesystem serving the tree under `root`.
    ///
    /// Starts the refresh worker pool described by `config`.
    pub fn new(
        root: &Arc<Node>,
        materializer: Materializer,
        owner: Owner,
        config: &MountConfig,
    ) -> io::Result<Self> {
        let pool = RefreshPool::new(config.refresh_workers, config.refresh_queue)?;
        let state = Arc::new(FsState {
            inodes: InodeTable::with_tree(root),
            dir_handles: DirHandleTable::new(),
            materializer,
            owner,
            ttl: config.ttl,
        });
        Ok(Self { state, pool })
    }

    /// Attributes of `ino`.
    pub fn attr(&self, ino: u64) -> FuseResult<FileAttr> {
        let node = self.state.node(ino)?;
        Ok(self.state.make_attr(&node))
    }

    /// Resolves `name` in directory `parent`, counting one kernel lookup.
    pub fn lookup_child(&self, parent: u64, name: &str) -> FuseResult<FileAttr> {
        self.state.lookup(parent, name)
    }

    /// Lists directory `ino`, `.` and `..` first.
    ///
    /// Feed directories are re-materialized on every call.
    pub fn list(&self, ino: u64) -> FuseResult<Listing> {
        self.state.list(ino)
    }

    /// Opens directory `ino` and returns the handle.
    pub fn open_dir(&self, ino: u64) -> FuseResult<u64> {
        self.state.dir(ino)?;
        Ok(self.state.dir_handles.open(ino))
    }

    /// Listing for a `readdir` at `offset` on handle `fh`.
    ///
    /// Offset 0 takes a fresh snapshot; later offsets reuse it.
    pub fn read_dir(&self, ino: u64, fh: u64, offset: i64) -> FuseResult<Listing> {
        self.state.read_dir(ino, fh, offset)
    }

    /// Closes directory handle `fh`.
    pub fn close_dir(&self, fh: u64) -> FuseResult<()> {
        if self.state.dir_handles.close(fh) {
            Ok(())
        } else {
            Err(FuseError::InvalidHandle(fh))
        }
    }

    /// Checks that `ino` is a file that may be opened with `flags`.
    pub fn open_file(&self, ino: u64, flags: i32) -> FuseResult<()> {
        self.state.file(ino)?;
        if flags & libc::O_ACCMODE != libc::O_RDONLY {
            return Err(FuseError::ReadOnly);
        }
        Ok(())
    }

    /// Reads up to `size` bytes of item `ino` at `offset`.
    pub fn read_file(&self, ino: u64, offset: i64, size: u32) -> FuseResult<Bytes> {
        let node = self.state.file(ino)?;
        let offset = u64::try_from(offset).map_err(|_| FuseError::InvalidOffset(offset))?;
        let len = usize::try_from(size).unwrap_or(usize::MAX);
        Ok(node.read(offset, len))
    }

    /// Permission check for `access(2)`.
    pub fn check_access(&self, ino: u64, mask: i32) -> FuseResult<()> {
        self.state.node(ino)?;
        if mask & libc::W_OK != 0 {
            return Err(FuseError::ReadOnly);
        }
        Ok(())
    }

    /// Drops `nlookup` kernel references to `ino`. Returns whether it was evicted.
    pub fn forget_inode(&self, ino: u64, nlookup: u64) -> bool {
        self.state.inodes.forget(ino, nlookup)
    }

    /// The inode table.
    pub fn inodes(&self) -> &InodeTable {
        &self.state.inodes
    }

    /// Kernel cache TTL for attributes and entries.
    pub fn ttl(&self) -> Duration {
        self.state.ttl
    }

    /// Whether a `readdir` has to fetch the feed, and so belongs on the pool.
    ///
    /// True for a feed at offset 0, or at a later offset when the handle has
    /// not captured a listing yet.
    fn needs_refresh(&self, ino: u64, fh: u64, offset: i64) -> bool {
        if !self.state.inodes.get(ino).is_some_and(|n| n.is_feed()) {
            return false;
        }
        offset == 0 || matches!(self.state.dir_handles.listing(fh), Ok(None))
    }
}

impl Filesystem for RssFS {
    fn init(&mut self, _req: &Request<'_>, config: &mut KernelConfig) -> Result<(), c_int> {
        info!(
            inodes = self.state.inodes.len(),
            workers = self.pool.workers(),
            "FUSE filesystem initialized"
        );
        config.add_capabilities(fuser::consts::FUSE_ASYNC_READ).ok();
        Ok(())
    }

    fn destroy(&mut self) {
        let stats = self.pool.stats();
        info!(
            refreshes = stats.submitted.load(Ordering::Relaxed),
            completed = stats.completed.load(Ordering::Relaxed),
            rejected = stats.rejected.load(Ordering::Relaxed),
            "FUSE filesystem destroyed"
        );
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        // Every name we hand out is UTF-8.
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        trace!(parent, name, "lookup");

        match self.lookup_child(parent, name) {
            Ok(attr) => reply.entry(&self.state.ttl, &attr, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        trace!(inode = ino, nlookup, "forget");
        self.forget_inode(ino, nlookup);
    }

    fn batch_forget(&mut self, _req: &Request<'_>, nodes: &[fuser::fuse_forget_one]) {
        trace!(count = nodes.len(), "batch_forget");
        for node in nodes {
            self.forget_inode(node.nodeid, node.nlookup);
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        trace!(inode = ino, "getattr");
        match self.attr(ino) {
            Ok(attr) => reply.attr(&self.state.ttl, &attr),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        trace!(inode = ino, flags, "open");
        match self.open_file(ino, flags) {
            // Reads go straight to the node, so no per-open state is needed.
            Ok(()) => reply.opened(0, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        trace!(inode = ino, offset, size, "read");
        match self.read_file(ino, offset, size) {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn flush(&mut self, _req: &Request<'_>, _ino: u64, _fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        reply.ok();
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        reply.ok();
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        trace!(inode = ino, "opendir");
        match self.open_dir(ino) {
            Ok(fh) => reply.opened(fh, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    /// Read directory entries.
    ///
    /// A feed listing that has to fetch blocks on the network, so it is
    /// handed to the refresh pool together with the reply. Everything else is
    /// answered inline from the tree or from the handle's snapshot.
    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        trace!(inode = ino, fh, offset, "readdir");

        if self.needs_refresh(ino, fh, offset) {
            debug!(inode = ino, "readdir: dispatching feed refresh");
            self.pool.submit(Box::new(FeedListing {
                state: Arc::clone(&self.state),
                ino,
                fh,
                offset,
                reply,
            }));
            return;
        }

        match self.read_dir(ino, fh, offset) {
            Ok(listing) => {
                fill_dir(&mut reply, &listing, offset);
                reply.ok();
            }
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn releasedir(&mut self, _req: &Request<'_>, ino: u64, fh: u64, _flags: i32, reply: ReplyEmpty) {
        trace!(inode = ino, fh, "releasedir");
        match self.close_dir(fh) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: fuser::ReplyStatfs) {
        let files = self.state.inodes.len() as u64;
        reply.statfs(
            0,          // blocks
            0,          // bfree
            0,          // bavail
            files,      // files
            0,          // ffree
            BLOCK_SIZE, // bsize
            NAME_MAX,   // namelen
            BLOCK_SIZE, // frsize
        );
    }

    fn access(&mut self, _req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        trace!(inode = ino, mask, "access");
        match self.check_access(ino, mask) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    // ==================== Rejected Operations ====================

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn mknod(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn unlink(&mut self, _req: &Request<'_>, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn rmdir(&mut self, _req: &Request<'_>, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn symlink(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _link_name: &OsStr,
        _target: &Path,
        reply: ReplyEntry,
    ) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _newparent: u64,
        _newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn link(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _newparent: u64,
        _newname: &OsStr,
        reply: ReplyEntry,
    ) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _offset: i64,
        _data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: fuser::ReplyCreate,
    ) {
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn getxattr(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _name: &OsStr,
        _size: u32,
        reply: fuser::ReplyXattr,
    ) {
        // ENOTSUP (not ENODATA): xattrs are not supported at all.
        reply.error(FuseError::NotSupported.to_errno());
    }

    fn setxattr(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _name: &OsStr,
        _value: &[u8],
        _flags: i32,
        _position: u32,
        reply: ReplyEmpty,
    ) {
        reply.error(FuseError::NotSupported.to_errno());
    }

    fn listxattr(&mut self, _req: &Request<'_>, _ino: u64, _size: u32, reply: fuser::ReplyXattr) {
        reply.error(FuseError::NotSupported.to_errno());
    }

    fn removexattr(&mut self, _req: &Request<'_>, _ino: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.error(FuseError::NotSupported.to_errno());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rssfs_core::{
        ChildSet, FeedSource, FetchedFeed, HtmlRenderer, RawItem, RssfsError, RssfsResult,
    };

    struct OneFeed;

    impl FeedSource for OneFeed {
        fn fetch(&self, url: &str) -> RssfsResult<FetchedFeed> {
            if url != "http://x/feed" {
                return Err(RssfsError::fetch(url, "unreachable"));
            }
            Ok(FetchedFeed {
                title: "HN".to_string(),
                items: vec![RawItem {
                    title: "Post".to_string(),
                    content: "body".to_string(),
                    ..RawItem::default()
                }],
            })
        }
    }

    fn fs() -> (RssFS, u64, u64) {
        let now = SystemTime::now();
        let feed = Arc::new(Node::feed(
            "HN",
            "HN".to_string(),
            "http://x/feed".to_string(),
            now,
        ));
        let feed_ino = feed.id();
        let category = Arc::new(Node::category(
            "Tech",
            "Tech".to_string(),
            ChildSet::from_nodes([feed]),
            now,
        ));
        let category_ino = category.id();
        let root = Arc::new(Node::root(ChildSet::from_nodes([category]), now));
        let materializer = Materializer::new(Arc::new(OneFeed), Arc::new(HtmlRenderer));
        let config = MountConfig::default().refresh_workers(1).refresh_queue(1);
        let fs = RssFS::new(&root, materializer, Owner::new(1000, 100), &config).unwrap();
        (fs, category_ino, feed_ino)
    }

    #[test]
    fn test_constants() {
        assert_eq!(BLOCK_SIZE, 4096);
        assert_eq!(FILE_PERM, 0o444);
        assert_eq!(DIR_PERM, 0o555);
    }

    #[test]
    fn test_root_attr() {
        let (fs, _, _) = fs();
        let attr = fs.attr(ROOT_INODE).unwrap();
        assert_eq!(attr.ino, ROOT_INODE);
        assert_eq!(attr.kind, FileType::Directory);
        assert_eq!(attr.perm, DIR_PERM);
        assert_eq!(attr.size, 0);
        assert_eq!(attr.uid, 1000);
        assert_eq!(attr.gid, 100);
        assert_eq!(attr.atime, attr.mtime);
        assert_eq!(attr.ctime, attr.mtime);
    }

    #[test]
    fn test_unknown_inode() {
        let (fs, _, _) = fs();
        assert_eq!(fs.attr(42).unwrap_err().to_errno(), libc::ENOENT);
    }

    #[test]
    fn test_lookup_and_not_found() {
        let (fs, category_ino, _) = fs();
        let attr = fs.lookup_child(ROOT_INODE, "Tech").unwrap();
        assert_eq!(attr.ino, category_ino);
        let err = fs.lookup_child(ROOT_INODE, "Nope").unwrap_err();
        assert_eq!(err.to_errno(), libc::ENOENT);
    }

    #[test]
    fn test_listing_includes_dot_entries() {
        let (fs, category_ino, feed_ino) = fs();
        let listing = fs.list(category_ino).unwrap();
        let names: Vec<&str> = listing.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".", "..", "HN"]);
        assert_eq!(listing[0].ino, category_ino);
        assert_eq!(listing[1].ino, ROOT_INODE);
        assert_eq!(listing[2].ino, feed_ino);
    }

    #[test]
    fn test_file_operations() {
        let (fs, _, feed_ino) = fs();
        let listing = fs.list(feed_ino).unwrap();
        let post = &listing[2];
        assert_eq!(post.name, "Post.html");
        assert_eq!(post.kind, FileType::RegularFile);

        let attr = fs.attr(post.ino).unwrap();
        assert_eq!(attr.perm, FILE_PERM);

        assert!(fs.open_file(post.ino, libc::O_RDONLY).is_ok());
        assert_eq!(
            fs.open_file(post.ino, libc::O_WRONLY).unwrap_err().to_errno(),
            libc::EROFS
        );
        assert_eq!(
            fs.open_file(feed_ino, libc::O_RDONLY).unwrap_err().to_errno(),
            libc::EISDIR
        );

        let size = u32::try_from(attr.size).unwrap();
        let data = fs.read_file(post.ino, 0, size + 10).unwrap();
        assert_eq!(data.len() as u64, attr.size);
        assert!(fs.read_file(post.ino, i64::from(size) + 5, 10).unwrap().is_empty());
        assert_eq!(
            fs.read_file(post.ino, -1, 10).unwrap_err().to_errno(),
            libc::EINVAL
        );
    }

    #[test]
    fn test_access() {
        let (fs, _, feed_ino) = fs();
        assert!(fs.check_access(feed_ino, libc::R_OK | libc::X_OK).is_ok());
        assert_eq!(
            fs.check_access(feed_ino, libc::W_OK).unwrap_err().to_errno(),
            libc::EROFS
        );
        assert_eq!(fs.check_access(7, libc::R_OK).unwrap_err().to_errno(), libc::ENOENT);
    }

    #[test]
    fn test_dir_handle_lifecycle() {
        let (fs, category_ino, feed_ino) = fs();
        let fh = fs.open_dir(category_ino).unwrap();
        let first = fs.read_dir(category_ino, fh, 0).unwrap();
        let later = fs.read_dir(category_ino, fh, 2).unwrap();
        assert!(Arc::ptr_eq(&first, &later));
        fs.close_dir(fh).unwrap();
        assert_eq!(fs.close_dir(fh).unwrap_err().to_errno(), libc::EBADF);

        let listing = fs.list(feed_ino).unwrap();
        assert_eq!(
            fs.open_dir(listing[2].ino).unwrap_err().to_errno(),
            libc::ENOTDIR
        );
    }

    #[test]
    fn test_needs_refresh_only_for_uncaptured_feed_listings() {
        let (fs, category_ino, feed_ino) = fs();
        let fh = fs.open_dir(feed_ino).unwrap();
        assert!(fs.needs_refresh(feed_ino, fh, 0));
        // A later chunk with nothing captured still has to fetch.
        assert!(fs.needs_refresh(feed_ino, fh, 3));

        fs.read_dir(feed_ino, fh, 0).unwrap();
        assert!(!fs.needs_refresh(feed_ino, fh, 3));
        assert!(fs.needs_refresh(feed_ino, fh, 0));

        let dir_fh = fs.open_dir(category_ino).unwrap();
        assert!(!fs.needs_refresh(category_ino, dir_fh, 0));
        assert!(!fs.needs_refresh(category_ino, dir_fh, 3));
        assert!(!fs.needs_refresh(ROOT_INODE, dir_fh, 0));
    }

    #[test]
    fn test_read_dir_rejects_handle_of_other_directory() {
        let (fs, category_ino, feed_ino) = fs();
        let fh = fs.open_dir(category_ino).unwrap();
        assert_eq!(
            fs.read_dir(feed_ino, fh, 0).unwrap_err().to_errno(),
            libc::EBADF
        );
        assert!(fs.read_dir(category_ino, fh, 0).is_ok());
    }

    #[test]
    fn test_destroy_reports_idle_pool() {
        let (mut fs, _, _) = fs();
        fs.destroy();
        let stats = fs.pool.stats();
        assert_eq!(stats.submitted.load(Ordering::Relaxed), 0);
        assert_eq!(stats.rejected.load(Ordering::Relaxed), 0);
    }
}
