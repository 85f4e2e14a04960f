//! Directory handles.
//!
//! `opendir` allocates a handle; the first `readdir` on it captures the
//! directory's listing and every later chunk is served from that capture, so
//! a refresh landing mid-listing cannot shift offsets under the kernel.

use crate::error::{FuseError, FuseResult};
use dashmap::DashMap;
use fuser::FileType;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// One row of a directory listing, `.` and `..` included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirListingEntry {
    /// Inode number.
    pub ino: u64,
    /// File type.
    pub kind: FileType,
    /// Entry name.
    pub name: String,
}

impl DirListingEntry {
    /// Creates a listing entry.
    pub fn new(ino: u64, kind: FileType, name: impl Into<String>) -> Self {
        Self {
            ino,
            kind,
            name: name.into(),
        }
    }
}

/// A listing captured for one open directory handle.
pub type Listing = Arc<Vec<DirListingEntry>>;

#[derive(Debug)]
struct DirHandle {
    ino: u64,
    listing: Option<Listing>,
}

/// Thread-safe table of open directory handles.
///
/// Handle IDs start at 1; 0 is what `open` hands out for files.
#[derive(Debug)]
pub struct DirHandleTable {
    handles: DashMap<u64, DirHandle>,
    next_id: AtomicU64,
}

impl Default for DirHandleTable {
    fn default() -> Self {
        Self {
            handles: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl DirHandleTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a handle on directory `ino`.
    pub fn open(&self, ino: u64) -> u64 {
        loop {
            let fh = self.next_id.fetch_add(1, Ordering::Relaxed);
            if fh == 0 || self.handles.contains_key(&fh) {
                continue;
            }
            self.handles.insert(fh, DirHandle { ino, listing: None });
            return fh;
        }
    }

    /// Directory inode the handle was opened on.
    pub fn ino(&self, fh: u64) -> FuseResult<u64> {
        self.handles
            .get(&fh)
            .map(|h| h.ino)
            .ok_or(FuseError::InvalidHandle(fh))
    }

    /// Captured listing, if a first `readdir` has run.
    pub fn listing(&self, fh: u64) -> FuseResult<Option<Listing>> {
        self.handles
            .get(&fh)
            .map(|h| h.listing.clone())
            .ok_or(FuseError::InvalidHandle(fh))
    }

    /// Stores the listing for later chunks, replacing any earlier capture.
    pub fn set_listing(&self, fh: u64, listing: Listing) -> FuseResult<()> {
        let mut handle = self
            .handles
            .get_mut(&fh)
            .ok_or(FuseError::InvalidHandle(fh))?;
        handle.listing = Some(listing);
        Ok(())
    }

    /// Closes a handle. Returns `false` if it was not open.
    pub fn close(&self, fh: u64) -> bool {
        self.handles.remove(&fh).is_some()
    }

    /// Number of open handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no handles are open.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
