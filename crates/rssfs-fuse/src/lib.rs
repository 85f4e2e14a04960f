//! FUSE filesystem for RSS and Atom feeds.
//!
//! This crate mounts the feed tree built by `rssfs-core` as a read-only
//! filesystem: one directory per category, one per feed, one HTML file per
//! feed item.
//!
//! # Features
//!
//! - Stable inode numbers derived from category names, feed titles and item
//!   content, so refreshed items keep their inode when nothing changed
//! - Feed directories re-fetched on every listing, on a bounded worker pool
//!   so the request loop never blocks on the network
//! - Listings snapshotted per directory handle, never torn across `readdir`
//!   chunks
//!
//! # Usage
//!
//! ```ignore
//! use rssfs_fuse::{MountConfig, RssFS, mount};
//!
//! let config = MountConfig::default();
//! let fs = RssFS::new(&root, materializer, owner, &config)?;
//! let handle = mount(fs, &mountpoint, &config)?;
//! // ...
//! handle.unmount();
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod handles;
pub mod inode;
pub mod refresh;

pub use backend::{RssMountHandle, mount, mount_options};
pub use config::MountConfig;
pub use error::{FuseError, FuseResult, ToErrno};
pub use filesystem::RssFS;
pub use handles::{DirHandleTable, DirListingEntry, Listing};
pub use inode::{InodeEntry, InodeTable, ROOT_INODE};
pub use refresh::{RefreshPool, RefreshStats, RefreshTask};
