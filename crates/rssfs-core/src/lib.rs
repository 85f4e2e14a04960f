//! Core model for rssfs: remote feeds as a read-only directory tree.
//!
//! The tree has four levels: the root, one directory per configured
//! category, one directory per feed, and one file per feed item.
//!
//! - [`builder::TreeBuilder`] fetches every feed concurrently at startup and
//!   assembles the category and feed directories.
//! - [`materialize::Materializer`] fetches, renders and names a feed's items
//!   whenever its directory is listed, swapping the new set in atomically.
//! - [`names`] and [`id`] provide the deterministic naming and addressing
//!   that keep names and identifiers stable across refreshes.
//!
//! # Usage
//!
//! ```ignore
//! use rssfs_core::{Config, HtmlRenderer, HttpFeedSource, Materializer, TreeBuilder};
//!
//! let config = Config::load(&path)?;
//! let source = Arc::new(HttpFeedSource::new());
//! let root = TreeBuilder::new(source.clone()).build(&config.categories)?;
//! let materializer = Materializer::new(source, Arc::new(HtmlRenderer));
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod feed;
pub mod id;
pub mod materialize;
pub mod names;
pub mod owner;
pub mod render;
pub mod tree;

pub use builder::TreeBuilder;
pub use config::{CategoryConfig, Config, FeedConfig};
pub use error::{RssfsError, RssfsResult};
pub use feed::{FeedSource, FetchedFeed, HttpFeedSource, RawItem};
pub use id::{identify, ROOT_ID};
pub use materialize::Materializer;
pub use owner::Owner;
pub use render::{HtmlRenderer, Rendered, Renderer};
pub use tree::{ChildSet, Children, Node, NodeKind, Snapshot};
