//! Error handling and mapping for the FUSE filesystem.
//!
//! This module provides conversion from tree and feed errors to POSIX error
//! codes that FUSE can return to the kernel.

use rssfs_core::RssfsError;
use std::io;
use thiserror::Error;

/// FUSE-specific errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FuseError {
    /// Feed fetch, parse or configuration error (boxed to reduce enum size).
    #[error("Feed operation failed: {0}")]
    Feed(Box<RssfsError>),

    /// Invalid inode.
    #[error("Invalid inode: {0}")]
    InvalidInode(u64),

    /// Invalid directory handle.
    #[error("Invalid file handle: {0}")]
    InvalidHandle(u64),

    /// No entry with this name in the directory.
    #[error("No such entry: {0}")]
    NotFound(String),

    /// Directory operation on a file.
    #[error("Not a directory: {0}")]
    NotADirectory(u64),

    /// File operation on a directory.
    #[error("Is a directory: {0}")]
    IsADirectory(u64),

    /// Negative read offset.
    #[error("Invalid offset: {0}")]
    InvalidOffset(i64),

    /// Any attempt to modify the tree.
    #[error("Read-only filesystem")]
    ReadOnly,

    /// Refresh queue is full; the kernel should retry.
    #[error("Refresh queue full")]
    Busy,

    /// Operation not supported.
    #[error("Operation not supported")]
    NotSupported,
}

impl FuseError {
    /// Converts this error to a libc error code for FUSE.
    pub fn to_errno(&self) -> i32 {
        match self {
            FuseError::Feed(e) => feed_error_to_errno(e.as_ref()),
            FuseError::InvalidInode(_) | FuseError::NotFound(_) => libc::ENOENT,
            FuseError::InvalidHandle(_) => libc::EBADF,
            FuseError::NotADirectory(_) => libc::ENOTDIR,
            FuseError::IsADirectory(_) => libc::EISDIR,
            FuseError::InvalidOffset(_) => libc::EINVAL,
            FuseError::ReadOnly => libc::EROFS,
            FuseError::Busy => libc::EAGAIN,
            FuseError::NotSupported => libc::ENOTSUP,
        }
    }
}

/// Converts a feed error to a libc error code.
///
/// Remote and configuration failures all surface as `EIO` on the one request
/// that hit them.
pub fn feed_error_to_errno(e: &RssfsError) -> i32 {
    match e {
        RssfsError::Io(io) => io_error_to_errno(io),
        RssfsError::Fetch { .. }
        | RssfsError::Parse { .. }
        | RssfsError::Config { .. }
        | RssfsError::Identity(_) => libc::EIO,
    }
}

/// Converts an IO error to a libc error code, defaulting to `EIO`.
pub fn io_error_to_errno(e: &io::Error) -> i32 {
    e.raw_os_error().unwrap_or(libc::EIO)
}

/// Result type for FUSE operations.
pub type FuseResult<T> = Result<T, FuseError>;

/// Extension trait to convert errors to errno.
pub trait ToErrno {
    /// Converts this error to a libc error code.
    fn to_errno(&self) -> i32;
}

impl ToErrno for RssfsError {
    fn to_errno(&self) -> i32 {
        feed_error_to_errno(self)
    }
}

impl ToErrno for io::Error {
    fn to_errno(&self) -> i32 {
        io_error_to_errno(self)
    }
}

// Manual From implementation to box errors for smaller enum size
impl From<RssfsError> for FuseError {
    fn from(e: RssfsError) -> Self {
        FuseError::Feed(Box::new(e))
    }
}
