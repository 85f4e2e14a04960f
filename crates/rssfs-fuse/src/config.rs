//! Mount configuration for the FUSE filesystem.

use std::time::Duration;

/// Default kernel cache TTL for attributes and entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(1);

/// Default number of feed refresh worker threads.
pub const DEFAULT_REFRESH_WORKERS: usize = 8;

/// Default capacity of the refresh submission queue.
pub const DEFAULT_REFRESH_QUEUE: usize = 64;

/// Filesystem name shown in the mount table.
pub const FS_NAME: &str = "rssfs";

/// Configuration options for the FUSE filesystem.
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// How long the kernel may cache attributes and lookups.
    ///
    /// Kept short because feed directories change on every listing.
    pub ttl: Duration,

    /// Number of threads serving feed directory refreshes.
    ///
    /// Each refresh blocks on the network; this bounds how many run at once.
    pub refresh_workers: usize,

    /// Pending refreshes beyond which `readdir` replies `EAGAIN`.
    pub refresh_queue: usize,

    /// Let users other than the mounting user access the mount.
    pub allow_other: bool,

    /// Filesystem name for the mount table.
    pub fs_name: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            refresh_workers: DEFAULT_REFRESH_WORKERS,
            refresh_queue: DEFAULT_REFRESH_QUEUE,
            allow_other: false,
            fs_name: FS_NAME.to_string(),
        }
    }
}

impl MountConfig {
    /// Sets the kernel cache TTL.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the number of refresh workers (minimum 1).
    #[must_use]
    pub fn refresh_workers(mut self, workers: usize) -> Self {
        self.refresh_workers = workers.max(1);
        self
    }

    /// Sets the refresh queue capacity (minimum 1).
    #[must_use]
    pub fn refresh_queue(mut self, capacity: usize) -> Self {
        self.refresh_queue = capacity.max(1);
        self
    }

    /// Enables or disables `allow_other`.
    #[must_use]
    pub fn allow_other(mut self, allow: bool) -> Self {
        self.allow_other = allow;
        self
    }
}
