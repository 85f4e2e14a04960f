//! Bounded worker pool for feed directory refreshes.
//!
//! Listing a feed directory blocks on the network. FUSE callbacks hand the
//! refresh to this pool together with their reply object and return at once;
//! a worker performs the fetch and replies. When the queue is full the task
//! is rejected on the caller's thread, which replies `EAGAIN`.

use crate::error::FuseError;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Work queued on the pool.
///
/// Exactly one of the two methods is called for every submitted task.
pub trait RefreshTask: Send + 'static {
    /// Runs the task on a worker thread.
    fn run(self: Box<Self>);

    /// Called instead of `run` when the task could not be queued.
    fn reject(self: Box<Self>, error: FuseError);
}

/// Counters for the pool.
#[derive(Debug, Default)]
pub struct RefreshStats {
    /// Tasks accepted.
    pub submitted: AtomicU64,
    /// Tasks run to completion.
    pub completed: AtomicU64,
    /// Tasks rejected because the queue was full.
    pub rejected: AtomicU64,
}

/// Fixed set of threads draining a bounded task queue.
pub struct RefreshPool {
    submit_tx: Option<Sender<Box<dyn RefreshTask>>>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<RefreshStats>,
    capacity: usize,
}

impl std::fmt::Debug for RefreshPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshPool")
            .field("workers", &self.workers.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl RefreshPool {
    /// Starts `workers` threads sharing a queue of `capacity` pending tasks.
    pub fn new(workers: usize, capacity: usize) -> io::Result<Self> {
        let workers = workers.max(1);
        let capacity = capacity.max(1);
        let (submit_tx, submit_rx) = bounded(capacity);
        let stats = Arc::new(RefreshStats::default());

        let handles = (0..workers)
            .map(|worker_id| {
                let rx = submit_rx.clone();
                let stats = Arc::clone(&stats);
                thread::Builder::new()
                    .name(format!("rssfs-refresh-{worker_id}"))
                    .spawn(move || worker_loop(worker_id, &rx, &stats))
            })
            .collect::<io::Result<Vec<_>>>()?;

        info!(workers, capacity, "Refresh pool started");

        Ok(Self {
            submit_tx: Some(submit_tx),
            workers: handles,
            stats,
            capacity,
        })
    }

    /// Queues `task` without blocking.
    ///
    /// If the queue is full the task is rejected with [`FuseError::Busy`]
    /// before this returns. Returns whether the task was queued.
    pub fn submit(&self, task: Box<dyn RefreshTask>) -> bool {
        let Some(tx) = &self.submit_tx else {
            task.reject(FuseError::Busy);
            return false;
        };
        match tx.try_send(task) {
            Ok(()) => {
                self.stats.submitted.fetch_add(1, Ordering::Relaxed);
                trace!("Refresh task queued");
                true
            }
            Err(TrySendError::Full(task)) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(capacity = self.capacity, "Refresh queue full, rejecting request");
                task.reject(FuseError::Busy);
                false
            }
            Err(TrySendError::Disconnected(task)) => {
                task.reject(FuseError::Busy);
                false
            }
        }
    }

    /// Pool counters.
    pub fn stats(&self) -> &RefreshStats {
        &self.stats
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for RefreshPool {
    fn drop(&mut self) {
        // Closing the channel lets workers drain what is queued and exit.
        self.submit_tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        debug!("Refresh pool stopped");
    }
}

fn worker_loop(worker_id: usize, rx: &Receiver<Box<dyn RefreshTask>>, stats: &RefreshStats) {
    trace!(worker_id, "Refresh worker started");
    for task in rx {
        task.run();
        stats.completed.fetch_add(1, Ordering::Relaxed);
    }
    trace!(worker_id, "Refresh worker exiting");
}
