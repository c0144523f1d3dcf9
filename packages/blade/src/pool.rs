//! Persistent worker pool for per-level batch compression
//!
//! Each worker owns a single-slot mailbox. A dispatch splits one level into
//! contiguous sub-ranges, posts one per worker together with a one-shot reply
//! channel, and waits for every reply before returning. A failing sub-range
//! never cancels the others.
//!
//! The process-wide pool is created lazily by [`WorkerPool::global`] and torn
//! down explicitly with [`shutdown_global`] or by dropping a [`PoolGuard`].

use crate::compress::{block_range, compress_batch, Tweak, BLOCK_LEN, SUB_DIGEST_LEN};
use crate::{BladeError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, error, trace, warn};

/// Read-only level buffer shared with the workers during one dispatch
pub type SharedBuffer = Arc<Vec<u8>>;

static GLOBAL_POOL: OnceCell<WorkerPool> = OnceCell::new();

/// One contiguous sub-range of couples assigned to a worker
struct WorkItem {
    source: SharedBuffer,
    offset: usize,
    couples: usize,
    tweak: Tweak,
    reply: Sender<Result<Vec<u8>>>,
}

impl WorkItem {
    fn run(self) {
        let Self {
            source,
            offset,
            couples,
            tweak,
            reply,
        } = self;
        let result = compress_range(&source, offset, couples, tweak);
        // The dispatcher reclaims the buffer once every reply is in
        drop(source);
        let _ = reply.send(result);
    }
}

enum Message {
    Work(WorkItem),
    Shutdown,
}

struct Worker {
    id: usize,
    mailbox: Sender<Message>,
}

/// Fixed set of persistent compression workers
pub struct WorkerPool {
    workers: Vec<Worker>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl WorkerPool {
    /// Spawn a pool with `threads` workers (at least one)
    ///
    /// # Errors
    ///
    /// Returns `BladeError::WorkerFailure` if a worker thread cannot be spawned.
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let mut workers = Vec::with_capacity(threads);
        let mut handles = Vec::with_capacity(threads);

        for id in 0..threads {
            let (mailbox, inbox) = bounded(1);
            let handle = std::thread::Builder::new()
                .name(format!("blade-worker-{id}"))
                .spawn(move || worker_loop(id, &inbox))
                .map_err(|e| BladeError::worker(format!("failed to spawn worker {id}: {e}")))?;
            workers.push(Worker { id, mailbox });
            handles.push(handle);
        }

        debug!(threads, "Blade worker pool started");
        Ok(Self {
            workers,
            handles: Mutex::new(handles),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Spawn a pool sized to the detected hardware parallelism
    ///
    /// # Errors
    ///
    /// Returns `BladeError::WorkerFailure` if a worker thread cannot be spawned.
    pub fn with_available_parallelism() -> Result<Self> {
        let threads = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        Self::new(threads)
    }

    /// The process-wide pool, created on first call
    ///
    /// # Errors
    ///
    /// Returns `BladeError::WorkerFailure` if the pool has to be created and a
    /// worker thread cannot be spawned.
    pub fn global() -> Result<&'static Self> {
        GLOBAL_POOL.get_or_try_init(Self::with_available_parallelism)
    }

    /// Whether the process-wide pool has been created
    #[must_use]
    pub fn global_initialized() -> bool {
        GLOBAL_POOL.get().is_some()
    }

    /// Number of workers
    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Number of workers still accepting work; zero once shut down
    #[must_use]
    pub fn live_workers(&self) -> usize {
        if self.is_shut_down() {
            0
        } else {
            self.size()
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has run
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Stop every worker and wait for it to exit
    ///
    /// Work already posted is finished first. Only the first call has any
    /// effect.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        for worker in &self.workers {
            if worker.mailbox.send(Message::Shutdown).is_err() {
                warn!(worker = worker.id, "Blade worker already gone at shutdown");
            }
        }

        let handles = std::mem::take(
            &mut *self
                .handles
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if handle.join().is_err() {
                warn!("Blade worker panicked before shutdown");
            }
        }
        debug!(threads = self.workers.len(), "Blade worker pool stopped");
    }

    /// Compress `couples` blocks of `source`, starting at byte `offset`, into
    /// `dst` using every worker, and wait for all of them.
    ///
    /// # Errors
    ///
    /// Returns `BladeError::PoolShutDown` if the pool was shut down,
    /// `BladeError::InvalidBlockSize` if the source range does not fit in
    /// `source` or `dst` is too small, and
    /// `BladeError::WorkerFailure` if any sub-range failed. On failure every
    /// other sub-range has still run to completion.
    pub fn dispatch(
        &self,
        source: &SharedBuffer,
        offset: usize,
        couples: usize,
        dst: &mut [u8],
        tweak: Tweak,
    ) -> Result<()> {
        if self.is_shut_down() {
            return Err(BladeError::PoolShutDown);
        }
        // Range errors surface here, never inside a worker
        block_range(source.len(), offset, couples)?;
        let needed = couples * SUB_DIGEST_LEN;
        if dst.len() < needed {
            return Err(BladeError::InvalidBlockSize {
                expected: needed,
                actual: dst.len(),
            });
        }
        if couples == 0 {
            return Ok(());
        }

        let lanes = self.workers.len().min(couples);
        let per_lane = couples / lanes;
        let remainder = couples % lanes;
        trace!(couples, lanes, ?tweak, "Dispatching level");

        let mut failure: Option<BladeError> = None;
        let mut pending: Vec<(usize, usize, Receiver<Result<Vec<u8>>>)> =
            Vec::with_capacity(lanes);

        for (lane, worker) in self.workers.iter().take(lanes).enumerate() {
            let start = lane * per_lane;
            let count = if lane + 1 == lanes {
                per_lane + remainder
            } else {
                per_lane
            };
            let (reply, result) = bounded(1);
            let item = WorkItem {
                source: Arc::clone(source),
                offset: offset + start * BLOCK_LEN,
                couples: count,
                tweak,
                reply,
            };
            if worker.mailbox.send(Message::Work(item)).is_err() {
                error!(worker = worker.id, "Blade worker mailbox closed");
                failure.get_or_insert_with(|| {
                    BladeError::worker(format!("worker {} is not running", worker.id))
                });
                continue;
            }
            pending.push((start, count, result));
        }

        // Collect every reply even after a failure
        for (start, count, result) in pending {
            match result.recv() {
                Ok(Ok(output)) => {
                    let range = start * SUB_DIGEST_LEN..(start + count) * SUB_DIGEST_LEN;
                    dst[range].copy_from_slice(&output);
                }
                Ok(Err(e)) => {
                    error!(start, count, error = %e, "Blade sub-range failed");
                    failure.get_or_insert_with(|| {
                        BladeError::worker(format!("sub-range at couple {start} failed: {e}"))
                    });
                }
                Err(_) => {
                    error!(start, count, "Blade worker dropped its reply");
                    failure.get_or_insert_with(|| {
                        BladeError::worker(format!("sub-range at couple {start} was abandoned"))
                    });
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Shut down the process-wide pool if it was ever created
pub fn shutdown_global() {
    if let Some(pool) = GLOBAL_POOL.get() {
        pool.shutdown();
    }
}

/// Tears the process-wide pool down when dropped
///
/// Hold one in `main` so no worker outlives the program.
#[must_use = "the pool is shut down when the guard is dropped"]
#[derive(Debug)]
pub struct PoolGuard {
    _private: (),
}

impl PoolGuard {
    /// Create a guard for the process-wide pool
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for PoolGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        shutdown_global();
    }
}

fn worker_loop(id: usize, inbox: &Receiver<Message>) {
    trace!(worker = id, "Blade worker waiting for work");
    while let Ok(message) = inbox.recv() {
        match message {
            Message::Work(item) => item.run(),
            Message::Shutdown => break,
        }
    }
    trace!(worker = id, "Blade worker exiting");
}

fn compress_range(source: &[u8], offset: usize, couples: usize, tweak: Tweak) -> Result<Vec<u8>> {
    let src = &source[block_range(source.len(), offset, couples)?];

    let mut out = Vec::new();
    out.try_reserve_exact(couples * SUB_DIGEST_LEN)?;
    out.resize(couples * SUB_DIGEST_LEN, 0);
    compress_batch(src, couples, &mut out, tweak)?;
    Ok(out)
}
