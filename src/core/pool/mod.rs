//! # Pool Module
//!
//! Runs one computation per file on a bounded rayon pool and hands results
//! back in completion order.
//!
//! ## Guarantees
//! - A failing or panicking computation only fails its own file
//! - Results are consumed by the calling thread only
//! - After cancellation, jobs that have not started are dropped and the
//!   result iterator ends without waiting for running jobs, once the results
//!   already completed have been handed out
//!
//! ## Example
//! ```rust,ignore
//! let pool = WorkerPool::new(None, token)?;
//! for result in pool.run(files, |path| fingerprint(path)) {
//!     match result.outcome { .. }
//! }
//! ```

use crate::core::interrupt::CancellationToken;
use crate::error::{Result, ToolError};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How often a waiting consumer checks for cancellation
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The computed property of one file, or why it failed
#[derive(Debug)]
pub struct WorkResult<T> {
    pub path: PathBuf,
    pub outcome: Result<T>,
}

enum Completion<T> {
    Done(WorkResult<T>),
    Discarded,
}

/// Bounded pool of worker threads
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    cancel: CancellationToken,
    threads: usize,
}

impl WorkerPool {
    /// Create a pool with `jobs` threads, or the host's parallelism
    pub fn new(jobs: Option<usize>, cancel: CancellationToken) -> Result<Self> {
        let threads = jobs.filter(|&j| j > 0).unwrap_or_else(default_parallelism);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("worker-{}", i))
            .build()
            .map_err(|e| ToolError::Config(format!("cannot start worker pool: {}", e)))?;

        debug!(threads, "worker pool started");
        Ok(Self {
            pool,
            cancel,
            threads,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Submit `work` for every file, results arrive as they complete
    pub fn run<T, F>(&self, files: Vec<PathBuf>, work: F) -> Completions<T>
    where
        T: Send + 'static,
        F: Fn(&Path) -> Result<T> + Send + Sync + 'static,
    {
        let (sender, receiver) = unbounded();
        let work = Arc::new(work);
        let total = files.len();

        for path in files {
            let sender = sender.clone();
            let work = Arc::clone(&work);
            let cancel = self.cancel.clone();

            self.pool.spawn(move || {
                if cancel.is_cancelled() {
                    let _ = sender.send(Completion::Discarded);
                    return;
                }
                let outcome = match panic::catch_unwind(AssertUnwindSafe(|| work(&path))) {
                    Ok(outcome) => outcome,
                    Err(payload) => Err(ToolError::Panicked(panic_message(payload))),
                };
                // The consumer may be gone after an interrupt
                let _ = sender.send(Completion::Done(WorkResult { path, outcome }));
            });
        }

        Completions {
            receiver,
            total,
            remaining: total,
            discarded: 0,
            cancel: self.cancel.clone(),
        }
    }
}

/// Iterator over results in completion order
pub struct Completions<T> {
    receiver: Receiver<Completion<T>>,
    total: usize,
    remaining: usize,
    discarded: usize,
    cancel: CancellationToken,
}

impl<T> Completions<T> {
    /// Number of submitted files
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether iteration stopped because of a cancellation
    pub fn interrupted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Jobs dropped before they started
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl<T> Iterator for Completions<T> {
    type Item = WorkResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            if self.cancel.is_cancelled() {
                return self.drain();
            }
            match self.receiver.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(Completion::Done(result)) => {
                    self.remaining -= 1;
                    return Some(result);
                }
                Ok(Completion::Discarded) => {
                    self.remaining -= 1;
                    self.discarded += 1;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => self.remaining = 0,
            }
        }
        None
    }
}

impl<T> Completions<T> {
    /// Hand out the results already sent, then give up on the rest
    fn drain(&mut self) -> Option<WorkResult<T>> {
        while let Ok(completion) = self.receiver.try_recv() {
            self.remaining = self.remaining.saturating_sub(1);
            match completion {
                Completion::Done(result) => return Some(result),
                Completion::Discarded => self.discarded += 1,
            }
        }
        self.discarded += self.remaining;
        self.remaining = 0;
        None
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
