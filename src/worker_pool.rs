// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-size worker-thread pool with round-robin dispatch (§4.5).
//!
//! Each registered decoder/pair owns its own pool; `dispatch_next`
//! advances an internal cursor `(i+1) mod N` so that packets handed to
//! one type's pool fan out evenly across its `N` workers. There is no
//! ordering guarantee across jobs of the same type once more than one
//! worker is in play — only within a single worker's own queue.

use crossbeam::channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

/// Per-worker counters. Relaxed atomics: consumers only need monotonic
/// snapshots for observability, not a synchronization point.
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    pub jobs_processed: AtomicU64,
    pub jobs_dropped: AtomicU64,
}

impl WorkerMetrics {
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.jobs_processed.load(Ordering::Relaxed),
            self.jobs_dropped.load(Ordering::Relaxed),
        )
    }
}

struct Worker {
    sender: Sender<Box<dyn FnOnce() + Send>>,
    handle: Option<JoinHandle<()>>,
    metrics: Arc<WorkerMetrics>,
}

/// A fixed-size pool of dedicated OS threads, each with its own bounded
/// job queue. `dispatch` routes a job to `key % pool_size`'s queue,
/// giving per-key FIFO ordering without a single shared-queue bottleneck.
pub struct WorkerPool {
    workers: Vec<Worker>,
    stop_flag: Arc<AtomicBool>,
    cursor: AtomicUsize,
}

const QUEUE_DEPTH: usize = 256;

impl WorkerPool {
    /// Spawn `size` worker threads, each blocked on its own job channel.
    pub fn new(size: usize) -> Self {
        assert!(size >= 1, "worker pool size must be at least 1");
        let stop_flag = Arc::new(AtomicBool::new(false));
        let workers = (0..size)
            .map(|id| spawn_worker(id, Arc::clone(&stop_flag)))
            .collect();
        WorkerPool {
            workers,
            stop_flag,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Enqueue `job` on the worker at `idx % pool size`. If that worker's
    /// queue is full the job is dropped and counted in its `jobs_dropped`
    /// metric rather than blocking the caller — matching the framer's
    /// non-blocking hot path.
    pub fn dispatch_at<F>(&self, idx: usize, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let worker_id = idx % self.workers.len();
        let worker = &self.workers[worker_id];
        if worker.sender.try_send(Box::new(job)).is_err() {
            worker.metrics.jobs_dropped.fetch_add(1, Ordering::Relaxed);
            crate::logging::worker_queue_full(worker_id);
        }
    }

    /// Enqueue `job` on the next worker in round-robin rotation
    /// (`(i+1) mod N`, §4.5). Every pool owns exactly one rotating
    /// cursor, advanced with a relaxed fetch-add — a worker may
    /// occasionally be skipped under concurrent dispatch from multiple
    /// producers, but the rotation stays uniform over time.
    pub fn dispatch_next<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        self.dispatch_at(idx, job);
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn metrics(&self, worker_id: usize) -> &WorkerMetrics {
        &self.workers[worker_id].metrics
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        for worker in &mut self.workers {
            // Dropping the sender (implicitly, on pool drop) unblocks any
            // worker parked on an empty recv; explicit join ensures we
            // don't leak a detached thread on pool teardown.
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

fn spawn_worker(id: usize, stop_flag: Arc<AtomicBool>) -> Worker {
    let (sender, receiver): (Sender<Box<dyn FnOnce() + Send>>, Receiver<_>) = bounded(QUEUE_DEPTH);
    let metrics = Arc::new(WorkerMetrics::default());
    let metrics_clone = Arc::clone(&metrics);

    let handle = thread::Builder::new()
        .name(format!("pulseframe-worker-{id}"))
        .spawn(move || {
            crate::logging::worker_spawned(id);
            while !stop_flag.load(Ordering::Relaxed) {
                match receiver.recv_timeout(std::time::Duration::from_millis(100)) {
                    Ok(job) => {
                        job();
                        metrics_clone.jobs_processed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(crossbeam::channel::RecvTimeoutError::Timeout) => continue,
                    Err(crossbeam::channel::RecvTimeoutError::Disconnected) => break,
                }
            }
            crate::logging::worker_shutdown(id);
        })
        .expect("failed to spawn worker thread");

    Worker {
        sender,
        handle: Some(handle),
        metrics,
    }
}
