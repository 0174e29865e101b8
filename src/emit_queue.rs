// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Outbound batching for decoded records (§4.9).
//!
//! Batching is purely a throughput optimization, never a correctness
//! requirement: with `batch_mode` disabled (the default) every push
//! drains immediately, giving the same per-item delivery a caller would
//! get with no queue at all. With `batch_mode` enabled, items accumulate
//! until either `emit_batch_threshold` items are queued or
//! `emit_interval` elapses since the last flush, whichever comes first.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct State<T> {
    items: Vec<T>,
    last_flush: Instant,
}

/// Batches items of type `T` (typically `Record` or `ParseError`) for
/// delivery to a downstream subscriber.
pub struct EmitQueue<T> {
    state: Mutex<State<T>>,
    batch_mode: bool,
    threshold: usize,
    interval: Duration,
}

impl<T> EmitQueue<T> {
    pub fn new(batch_mode: bool, threshold: usize, interval: Duration) -> Self {
        EmitQueue {
            state: Mutex::new(State {
                items: Vec::new(),
                last_flush: Instant::now(),
            }),
            batch_mode,
            threshold,
            interval,
        }
    }

    /// Push one item. Returns a drained batch immediately when batching
    /// is disabled or the threshold is reached; otherwise `None`.
    pub fn push(&self, item: T, now: Instant) -> Option<Vec<T>> {
        if !self.batch_mode {
            return Some(vec![item]);
        }

        let mut state = self.state.lock();
        state.items.push(item);
        if state.items.len() >= self.threshold {
            state.last_flush = now;
            return Some(std::mem::take(&mut state.items));
        }
        None
    }

    /// Called on the emit-interval timer: drains and returns any queued
    /// items if `interval` has elapsed since the last flush, regardless
    /// of whether the threshold was reached.
    pub fn flush_if_due(&self, now: Instant) -> Option<Vec<T>> {
        if !self.batch_mode {
            return None;
        }
        let mut state = self.state.lock();
        if state.items.is_empty() {
            return None;
        }
        if now.duration_since(state.last_flush) >= self.interval {
            state.last_flush = now;
            return Some(std::mem::take(&mut state.items));
        }
        None
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().items.len()
    }
}
