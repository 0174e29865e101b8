// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structured log sites for the ingest pipeline.
//!
//! The crate logs through the `log` facade — it never owns a backend.
//! The embedding application chooses a subscriber (`env_logger`,
//! `simple_logger`, ...); tests enable one behind the `logging` feature
//! only for their own diagnostic output.
//!
//! This module is a thin wrapper around `log::{debug, info, warn}` that
//! keeps the field names of each log site consistent across call sites,
//! rather than a reimplementation of level filtering (the `log` crate
//! already does that).

/// Log a framer recovery event: bytes discarded while resynchronizing
/// after a `Malformed` verdict.
#[inline]
pub(crate) fn flush_broken(device_id: u32, discarded: usize, resync_offset: usize) {
    log::warn!(
        "device {device_id}: flush_broken discarded {discarded} bytes, resynced at offset {resync_offset}"
    );
}

/// Log a split-waveform reassembly bucket eviction.
#[inline]
pub(crate) fn reassembly_timeout(channel_id: u16, rtc: u64, fragments_lost: usize) {
    log::warn!(
        "split reassembly timeout: channel={channel_id} rtc={rtc} fragments_lost={fragments_lost}"
    );
}

/// Log a dropped record due to channel data that does not evenly divide.
#[inline]
pub(crate) fn malformed_channel_data(array_len: usize, active_channels: usize) {
    log::warn!(
        "malformed channel data: array_len={array_len} not divisible by active_channels={active_channels}"
    );
}

/// Log worker thread lifecycle events.
#[inline]
pub(crate) fn worker_spawned(worker_index: usize) {
    log::info!("worker pool: worker {worker_index} started");
}

#[inline]
pub(crate) fn worker_shutdown(worker_index: usize) {
    log::info!("worker pool: worker {worker_index} shut down");
}

/// Log a dispatch dropped because a worker's bounded queue was full.
#[inline]
pub(crate) fn worker_queue_full(worker_index: usize) {
    log::warn!("worker pool: worker {worker_index} queue full, job dropped");
}

/// Log a decoder being given its own worker pool for a given wire packet
/// type (§4.5).
#[inline]
pub(crate) fn parser_registered(packet_type: u8, pool_size: usize) {
    log::info!("registered parser for packet type {packet_type} with a {pool_size}-worker pool");
}

/// Log a `SizeProbe` malformed verdict. High frequency; debug-only.
#[inline]
pub(crate) fn probe_malformed(packet_type: u8, offset: usize, reason: &str) {
    log::debug!("probe malformed for type {packet_type} at offset {offset}: {reason}");
}

/// Log a measurement-stopped transition observed by the buffer.
#[inline]
pub(crate) fn measurement_stopped(device_id: u32, stopped: bool) {
    log::info!("device {device_id}: measurement_stopped set to {stopped}");
}

/// Log one dispatched slice: the size of the pool it was round-robined
/// onto and whether it was paired. Fires on every framed packet, so it's
/// compiled out unless the `trace` feature asks for it — even at `trace`
/// level this would otherwise dominate the log of a busy device.
#[cfg(feature = "trace")]
#[inline]
pub(crate) fn dispatch_trace(packet_type: u8, pool_size: usize, paired: bool) {
    log::trace!("dispatch: type={packet_type} pool_size={pool_size} paired={paired}");
}

#[cfg(not(feature = "trace"))]
#[inline]
pub(crate) fn dispatch_trace(_packet_type: u8, _pool_size: usize, _paired: bool) {}
