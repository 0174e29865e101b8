// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Split-waveform reassembly (§4.7).
//!
//! A `SplitUpWaveform` packet carries a `HAS_BEGIN`/`HAS_END` pair of
//! flag bits in its header `flags` byte. Fragments for the same
//! `(channelId, rtc)` pair arrive in order (the worker pool binds one
//! wire type to one worker, so FIFO per type is guaranteed) and are
//! concatenated until the fragment carrying `HAS_END` closes the
//! sequence. A bucket that sees no new fragment within the configured
//! idle window is evicted and reported as [`ParseError::ReassemblyTimeout`].

use crate::decode::WaveformRecord;
use crate::error::ParseError;
use crate::wire::{split_flags, Header};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Bucket {
    header: Header,
    decimation_factor: u16,
    array: Vec<i16>,
    fragment_count: usize,
    last_seen: Instant,
}

/// Accumulates split-waveform fragments keyed by `(channel_id, rtc)` and
/// emits a merged [`WaveformRecord`] once the closing fragment arrives.
pub struct SplitReassembler {
    buckets: Mutex<HashMap<(u16, u64), Bucket>>,
    idle_timeout: Duration,
}

impl SplitReassembler {
    pub fn new(idle_timeout: Duration) -> Self {
        SplitReassembler {
            buckets: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Feed one fragment. Returns the merged record once `HAS_END` closes
    /// the sequence for its key; `None` while still accumulating.
    pub fn push(&self, fragment: &WaveformRecord, now: Instant) -> Option<WaveformRecord> {
        let key = (fragment.header.channel_id, fragment.header.rtc);
        let has_begin = fragment.header.flags & split_flags::HAS_BEGIN != 0;
        let has_end = fragment.header.flags & split_flags::HAS_END != 0;

        let mut buckets = self.buckets.lock();

        if has_begin {
            buckets.insert(
                key,
                Bucket {
                    header: fragment.header,
                    decimation_factor: fragment.decimation_factor,
                    array: fragment.array.clone(),
                    fragment_count: 1,
                    last_seen: now,
                },
            );
        } else if let Some(bucket) = buckets.get_mut(&key) {
            bucket.array.extend_from_slice(&fragment.array);
            bucket.fragment_count += 1;
            bucket.last_seen = now;
        } else {
            // A Middle/End fragment with no open Begin: nothing to
            // append to. Drop it silently — the bucket was likely
            // already evicted by an idle timeout.
            return None;
        }

        if has_end {
            let bucket = buckets.remove(&key).expect("key was just inserted or updated above");
            let raw = WaveformRecord::encode(
                bucket.header.device_id,
                bucket.header.packet_type,
                split_flags::FULL_PACKET,
                bucket.header.channel_id,
                bucket.header.rtc,
                bucket.decimation_factor,
                &bucket.array,
                0,
            );
            return Some(WaveformRecord {
                header: Header {
                    flags: split_flags::FULL_PACKET,
                    ..bucket.header
                },
                decimation_factor: bucket.decimation_factor,
                array: bucket.array,
                raw,
            });
        }

        None
    }

    /// Remove and report every bucket that has not seen a fragment within
    /// `idle_timeout` of `now`.
    pub fn evict_idle(&self, now: Instant) -> Vec<ParseError> {
        let mut buckets = self.buckets.lock();
        let timeout = self.idle_timeout;
        let stale: Vec<(u16, u64)> = buckets
            .iter()
            .filter(|(_, bucket)| now.duration_since(bucket.last_seen) >= timeout)
            .map(|(key, _)| *key)
            .collect();

        stale
            .into_iter()
            .map(|key| {
                let bucket = buckets.remove(&key).expect("key came from the same map iteration");
                crate::logging::reassembly_timeout(key.0, key.1, bucket.fragment_count);
                ParseError::ReassemblyTimeout {
                    channel_id: key.0,
                    rtc: key.1,
                }
            })
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.buckets.lock().len()
    }
}
