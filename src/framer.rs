// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stream framer — walks a per-device rolling byte buffer and identifies
//! packet boundaries without copying (§4.3, §4.10).
//!
//! The framer is the self-synchronizing half of the pipeline: it never
//! assumes the stream starts aligned on a header, and it is the only
//! place bytes can be lost (via [`Framer::flush_broken`]).

use crate::logging;
use crate::sizeprobe::{self, Verdict};
use crate::slice::{PacketSlice, SharedBytes};
use crate::wire::{Header, PacketTypeRegistry, HEADER_SIZE};

/// Framer state machine (§4.10).
///
/// `Scanning -> WaitingForBytes` on `NeedMore`.
/// `WaitingForBytes -> Scanning` on `push`.
/// `Scanning -> Recovering` on `Malformed`.
/// `Recovering -> Scanning` as soon as `flush_broken` advances past the
/// bad region.
///
/// There is no terminal state; a `Framer` is simply dropped when its
/// device disconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    Scanning,
    WaitingForBytes,
    Recovering,
}

/// One packet emitted by a scan pass, plus its resolved wire type.
#[derive(Debug, Clone)]
pub struct FramedPacket {
    pub packet_type: u8,
    pub slice: PacketSlice,
}

/// Outcome of one [`Framer::push`] call: the slices produced plus
/// whatever framer-level error was observed along the way (§8 property
/// 8: every push makes progress, reports a slice, *or* reports an
/// error).
#[derive(Debug, Default)]
pub struct ScanBatch {
    pub packets: Vec<FramedPacket>,
    pub device_id_mismatch_count: u64,
}

/// Per-device rolling byte buffer and packet-boundary scanner.
pub struct Framer {
    device_id: u32,
    buffer: Vec<u8>,
    state: FramerState,
    measurement_stopped: bool,
}

impl Framer {
    pub fn new(device_id: u32) -> Self {
        Self {
            device_id,
            buffer: Vec::new(),
            state: FramerState::Scanning,
            measurement_stopped: false,
        }
    }

    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Number of bytes currently retained (the unprocessed tail).
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// When true, `push` drops incoming bytes and the retained buffer is
    /// cleared — the soft-stop test hook for clean shutdown between
    /// measurements (§4.9, §6).
    pub fn set_measurement_stopped(&mut self, stopped: bool) {
        logging::measurement_stopped(self.device_id, stopped);
        self.measurement_stopped = stopped;
        if stopped {
            self.buffer.clear();
            self.state = FramerState::Scanning;
        }
    }

    /// Append `chunk` and re-run the scan loop, producing a batch of
    /// zero-copy slices in the order their packets appear in the
    /// buffer.
    pub fn push(&mut self, chunk: &[u8]) -> ScanBatch {
        if self.measurement_stopped {
            return ScanBatch::default();
        }

        self.buffer.extend_from_slice(chunk);
        if self.state == FramerState::WaitingForBytes {
            self.state = FramerState::Scanning;
        }
        self.scan()
    }

    /// Force a scan pass without new input — the `flushTimer` hook that
    /// bounds tail-delivery latency (§4.3, default 10 ms, driven by the
    /// composition root).
    pub fn force_scan(&mut self) -> ScanBatch {
        if self.measurement_stopped {
            return ScanBatch::default();
        }
        self.scan()
    }

    fn scan(&mut self) -> ScanBatch {
        let mut batch = ScanBatch::default();
        let mut offset = 0usize;
        // Built once, lazily, the first time this batch actually frames a
        // packet — every FramedPacket in the batch shares this one
        // snapshot via a cheap Arc clone instead of each getting its own
        // copy of the buffer (§4.3).
        let mut shared: Option<SharedBytes> = None;

        loop {
            if self.buffer.len() - offset < HEADER_SIZE {
                self.state = FramerState::WaitingForBytes;
                break;
            }

            let header = Header::read(&self.buffer[offset..]);
            let category = PacketTypeRegistry::category(header.packet_type);

            match sizeprobe::probe(category, &self.buffer, offset) {
                Verdict::Size(n) => {
                    let shared = shared.get_or_insert_with(|| SharedBytes::new(self.buffer.clone()));
                    let slice = PacketSlice::new(shared.clone(), offset, n);
                    batch.packets.push(FramedPacket {
                        packet_type: header.packet_type,
                        slice,
                    });
                    offset += n;
                    self.state = FramerState::Scanning;
                }
                Verdict::NeedMore => {
                    self.state = FramerState::WaitingForBytes;
                    break;
                }
                Verdict::Malformed(reason) => {
                    self.state = FramerState::Recovering;
                    logging::probe_malformed(header.packet_type, offset, reason);
                    offset = self.flush_broken(offset);
                    self.state = FramerState::Scanning;
                }
            }
        }

        // Retain only the unconsumed tail.
        self.buffer.drain(..offset);
        batch
    }

    /// Discard bytes from `from` up to the next byte that could plausibly
    /// begin a valid header, and return the new scan offset (always `>=
    /// from`, strictly progressing by at least one byte). This is the
    /// *only* lossy recovery action in the pipeline (§4.3, invariant 2).
    fn flush_broken(&mut self, from: usize) -> usize {
        let start = from + 1;
        let mut candidate = start;

        while candidate + HEADER_SIZE <= self.buffer.len() {
            let header = Header::read(&self.buffer[candidate..]);
            let plausible = header.device_id == self.device_id
                && !matches!(
                    PacketTypeRegistry::category(header.packet_type),
                    crate::wire::Category::Unsupported
                );
            if plausible {
                break;
            }
            candidate += 1;
        }

        logging::flush_broken(self.device_id, candidate - from, candidate);
        candidate
    }
}
