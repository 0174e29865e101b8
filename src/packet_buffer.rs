// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Composition root: wires the framer, worker pool, decoders, pair
//! coordinator, split reassembler, and channel separator into one
//! per-device ingest pipeline.
//!
//! A [`PacketBuffer`] owns exactly one device's framing state; devices
//! with independent byte streams get independent buffers. Two delivery
//! paths run off every framed packet: [`PacketBuffer::on_parsed_raw`]
//! fires synchronously on the framing thread for every slice the framer
//! produces, decoder or no decoder; [`PacketBuffer::on_parsed`] fires
//! from a worker thread once decoding (and pairing, reassembly, channel
//! separation) has actually produced a typed [`Record`].

use crate::channel_separator;
use crate::config::Config;
use crate::decode::{Decoder, Record};
use crate::emit_queue::EmitQueue;
use crate::error::{ConfigError, ParseError, PacketTypeCode};
use crate::framer::Framer;
use crate::pair_coordinator::{PairCoordinator, PairOutcome};
use crate::slice::PacketSlice;
use crate::split_reassembler::SplitReassembler;
use crate::wire::packet_type;
use crate::worker_pool::WorkerPool;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone, Copy, PartialEq, Eq)]
enum PairRole {
    Info,
    Wave,
}

/// Shared state reachable from worker threads. Kept separate from
/// [`PacketBuffer`] itself so dispatched closures only need to clone an
/// `Arc<Inner>`, not the device-exclusive framer.
struct Inner {
    device_id: u32,
    decoders: Mutex<HashMap<PacketTypeCode, (Arc<dyn Decoder>, Arc<WorkerPool>)>>,
    pairs: Mutex<Vec<(Arc<PairCoordinator>, Arc<WorkerPool>)>>,
    pair_roles: Mutex<HashMap<PacketTypeCode, (usize, PairRole)>>,
    split_reassembler: SplitReassembler,
    error_counts: Mutex<HashMap<PacketTypeCode, AtomicU64>>,
    on_parsed: Mutex<Option<Box<dyn Fn(Record) + Send + Sync>>>,
    on_parsed_raw: Mutex<Option<Box<dyn Fn(PacketTypeCode, &[u8]) + Send + Sync>>>,
    emit_queue: EmitQueue<Record>,
}

impl Inner {
    fn record_error(&self, packet_type: PacketTypeCode, _err: &ParseError) {
        let mut counts = self.error_counts.lock();
        counts
            .entry(packet_type)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Fire the raw-subscriber path directly off a framer-emitted slice,
    /// regardless of whether a decoder is registered for its type or
    /// whether decode later succeeds (SPEC_FULL §11.1).
    fn deliver_raw(&self, packet_type: PacketTypeCode, slice: &PacketSlice) {
        if let Some(cb) = self.on_parsed_raw.lock().as_ref() {
            cb(packet_type, slice.view());
        }
    }

    fn deliver(&self, record: Record) {
        for expanded in self.maybe_separate(record) {
            match self.emit_queue.push(expanded, Instant::now()) {
                Some(batch) => {
                    if let Some(cb) = self.on_parsed.lock().as_ref() {
                        for r in batch {
                            cb(r);
                        }
                    }
                }
                None => {}
            }
        }
    }

    /// Interleaved waveforms and consistent-channel spectra carry a
    /// multi-bit channel mask and are split into one record per active
    /// channel before delivery (§4.8). Every other record type passes
    /// through unchanged.
    fn maybe_separate(&self, record: Record) -> Vec<Record> {
        match record {
            Record::InterleavedWaveform(w) => {
                let separated = channel_separator::separate_interleaved(&w);
                if separated.len() <= 1 {
                    vec![Record::InterleavedWaveform(w)]
                } else {
                    separated.into_iter().map(Record::InterleavedWaveform).collect()
                }
            }
            Record::Spectrum16(s) => match channel_separator::separate_consistent_spectrum16(&s) {
                Ok(separated) if separated.len() > 1 => separated.into_iter().map(Record::Spectrum16).collect(),
                Ok(_) => vec![Record::Spectrum16(s)],
                Err(e) => {
                    self.record_error(packet_type::CONSISTENT_CHANNEL_SPECTRUM_16, &e);
                    Vec::new()
                }
            },
            Record::Spectrum32(s) => match channel_separator::separate_consistent_spectrum32(&s) {
                Ok(separated) if separated.len() > 1 => separated.into_iter().map(Record::Spectrum32).collect(),
                Ok(_) => vec![Record::Spectrum32(s)],
                Err(e) => {
                    self.record_error(packet_type::CONSISTENT_CHANNEL_SPECTRUM_32, &e);
                    Vec::new()
                }
            },
            other => vec![other],
        }
    }

    fn handle_split_fragment(&self, slice: &PacketSlice) {
        let decoder = {
            let decoders = self.decoders.lock();
            decoders.get(&packet_type::SPLIT_UP_WAVEFORM).map(|(d, _)| Arc::clone(d))
        };
        let Some(decoder) = decoder else {
            return;
        };
        match decoder.decode(slice) {
            Ok(Record::SplitUpWaveform(fragment)) => {
                if let Some(merged) = self.split_reassembler.push(&fragment, Instant::now()) {
                    self.deliver(Record::SplitUpWaveform(merged));
                }
            }
            Ok(_) => unreachable!("SplitUpWaveformDecoder always returns Record::SplitUpWaveform"),
            Err(e) => self.record_error(packet_type::SPLIT_UP_WAVEFORM, &e),
        }
    }

    fn handle_single(&self, packet_type: PacketTypeCode, slice: &PacketSlice) {
        if packet_type == crate::wire::packet_type::SPLIT_UP_WAVEFORM {
            self.handle_split_fragment(slice);
            return;
        }

        if let Some((idx, role)) = self.pair_roles.lock().get(&packet_type).copied() {
            self.handle_orphan_half(idx, role, slice);
            return;
        }

        let decoder = {
            let decoders = self.decoders.lock();
            decoders.get(&packet_type).map(|(d, _)| Arc::clone(d))
        };
        let Some(decoder) = decoder else {
            return;
        };
        match decoder.decode(slice) {
            Ok(record) => self.deliver(record),
            Err(e) => self.record_error(packet_type, &e),
        }
    }

    /// A pair-bound type arrived without its partner adjacent in the
    /// same batch: decode and deliver it on its own (§4.6 — pairing is
    /// opportunistic, not mandatory on every batch).
    fn handle_orphan_half(&self, pair_idx: usize, role: PairRole, slice: &PacketSlice) {
        let coordinator = {
            let pairs = self.pairs.lock();
            Arc::clone(&pairs[pair_idx].0)
        };
        let outcome = match role {
            PairRole::Info => coordinator.process_info_only(slice),
            PairRole::Wave => coordinator.process_wave_only(slice),
        };
        match outcome {
            PairOutcome::Single(record) => self.deliver(record),
            PairOutcome::Failed(errors) => {
                for (err, pt) in &errors {
                    self.record_error(*pt, err);
                }
            }
            PairOutcome::Paired(..) => unreachable!("single-half processing never returns Paired"),
        }
    }

    fn handle_pair(&self, pair_idx: usize, info: &PacketSlice, wave: &PacketSlice) {
        let coordinator = {
            let pairs = self.pairs.lock();
            Arc::clone(&pairs[pair_idx].0)
        };
        match coordinator.process_pair(info, wave) {
            PairOutcome::Paired(info_record, wave_record) => {
                self.deliver(info_record);
                self.deliver(wave_record);
            }
            PairOutcome::Single(record) => self.deliver(record),
            PairOutcome::Failed(errors) => {
                for (err, pt) in &errors {
                    self.record_error(*pt, err);
                }
            }
        }
    }
}

/// Per-device packet ingest pipeline (§1, §4).
///
/// Each registered decoder or pair owns its own [`WorkerPool`] of
/// `parser_pool_size` workers (§4.5) rather than sharing one pool keyed
/// by packet type — a slow decoder for one type can't starve another's
/// queue.
pub struct PacketBuffer {
    framer: Mutex<Framer>,
    parser_pool_size: usize,
    inner: Arc<Inner>,
}

impl PacketBuffer {
    /// Construct a buffer for `device_id`, validating `config` first.
    pub fn new(device_id: u32, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(PacketBuffer {
            framer: Mutex::new(Framer::new(device_id)),
            parser_pool_size: config.parser_pool_size(),
            inner: Arc::new(Inner {
                device_id,
                decoders: Mutex::new(HashMap::new()),
                pairs: Mutex::new(Vec::new()),
                pair_roles: Mutex::new(HashMap::new()),
                split_reassembler: SplitReassembler::new(config.reassembly_timeout()),
                error_counts: Mutex::new(HashMap::new()),
                on_parsed: Mutex::new(None),
                on_parsed_raw: Mutex::new(None),
                emit_queue: EmitQueue::new(config.batch_mode(), config.emit_batch_threshold(), config.emit_interval()),
            }),
        })
    }

    pub fn device_id(&self) -> u32 {
        self.inner.device_id
    }

    /// Bind `decoder` to its wire packet type, giving it its own
    /// `parser_pool_size`-worker pool (§4.5). Types not registered are
    /// silently skipped by the pipeline (their bytes are still consumed
    /// by the framer, just never decoded).
    pub fn register_parser(&self, decoder: Box<dyn Decoder>) {
        let pt = decoder.packet_type();
        let pool = Arc::new(WorkerPool::new(self.parser_pool_size));
        crate::logging::parser_registered(pt, pool.worker_count());
        self.inner.decoders.lock().insert(pt, (Arc::from(decoder), pool));
    }

    /// Bind an info/waveform decoder pair to its own
    /// `parser_pool_size`-worker pool. Both halves' packet types are
    /// recorded so [`Self::process_data`] can recognize adjacent slices
    /// that belong together.
    pub fn register_pair(&self, info_decoder: Box<dyn Decoder>, wave_decoder: Box<dyn Decoder>) {
        let info_type = info_decoder.packet_type();
        let wave_type = wave_decoder.packet_type();
        let coordinator = Arc::new(PairCoordinator::new(info_decoder, wave_decoder));
        let pool = Arc::new(WorkerPool::new(self.parser_pool_size));

        let mut pairs = self.inner.pairs.lock();
        let idx = pairs.len();
        pairs.push((coordinator, pool));
        drop(pairs);

        let mut roles = self.inner.pair_roles.lock();
        roles.insert(info_type, (idx, PairRole::Info));
        roles.insert(wave_type, (idx, PairRole::Wave));
    }

    pub fn set_measurement_stopped(&self, stopped: bool) {
        self.framer.lock().set_measurement_stopped(stopped);
    }

    /// Register the callback invoked with every successfully decoded
    /// (and, for batch-mode queues, flushed) record.
    pub fn on_parsed<F>(&self, callback: F)
    where
        F: Fn(Record) + Send + Sync + 'static,
    {
        *self.inner.on_parsed.lock() = Some(Box::new(callback));
    }

    /// Register an independent raw-bytes subscriber, invoked once per
    /// framer-identified slice — even for types with no registered
    /// decoder, and even when decode later fails — independently of
    /// whether `on_parsed` is also registered (SPEC_FULL §11.1).
    pub fn on_parsed_raw<F>(&self, callback: F)
    where
        F: Fn(PacketTypeCode, &[u8]) + Send + Sync + 'static,
    {
        *self.inner.on_parsed_raw.lock() = Some(Box::new(callback));
    }

    /// Feed newly-arrived bytes for this device. Framing happens
    /// synchronously on the caller's thread; decoding and everything
    /// downstream of it is dispatched to the worker pool.
    pub fn process_data(&self, chunk: &[u8]) {
        let batch = self.framer.lock().push(chunk);
        self.dispatch_batch(batch.packets);
    }

    /// Drive the framer's flush timer without new input, bounding
    /// tail-delivery latency for a stream that has gone quiet (§4.3).
    pub fn force_scan(&self) {
        let batch = self.framer.lock().force_scan();
        self.dispatch_batch(batch.packets);
    }

    /// Drive the split-reassembly idle-eviction sweep. The caller is
    /// expected to invoke this on `reassembly_timeout`'s cadence (or
    /// coarser); it is cheap to call more often than necessary.
    pub fn evict_stale_reassembly(&self) {
        for err in self.inner.split_reassembly_idle_sweep() {
            self.inner.record_error(packet_type::SPLIT_UP_WAVEFORM, &err);
        }
    }

    fn pair_role(&self, packet_type: PacketTypeCode) -> Option<(usize, PairRole)> {
        self.inner.pair_roles.lock().get(&packet_type).copied()
    }

    /// The pool a lone (non-adjacent-pair) slice of `packet_type` would
    /// be dispatched onto, mirroring [`Inner::handle_single`]'s own
    /// routing: split fragments go through the split decoder's pool, an
    /// orphaned pair half through its pair's pool, everything else
    /// through its own registered decoder's pool.
    fn pool_for(&self, packet_type: PacketTypeCode) -> Option<Arc<WorkerPool>> {
        if packet_type == crate::wire::packet_type::SPLIT_UP_WAVEFORM {
            return self.inner.decoders.lock().get(&packet_type).map(|(_, p)| Arc::clone(p));
        }
        if let Some((idx, _)) = self.pair_role(packet_type) {
            return self.inner.pairs.lock().get(idx).map(|(_, p)| Arc::clone(p));
        }
        self.inner.decoders.lock().get(&packet_type).map(|(_, p)| Arc::clone(p))
    }

    /// Two adjacent slices in the same batch are dispatched as one pair
    /// job when they belong to the same registered pair and carry
    /// opposite roles (§4.6) — mirroring the original's "pairs only
    /// what arrives together" contract rather than staging halves across
    /// batches.
    fn dispatch_batch(&self, packets: Vec<crate::framer::FramedPacket>) {
        for packet in &packets {
            self.inner.deliver_raw(packet.packet_type, &packet.slice);
        }

        let mut i = 0;
        while i < packets.len() {
            let packet_type = packets[i].packet_type;
            let pairing = self.pair_role(packet_type).and_then(|(idx, my_role)| {
                let next = packets.get(i + 1)?;
                let next_role = self.pair_role(next.packet_type)?;
                (next_role.0 == idx && next_role.1 != my_role).then_some((idx, my_role))
            });

            match pairing {
                Some((idx, my_role)) => {
                    let pool = { self.inner.pairs.lock()[idx].1.clone() };
                    let (info_slice, wave_slice) = if my_role == PairRole::Info {
                        (packets[i].slice.clone(), packets[i + 1].slice.clone())
                    } else {
                        (packets[i + 1].slice.clone(), packets[i].slice.clone())
                    };
                    crate::logging::dispatch_trace(packet_type, pool.worker_count(), true);
                    let inner = Arc::clone(&self.inner);
                    pool.dispatch_next(move || {
                        inner.handle_pair(idx, &info_slice, &wave_slice);
                    });
                    i += 2;
                }
                None => {
                    let pool = self.pool_for(packet_type);
                    let Some(pool) = pool else {
                        i += 1;
                        continue;
                    };
                    crate::logging::dispatch_trace(packet_type, pool.worker_count(), false);
                    let slice = packets[i].slice.clone();
                    let inner = Arc::clone(&self.inner);
                    pool.dispatch_next(move || {
                        inner.handle_single(packet_type, &slice);
                    });
                    i += 1;
                }
            }
        }
    }

    /// Snapshot of per-type decode/pairing/reassembly failure counts
    /// accumulated since construction.
    pub fn error_counts(&self) -> HashMap<PacketTypeCode, u64> {
        self.inner
            .error_counts
            .lock()
            .iter()
            .map(|(k, v)| (*k, v.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Inner {
    fn split_reassembly_idle_sweep(&self) -> Vec<ParseError> {
        self.split_reassembler.evict_idle(Instant::now())
    }
}
