// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Info/waveform pair coordination (§4.6).
//!
//! An info packet (e.g. `PsdEventInfo`) and its matching waveform
//! (`PsdWaveform`) describe the same physical event and must be emitted
//! together, or not at all. A single coordinator instance owns the pair
//! of decoders bound to one device and enforces that both halves decode
//! successfully and agree on `rtc` before either is handed downstream.
//!
//! Orphan halves (only one of the two slices present in a batch) are
//! decoded and emitted independently — pairing is opportunistic, not a
//! hard requirement on every batch.

use crate::decode::{Decoder, Record};
use crate::error::{ParseError, PacketTypeCode, ParseResult};
use crate::slice::PacketSlice;

/// Outcome of processing one pair (or single) job: successes carry one
/// or two [`Record`]s; failures are tagged per the half(s) that
/// produced them so per-type error counters stay accurate.
pub enum PairOutcome {
    Paired(Record, Record),
    Single(Record),
    Failed(Vec<(ParseError, PacketTypeCode)>),
}

/// Coordinates one info/waveform decoder pair bound to a single device.
pub struct PairCoordinator {
    info_decoder: Box<dyn Decoder>,
    wave_decoder: Box<dyn Decoder>,
}

impl PairCoordinator {
    pub fn new(info_decoder: Box<dyn Decoder>, wave_decoder: Box<dyn Decoder>) -> Self {
        PairCoordinator {
            info_decoder,
            wave_decoder,
        }
    }

    pub fn info_type(&self) -> u8 {
        self.info_decoder.packet_type()
    }

    pub fn wave_type(&self) -> u8 {
        self.wave_decoder.packet_type()
    }

    /// Process a batch containing both halves. A failure on either half,
    /// or an `rtc` mismatch between them, is reported against *both*
    /// packet types — the pairing contract means neither half is usable
    /// alone once the other has failed.
    pub fn process_pair(&self, info: &PacketSlice, wave: &PacketSlice) -> PairOutcome {
        let info_type = self.info_decoder.packet_type();
        let wave_type = self.wave_decoder.packet_type();

        let info_record = match self.info_decoder.decode(info) {
            Ok(r) => r,
            Err(e) => {
                return PairOutcome::Failed(vec![(e.clone(), info_type), (e, wave_type)]);
            }
        };
        let wave_record = match self.wave_decoder.decode(wave) {
            Ok(r) => r,
            Err(e) => {
                return PairOutcome::Failed(vec![(e.clone(), info_type), (e, wave_type)]);
            }
        };

        let info_rtc = info_record.header().rtc;
        let wave_rtc = wave_record.header().rtc;
        if info_rtc != wave_rtc {
            let err = ParseError::RtcMismatch { info_rtc, wave_rtc };
            return PairOutcome::Failed(vec![(err.clone(), info_type), (err, wave_type)]);
        }

        PairOutcome::Paired(info_record, wave_record)
    }

    /// Process an orphan info-only slice.
    pub fn process_info_only(&self, info: &PacketSlice) -> PairOutcome {
        match self.info_decoder.decode(info) {
            Ok(r) => PairOutcome::Single(r),
            Err(e) => PairOutcome::Failed(vec![(e, self.info_decoder.packet_type())]),
        }
    }

    /// Process an orphan waveform-only slice.
    pub fn process_wave_only(&self, wave: &PacketSlice) -> PairOutcome {
        match self.wave_decoder.decode(wave) {
            Ok(r) => PairOutcome::Single(r),
            Err(e) => PairOutcome::Failed(vec![(e, self.wave_decoder.packet_type())]),
        }
    }
}

/// Result alias kept for call sites that only care about whether the
/// pair ultimately succeeded, discarding which half(s) failed.
pub fn paired_ok(outcome: &PairOutcome) -> ParseResult<()> {
    match outcome {
        PairOutcome::Paired(..) | PairOutcome::Single(..) => Ok(()),
        PairOutcome::Failed(errors) => Err(errors[0].0.clone()),
    }
}
