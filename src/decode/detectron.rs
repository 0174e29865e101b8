// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Detectron position-hit and statistics records (wire types 5, 6).

use super::{validate_checksum, validate_header};
use crate::error::{ParseError, ParseResult};
use crate::wire::{
    fixed_size, packet_type, Header, DETECTRON_RECORD_SIZE, DETECTRON_SIGNATURE, HEADER_SIZE,
};

/// One fixed-size hit record repeated before the signature in an
/// `Unknown`-category [`Detectron2DData`] packet. Matches
/// `event_info_detectron_xy_t` (`detectron2dnetworkpacket.h`): the
/// channel the hit was assigned to, its two amplitude samples, and its
/// own real-time counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectronHit {
    pub channel_num: u32,
    pub amp1: i16,
    pub amp2: i16,
    pub rtc: u64,
}

/// `Unknown`-category detector hit record (§6: sig `11D0E1FEADDE`,
/// `LIMIT=64`, `recSize=16`).
#[derive(Debug, Clone, PartialEq)]
pub struct Detectron2DData {
    pub header: Header,
    pub hits: Vec<DetectronHit>,
    pub raw: Vec<u8>,
}

impl Detectron2DData {
    pub(crate) fn decode(view: &[u8], expected_device_id: u32) -> ParseResult<Self> {
        let header = validate_header(view, expected_device_id, packet_type::DETECTRON_2D_DATA)?;

        // Find where the signature starts by counting whole records
        // after the header; the framer has already confirmed its
        // presence via SizeProbe, but the decoder re-derives it rather
        // than trusting slice length alone.
        let after_header = view.len() - HEADER_SIZE - DETECTRON_SIGNATURE.len() - 2;
        if after_header % DETECTRON_RECORD_SIZE != 0 {
            return Err(ParseError::Malformed("detectron record region is not a whole number of records"));
        }
        let signature_at = HEADER_SIZE + after_header;
        if view[signature_at..signature_at + DETECTRON_SIGNATURE.len()] != DETECTRON_SIGNATURE[..] {
            return Err(ParseError::Malformed("detectron signature mismatch"));
        }

        // Checksum window excludes only the checksum field itself (this
        // is an Unknown-category packet, §4.1).
        let checksum_at = view.len() - 2;
        validate_checksum(view, 0..checksum_at, checksum_at)?;

        let record_count = after_header / DETECTRON_RECORD_SIZE;
        let mut hits = Vec::with_capacity(record_count);
        for k in 0..record_count {
            let mut off = HEADER_SIZE + k * DETECTRON_RECORD_SIZE;
            let channel_num = read_u32(view, &mut off);
            let amp1 = read_i16(view, &mut off);
            let amp2 = read_i16(view, &mut off);
            let rtc = read_u64(view, &mut off);
            hits.push(DetectronHit { channel_num, amp1, amp2, rtc });
        }

        Ok(Detectron2DData {
            header,
            hits,
            raw: view.to_vec(),
        })
    }
}

/// `Fixed`-category detector statistics record
/// (`fixed_size::DETECTRON_STATISTIC_DATA` total, §6). Field layout
/// matches `DetectronStatisticNetworkPacket`
/// (`detectronstatisticnetworkpacket.h`): paired trigger/processed
/// counters per anode/X1/X2/Y1/Y2 channel, plus a monitor counter.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectronStatisticData {
    pub header: Header,
    pub anode_triggers: u32,
    pub anode_processed: u32,
    pub x1_triggers: u32,
    pub x1_processed: u32,
    pub x2_triggers: u32,
    pub x2_processed: u32,
    pub y1_triggers: u32,
    pub y1_processed: u32,
    pub y2_triggers: u32,
    pub y2_processed: u32,
    pub cnt_monitor: u32,
    pub raw: Vec<u8>,
}

impl DetectronStatisticData {
    pub(crate) fn decode(view: &[u8], expected_device_id: u32) -> ParseResult<Self> {
        let header = validate_header(view, expected_device_id, packet_type::DETECTRON_STATISTIC_DATA)?;
        let checksum_at = fixed_size::DETECTRON_STATISTIC_DATA - 2;
        validate_checksum(view, 0..checksum_at, checksum_at)?;

        let mut off = HEADER_SIZE;
        let anode_triggers = read_u32(view, &mut off);
        let anode_processed = read_u32(view, &mut off);
        let x1_triggers = read_u32(view, &mut off);
        let x1_processed = read_u32(view, &mut off);
        let x2_triggers = read_u32(view, &mut off);
        let x2_processed = read_u32(view, &mut off);
        let y1_triggers = read_u32(view, &mut off);
        let y1_processed = read_u32(view, &mut off);
        let y2_triggers = read_u32(view, &mut off);
        let y2_processed = read_u32(view, &mut off);
        let cnt_monitor = read_u32(view, &mut off);
        // 2 B padding, skipped; checksum follows.

        Ok(DetectronStatisticData {
            header,
            anode_triggers,
            anode_processed,
            x1_triggers,
            x1_processed,
            x2_triggers,
            x2_processed,
            y1_triggers,
            y1_processed,
            y2_triggers,
            y2_processed,
            cnt_monitor,
            raw: view.to_vec(),
        })
    }
}

fn read_i16(view: &[u8], off: &mut usize) -> i16 {
    let v = i16::from_le_bytes([view[*off], view[*off + 1]]);
    *off += 2;
    v
}
fn read_u32(view: &[u8], off: &mut usize) -> u32 {
    let v = u32::from_le_bytes([view[*off], view[*off + 1], view[*off + 2], view[*off + 3]]);
    *off += 4;
    v
}
fn read_u64(view: &[u8], off: &mut usize) -> u64 {
    let v = u64::from_le_bytes(view[*off..*off + 8].try_into().unwrap());
    *off += 8;
    v
}
