// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PSD (pulse-shape discrimination) event info and waveform records
//! (wire types 1, 2, 10).

use super::waveform::WaveformRecord;
use super::{validate_checksum, validate_header};
use crate::error::ParseResult;
use crate::wire::{fixed_size, packet_type, Header, HEADER_SIZE};

/// `Fixed`-category PSD event-info record (48 B total, §6). Field layout
/// matches `PsdNetworkPacket` (`psdnetworkpacket.h`): short/long charge
/// integrals, CFD crossing times, a baseline/height pair, two event
/// counters, and the onboard PSD discriminant value.
#[derive(Debug, Clone, PartialEq)]
pub struct PsdEventInfo {
    pub header: Header,
    pub q_short: i32,
    pub q_long: i32,
    pub cfd_y1: i16,
    pub cfd_y2: i16,
    pub baseline: i16,
    pub height: i16,
    pub event_counter: u32,
    pub event_counter_psd: u32,
    pub psd_value: i16,
    pub raw: Vec<u8>,
}

impl PsdEventInfo {
    pub(crate) fn decode(view: &[u8], expected_device_id: u32) -> ParseResult<Self> {
        let header = validate_header(view, expected_device_id, packet_type::PSD_EVENT_INFO)?;
        let checksum_at = fixed_size::PSD_EVENT_INFO - 2;
        validate_checksum(view, 0..checksum_at, checksum_at)?;

        let mut off = HEADER_SIZE;
        let q_short = read_i32(view, &mut off);
        let q_long = read_i32(view, &mut off);
        let cfd_y1 = read_i16(view, &mut off);
        let cfd_y2 = read_i16(view, &mut off);
        let baseline = read_i16(view, &mut off);
        let height = read_i16(view, &mut off);
        let event_counter = read_u32(view, &mut off);
        let event_counter_psd = read_u32(view, &mut off);
        let psd_value = read_i16(view, &mut off);
        // 4 B reserved, skipped; checksum follows.

        Ok(PsdEventInfo {
            header,
            q_short,
            q_long,
            cfd_y1,
            cfd_y2,
            baseline,
            height,
            event_counter,
            event_counter_psd,
            psd_value,
            raw: view.to_vec(),
        })
    }
}

/// `PsdEventInfoV2` (wire type 10): same fields as [`PsdEventInfo`] plus
/// a trailing reserved/version word (Open-Question decision, SPEC_FULL
/// §11.5).
#[derive(Debug, Clone, PartialEq)]
pub struct PsdEventInfoV2 {
    pub header: Header,
    pub q_short: i32,
    pub q_long: i32,
    pub cfd_y1: i16,
    pub cfd_y2: i16,
    pub baseline: i16,
    pub height: i16,
    pub event_counter: u32,
    pub event_counter_psd: u32,
    pub psd_value: i16,
    pub version: u32,
    pub raw: Vec<u8>,
}

impl PsdEventInfoV2 {
    pub(crate) fn decode(view: &[u8], expected_device_id: u32) -> ParseResult<Self> {
        let header = validate_header(view, expected_device_id, packet_type::PSD_EVENT_INFO_V2)?;
        let checksum_at = fixed_size::PSD_EVENT_INFO_V2 - 2;
        validate_checksum(view, 0..checksum_at, checksum_at)?;

        let mut off = HEADER_SIZE;
        let q_short = read_i32(view, &mut off);
        let q_long = read_i32(view, &mut off);
        let cfd_y1 = read_i16(view, &mut off);
        let cfd_y2 = read_i16(view, &mut off);
        let baseline = read_i16(view, &mut off);
        let height = read_i16(view, &mut off);
        let event_counter = read_u32(view, &mut off);
        let event_counter_psd = read_u32(view, &mut off);
        let psd_value = read_i16(view, &mut off);
        off += 4; // reserved[2]
        let version = read_u32(view, &mut off);

        Ok(PsdEventInfoV2 {
            header,
            q_short,
            q_long,
            cfd_y1,
            cfd_y2,
            baseline,
            height,
            event_counter,
            event_counter_psd,
            psd_value,
            version,
            raw: view.to_vec(),
        })
    }
}

/// `Known`-category PSD waveform record (wire type 2). Thin wrapper over
/// the layout shared with the other waveform types.
#[derive(Debug, Clone, PartialEq)]
pub struct PsdWaveform(pub WaveformRecord);

impl std::ops::Deref for PsdWaveform {
    type Target = WaveformRecord;
    fn deref(&self) -> &WaveformRecord {
        &self.0
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
fn read_i32(view: &[u8], off: &mut usize) -> i32 {
    read_u32(view, off) as i32
}
