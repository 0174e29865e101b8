// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared `Known`-category waveform layout, reused by
//! `InterleavedWaveform`, `PsdWaveform`, `PhaWaveform`, and
//! `SplitUpWaveform` (§6: all four share the identical
//! header+arrayLen+aux+paddingLen+array+checksum+padding shape; `aux` is
//! `decimationFactor`).

use super::{validate_checksum, validate_header};
use crate::error::ParseResult;
use crate::wire::{known_offsets, Header, HEADER_SIZE};

/// A decoded waveform packet. Samples are signed 16-bit ADC values.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformRecord {
    pub header: Header,
    pub decimation_factor: u16,
    pub array: Vec<i16>,
    pub raw: Vec<u8>,
}

const FIXED_PART: usize = HEADER_SIZE + 4 + 2 + 2;
const ITEM_SIZE: usize = 2;

impl WaveformRecord {
    pub(crate) fn decode(view: &[u8], expected_device_id: u32, expected_type: u8) -> ParseResult<Self> {
        let header = validate_header(view, expected_device_id, expected_type)?;

        let array_len = u32::from_le_bytes([
            view[known_offsets::ARRAY_LEN_OFF],
            view[known_offsets::ARRAY_LEN_OFF + 1],
            view[known_offsets::ARRAY_LEN_OFF + 2],
            view[known_offsets::ARRAY_LEN_OFF + 3],
        ]) as usize;
        let decimation_factor = u16::from_le_bytes([
            view[known_offsets::AUX_OFF],
            view[known_offsets::AUX_OFF + 1],
        ]);
        let padding_len = u16::from_le_bytes([
            view[known_offsets::PADDING_LEN_OFF],
            view[known_offsets::PADDING_LEN_OFF + 1],
        ]) as usize;

        let array_start = FIXED_PART;
        let array_end = array_start + array_len * ITEM_SIZE;
        let checksum_at = array_end;

        // Known-category checksum window excludes both the checksum
        // field itself and the padding suffix (§4.1).
        validate_checksum(view, 0..checksum_at, checksum_at)?;

        let mut array = Vec::with_capacity(array_len);
        for chunk in view[array_start..array_end].chunks_exact(ITEM_SIZE) {
            array.push(i16::from_le_bytes([chunk[0], chunk[1]]));
        }

        let total = checksum_at + 2 + padding_len * 2;
        debug_assert_eq!(total, view.len());

        Ok(WaveformRecord {
            header,
            decimation_factor,
            array,
            raw: view.to_vec(),
        })
    }

    /// Serialize back onto the wire — used by round-trip tests and by
    /// [`crate::split_reassembler`] when synthesizing a merged record.
    pub fn encode(
        device_id: u32,
        packet_type: u8,
        flags: u8,
        channel_id: u16,
        rtc: u64,
        decimation_factor: u16,
        array: &[i16],
        padding_len: u16,
    ) -> Vec<u8> {
        let array_bytes = array.len() * ITEM_SIZE;
        let total = FIXED_PART + array_bytes + 2 + padding_len as usize * 2;
        let mut buf = vec![0u8; total];

        let header = Header {
            device_id,
            packet_type,
            flags,
            channel_id,
            rtc,
        };
        header.write(&mut buf);
        buf[known_offsets::ARRAY_LEN_OFF..known_offsets::ARRAY_LEN_OFF + 4]
            .copy_from_slice(&(array.len() as u32).to_le_bytes());
        buf[known_offsets::AUX_OFF..known_offsets::AUX_OFF + 2]
            .copy_from_slice(&decimation_factor.to_le_bytes());
        buf[known_offsets::PADDING_LEN_OFF..known_offsets::PADDING_LEN_OFF + 2]
            .copy_from_slice(&padding_len.to_le_bytes());

        let array_start = FIXED_PART;
        for (i, sample) in array.iter().enumerate() {
            let off = array_start + i * ITEM_SIZE;
            buf[off..off + ITEM_SIZE].copy_from_slice(&sample.to_le_bytes());
        }

        let checksum_at = array_start + array_bytes;
        let c = crate::checksum::checksum(&buf[..checksum_at]);
        buf[checksum_at..checksum_at + 2].copy_from_slice(&c.to_le_bytes());

        buf
    }
}
