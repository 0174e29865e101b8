// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Consistent-channel spectrum histograms (wire types 8, 9).
//!
//! Both share the `Known`-category layout (§6); only the histogram bin
//! width (`itemSize`) differs. The `aux` field carries `spectrumType`
//! rather than a decimation factor here.

use super::{validate_checksum, validate_header};
use crate::error::ParseResult;
use crate::wire::{known_offsets, packet_type, Header, HEADER_SIZE};

/// 16-bit-bin consistent-channel spectrum (wire type 8).
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum16 {
    pub header: Header,
    pub spectrum_type: u16,
    pub bins: Vec<u16>,
    pub raw: Vec<u8>,
}

impl Spectrum16 {
    pub(crate) fn decode(view: &[u8], expected_device_id: u32) -> ParseResult<Self> {
        let (header, spectrum_type, bins_start, bins_end) =
            decode_common(view, expected_device_id, packet_type::CONSISTENT_CHANNEL_SPECTRUM_16, 2)?;

        let mut bins = Vec::with_capacity((bins_end - bins_start) / 2);
        for chunk in view[bins_start..bins_end].chunks_exact(2) {
            bins.push(u16::from_le_bytes([chunk[0], chunk[1]]));
        }

        Ok(Spectrum16 {
            header,
            spectrum_type,
            bins,
            raw: view.to_vec(),
        })
    }
}

/// 32-bit-bin consistent-channel spectrum (wire type 9).
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum32 {
    pub header: Header,
    pub spectrum_type: u16,
    pub bins: Vec<u32>,
    pub raw: Vec<u8>,
}

impl Spectrum32 {
    pub(crate) fn decode(view: &[u8], expected_device_id: u32) -> ParseResult<Self> {
        let (header, spectrum_type, bins_start, bins_end) =
            decode_common(view, expected_device_id, packet_type::CONSISTENT_CHANNEL_SPECTRUM_32, 4)?;

        let mut bins = Vec::with_capacity((bins_end - bins_start) / 4);
        for chunk in view[bins_start..bins_end].chunks_exact(4) {
            bins.push(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }

        Ok(Spectrum32 {
            header,
            spectrum_type,
            bins,
            raw: view.to_vec(),
        })
    }
}

/// Shared `Known`-category decode: header/type/checksum validation and
/// bin-region bounds, common to both bin widths.
fn decode_common(
    view: &[u8],
    expected_device_id: u32,
    expected_type: u8,
    item_size: usize,
) -> ParseResult<(Header, u16, usize, usize)> {
    let header = validate_header(view, expected_device_id, expected_type)?;

    let bin_count = u32::from_le_bytes([
        view[known_offsets::ARRAY_LEN_OFF],
        view[known_offsets::ARRAY_LEN_OFF + 1],
        view[known_offsets::ARRAY_LEN_OFF + 2],
        view[known_offsets::ARRAY_LEN_OFF + 3],
    ]) as usize;
    let spectrum_type = u16::from_le_bytes([view[known_offsets::AUX_OFF], view[known_offsets::AUX_OFF + 1]]);

    let fixed_part = HEADER_SIZE + 4 + 2 + 2;
    let bins_start = fixed_part;
    let bins_end = bins_start + bin_count * item_size;
    let checksum_at = bins_end;

    validate_checksum(view, 0..checksum_at, checksum_at)?;

    Ok((header, spectrum_type, bins_start, bins_end))
}
