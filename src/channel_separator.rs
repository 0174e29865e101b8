// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Channel separation for multi-channel waveform and spectrum records
//! (§4.8). The active-channel set is the 16-bit `channelId` bitmask,
//! one bit per channel.
//!
//! Two separation modes:
//! - *Interleaved*: samples are round-robined across active channels in
//!   bit order, so uneven sample counts are simply distributed one extra
//!   sample to the earliest channels in rotation — no divisibility
//!   requirement.
//! - *Consistent*: each active channel owns one contiguous block of
//!   `len / active_count` samples; the array length must divide evenly
//!   or the whole record is rejected ([`ParseError::MalformedChannelData`]).

use crate::decode::{Spectrum16, Spectrum32, WaveformRecord};
use crate::error::{ParseError, ParseResult};
use crate::wire::{known_offsets, Header, HEADER_SIZE};

const CHANNEL_BITS: usize = 16;

fn active_channel_bits(channel_id: u16) -> Vec<usize> {
    (0..CHANNEL_BITS).filter(|bit| channel_id & (1 << bit) != 0).collect()
}

/// Split an interleaved waveform into one record per active channel,
/// assigning samples in round-robin order across the active channel set.
pub fn separate_interleaved(record: &WaveformRecord) -> Vec<WaveformRecord> {
    let active = active_channel_bits(record.header.channel_id);
    if active.is_empty() {
        return Vec::new();
    }

    let mut buckets: Vec<Vec<i16>> = vec![Vec::new(); active.len()];
    for (i, sample) in record.array.iter().enumerate() {
        buckets[i % active.len()].push(*sample);
    }

    active
        .into_iter()
        .zip(buckets)
        .map(|(bit, samples)| {
            let raw = WaveformRecord::encode(
                record.header.device_id,
                record.header.packet_type,
                record.header.flags,
                bit as u16,
                record.header.rtc,
                record.decimation_factor,
                &samples,
                0,
            );
            WaveformRecord {
                header: Header {
                    device_id: record.header.device_id,
                    packet_type: record.header.packet_type,
                    flags: record.header.flags,
                    channel_id: bit as u16,
                    rtc: record.header.rtc,
                },
                decimation_factor: record.decimation_factor,
                array: samples,
                raw,
            }
        })
        .collect()
}

/// Split a consistent-channel spectrum into one record per active
/// channel, each owning a contiguous block of the original bin array.
pub fn separate_consistent_spectrum16(spectrum: &Spectrum16) -> ParseResult<Vec<Spectrum16>> {
    let active = active_channel_bits(spectrum.header.channel_id);
    let blocks = split_consistent(&spectrum.bins, active.len())?;
    Ok(active
        .into_iter()
        .zip(blocks)
        .map(|(bit, bins)| {
            let raw = encode_spectrum16(spectrum.header.device_id, spectrum.header.rtc, bit as u16, spectrum.spectrum_type, &bins);
            Spectrum16 {
                header: Header {
                    device_id: spectrum.header.device_id,
                    packet_type: spectrum.header.packet_type,
                    flags: spectrum.header.flags,
                    channel_id: bit as u16,
                    rtc: spectrum.header.rtc,
                },
                spectrum_type: spectrum.spectrum_type,
                bins,
                raw,
            }
        })
        .collect())
}

/// Split a 32-bit consistent-channel spectrum the same way as
/// [`separate_consistent_spectrum16`].
pub fn separate_consistent_spectrum32(spectrum: &Spectrum32) -> ParseResult<Vec<Spectrum32>> {
    let active = active_channel_bits(spectrum.header.channel_id);
    let blocks = split_consistent(&spectrum.bins, active.len())?;
    Ok(active
        .into_iter()
        .zip(blocks)
        .map(|(bit, bins)| {
            let raw = encode_spectrum32(spectrum.header.device_id, spectrum.header.rtc, bit as u16, spectrum.spectrum_type, &bins);
            Spectrum32 {
                header: Header {
                    device_id: spectrum.header.device_id,
                    packet_type: spectrum.header.packet_type,
                    flags: spectrum.header.flags,
                    channel_id: bit as u16,
                    rtc: spectrum.header.rtc,
                },
                spectrum_type: spectrum.spectrum_type,
                bins,
                raw,
            }
        })
        .collect())
}

fn split_consistent<T: Clone>(data: &[T], active_channels: usize) -> ParseResult<Vec<Vec<T>>> {
    if active_channels == 0 {
        return Ok(Vec::new());
    }
    if data.len() % active_channels != 0 {
        crate::logging::malformed_channel_data(data.len(), active_channels);
        return Err(ParseError::MalformedChannelData {
            array_len: data.len(),
            active_channels,
        });
    }
    let per_channel = data.len() / active_channels;
    Ok(data.chunks(per_channel).map(|chunk| chunk.to_vec()).collect())
}

fn encode_spectrum16(device_id: u32, rtc: u64, channel_id: u16, spectrum_type: u16, bins: &[u16]) -> Vec<u8> {
    let fixed_part = HEADER_SIZE + 4 + 2 + 2;
    let mut buf = vec![0u8; fixed_part + bins.len() * 2 + 2];
    let header = Header {
        device_id,
        packet_type: crate::wire::packet_type::CONSISTENT_CHANNEL_SPECTRUM_16,
        flags: 0,
        channel_id,
        rtc,
    };
    header.write(&mut buf);
    buf[known_offsets::ARRAY_LEN_OFF..known_offsets::ARRAY_LEN_OFF + 4].copy_from_slice(&(bins.len() as u32).to_le_bytes());
    buf[known_offsets::AUX_OFF..known_offsets::AUX_OFF + 2].copy_from_slice(&spectrum_type.to_le_bytes());
    for (i, bin) in bins.iter().enumerate() {
        let off = fixed_part + i * 2;
        buf[off..off + 2].copy_from_slice(&bin.to_le_bytes());
    }
    let checksum_at = fixed_part + bins.len() * 2;
    let c = crate::checksum::checksum(&buf[..checksum_at]);
    buf[checksum_at..checksum_at + 2].copy_from_slice(&c.to_le_bytes());
    buf
}

fn encode_spectrum32(device_id: u32, rtc: u64, channel_id: u16, spectrum_type: u16, bins: &[u32]) -> Vec<u8> {
    let fixed_part = HEADER_SIZE + 4 + 2 + 2;
    let mut buf = vec![0u8; fixed_part + bins.len() * 4 + 2];
    let header = Header {
        device_id,
        packet_type: crate::wire::packet_type::CONSISTENT_CHANNEL_SPECTRUM_32,
        flags: 0,
        channel_id,
        rtc,
    };
    header.write(&mut buf);
    buf[known_offsets::ARRAY_LEN_OFF..known_offsets::ARRAY_LEN_OFF + 4].copy_from_slice(&(bins.len() as u32).to_le_bytes());
    buf[known_offsets::AUX_OFF..known_offsets::AUX_OFF + 2].copy_from_slice(&spectrum_type.to_le_bytes());
    for (i, bin) in bins.iter().enumerate() {
        let off = fixed_part + i * 4;
        buf[off..off + 4].copy_from_slice(&bin.to_le_bytes());
    }
    let checksum_at = fixed_part + bins.len() * 4;
    let c = crate::checksum::checksum(&buf[..checksum_at]);
    buf[checksum_at..checksum_at + 2].copy_from_slice(&c.to_le_bytes());
    buf
}
