// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PHA (pulse-height analysis) event info and waveform records (wire
//! types 3, 4).

use super::waveform::WaveformRecord;
use super::{validate_checksum, validate_header};
use crate::error::ParseResult;
use crate::wire::{fixed_size, packet_type, Header, HEADER_SIZE};

/// `Fixed`-category PHA event-info record (56 B total, §6). Field layout
/// matches `PhaNetworkPacket` (`phanetworkpacket.h`): three trap-filter
/// readings, an event counter, and a pair of CR-RC2 shaping outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaEventInfo {
    pub header: Header,
    pub trap_baseline: i64,
    pub trap_height_mean: i64,
    pub trap_height_max: i64,
    pub event_counter: u32,
    pub rc_cr2_y1: i16,
    pub rc_cr2_y2: i16,
    pub raw: Vec<u8>,
}

impl PhaEventInfo {
    pub(crate) fn decode(view: &[u8], expected_device_id: u32) -> ParseResult<Self> {
        let header = validate_header(view, expected_device_id, packet_type::PHA_EVENT_INFO)?;
        let checksum_at = fixed_size::PHA_EVENT_INFO - 2;
        validate_checksum(view, 0..checksum_at, checksum_at)?;

        let mut off = HEADER_SIZE;
        let trap_baseline = read_i64(view, &mut off);
        let trap_height_mean = read_i64(view, &mut off);
        let trap_height_max = read_i64(view, &mut off);
        let event_counter = read_u32(view, &mut off);
        let rc_cr2_y1 = read_i16(view, &mut off);
        let rc_cr2_y2 = read_i16(view, &mut off);
        // 6 B reserved, skipped; checksum follows.

        Ok(PhaEventInfo {
            header,
            trap_baseline,
            trap_height_mean,
            trap_height_max,
            event_counter,
            rc_cr2_y1,
            rc_cr2_y2,
            raw: view.to_vec(),
        })
    }
}

/// `Known`-category PHA waveform record (wire type 4).
#[derive(Debug, Clone, PartialEq)]
pub struct PhaWaveform(pub WaveformRecord);

impl std::ops::Deref for PhaWaveform {
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
fn read_i64(view: &[u8], off: &mut usize) -> i64 {
    let v = i64::from_le_bytes(view[*off..*off + 8].try_into().unwrap());
    *off += 8;
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    /// §8 S1: deviceId=1, rtc=0x10, trapHeightMax=0x7F, correct checksum.
    fn s1_packet() -> Vec<u8> {
        let mut buf = vec![0u8; fixed_size::PHA_EVENT_INFO];
        let header = Header {
            device_id: 1,
            packet_type: packet_type::PHA_EVENT_INFO,
            flags: 0,
            channel_id: 0,
            rtc: 0x10,
        };
        header.write(&mut buf);
        // trapHeightMax is the third i64 of the body, at offset 16+8+8=32.
        buf[HEADER_SIZE + 16..HEADER_SIZE + 24].copy_from_slice(&0x7Fi64.to_le_bytes());
        let checksum_at = fixed_size::PHA_EVENT_INFO - 2;
        let c = crate::checksum::checksum(&buf[..checksum_at]);
        buf[checksum_at..checksum_at + 2].copy_from_slice(&c.to_le_bytes());
        buf
    }

    #[test]
    fn s1_single_fixed_pha_record() {
        let raw = s1_packet();
        let decoded = PhaEventInfo::decode(&raw, 1).unwrap();
        assert_eq!(decoded.header.device_id, 1);
        assert_eq!(decoded.header.rtc, 0x10);
        assert_eq!(decoded.trap_height_max, 0x7F);
    }

    #[test]
    fn checksum_mismatch_on_bit_flip() {
        let mut raw = s1_packet();
        raw[HEADER_SIZE] ^= 0x01;
        assert!(matches!(
            PhaEventInfo::decode(&raw, 1),
            Err(crate::error::ParseError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn event_counter_and_shaping_outputs_round_trip() {
        let mut buf = vec![0u8; fixed_size::PHA_EVENT_INFO];
        let header = Header {
            device_id: 1,
            packet_type: packet_type::PHA_EVENT_INFO,
            flags: 0,
            channel_id: 0,
            rtc: 1,
        };
        header.write(&mut buf);
        let mut off = HEADER_SIZE + 24;
        buf[off..off + 4].copy_from_slice(&77u32.to_le_bytes());
        off += 4;
        buf[off..off + 2].copy_from_slice(&(-5i16).to_le_bytes());
        off += 2;
        buf[off..off + 2].copy_from_slice(&9i16.to_le_bytes());
        let checksum_at = fixed_size::PHA_EVENT_INFO - 2;
        let c = crate::checksum::checksum(&buf[..checksum_at]);
        buf[checksum_at..checksum_at + 2].copy_from_slice(&c.to_le_bytes());

        let decoded = PhaEventInfo::decode(&buf, 1).unwrap();
        assert_eq!(decoded.event_counter, 77);
        assert_eq!(decoded.rc_cr2_y1, -5);
        assert_eq!(decoded.rc_cr2_y2, 9);
    }
}
