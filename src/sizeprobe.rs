// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `SizeProbe` — peeks at a candidate packet region and returns its byte
//! length, or a `NeedMore`/`Malformed` verdict, without copying (§4.2).

use crate::wire::{known_offsets, Category};

/// Verdict of probing a candidate packet region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The region at `offset` is exactly `n` bytes long.
    Size(usize),
    /// Not enough bytes buffered yet to decide.
    NeedMore,
    /// The region can never resolve to a valid packet.
    Malformed(&'static str),
}

/// Probe `buf[offset..]` for a packet of the given structural `category`.
///
/// Never allocates or copies.
pub fn probe(category: Category, buf: &[u8], offset: usize) -> Verdict {
    let available = buf.len().saturating_sub(offset);
    match category {
        Category::Fixed { size } => {
            if available >= size {
                Verdict::Size(size)
            } else {
                Verdict::NeedMore
            }
        }

        Category::Known { fixed_part, item_size } => {
            if available < fixed_part {
                return Verdict::NeedMore;
            }

            let array_len = u32::from_le_bytes([
                buf[offset + known_offsets::ARRAY_LEN_OFF],
                buf[offset + known_offsets::ARRAY_LEN_OFF + 1],
                buf[offset + known_offsets::ARRAY_LEN_OFF + 2],
                buf[offset + known_offsets::ARRAY_LEN_OFF + 3],
            ]) as u64;
            let padding_len = u16::from_le_bytes([
                buf[offset + known_offsets::PADDING_LEN_OFF],
                buf[offset + known_offsets::PADDING_LEN_OFF + 1],
            ]) as u64;

            let total: u64 = fixed_part as u64
                + array_len * item_size as u64
                + padding_len * 2
                + 2;

            if total == 0 || total > i32::MAX as u64 {
                return Verdict::Malformed("known-category total size is zero or overflows int");
            }
            if total % 8 != 0 {
                return Verdict::Malformed("known-category total size is not a multiple of 8");
            }
            let total = total as usize;

            if available < total {
                Verdict::NeedMore
            } else {
                Verdict::Size(total)
            }
        }

        Category::Unknown {
            fixed_part,
            record_size,
            signature,
            limit,
        } => {
            if available < fixed_part {
                return Verdict::NeedMore;
            }

            for k in 0..limit {
                let sig_pos = fixed_part + k * record_size;
                let end = sig_pos + signature.len() + 2;

                if end > available {
                    return Verdict::NeedMore;
                }

                let sig_start = offset + sig_pos;
                if &buf[sig_start..sig_start + signature.len()] == signature {
                    return Verdict::Size(end);
                }
            }

            Verdict::Malformed("no signature found within scan limit")
        }

        Category::Unsupported => Verdict::Malformed("unsupported packet type"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::packet_type;
    use crate::wire::PacketTypeRegistry;

    #[test]
    fn fixed_need_more() {
        let cat = PacketTypeRegistry::category(packet_type::PHA_EVENT_INFO);
        let buf = vec![0u8; 30];
        assert_eq!(probe(cat, &buf, 0), Verdict::NeedMore);
    }

    #[test]
    fn fixed_exact_size() {
        let cat = PacketTypeRegistry::category(packet_type::PHA_EVENT_INFO);
        let buf = vec![0u8; 56];
        assert_eq!(probe(cat, &buf, 0), Verdict::Size(56));
    }

    #[test]
    fn known_total_size_s3_scenario() {
        // §8 S3: arrayLen=4, paddingLen=3 -> total = 16+4+2+2+4*2+2+3*2 = 40
        let cat = PacketTypeRegistry::category(packet_type::PSD_WAVEFORM);
        let mut buf = vec![0u8; 40];
        buf[16..20].copy_from_slice(&4u32.to_le_bytes());
        buf[22..24].copy_from_slice(&3u16.to_le_bytes());
        assert_eq!(probe(cat, &buf, 0), Verdict::Size(40));
    }

    #[test]
    fn known_not_multiple_of_8_is_malformed() {
        // §8 S3: arrayLen=4, paddingLen=2 -> total = 16+4+2+2+8+2+4 = 38, not 8-aligned.
        let cat = PacketTypeRegistry::category(packet_type::PSD_WAVEFORM);
        let mut buf = vec![0u8; 38];
        buf[16..20].copy_from_slice(&4u32.to_le_bytes());
        buf[22..24].copy_from_slice(&2u16.to_le_bytes());
        assert_eq!(
            probe(cat, &buf, 0),
            Verdict::Malformed("known-category total size is not a multiple of 8")
        );
    }

    #[test]
    fn known_not_enough_bytes_yet() {
        let cat = PacketTypeRegistry::category(packet_type::PSD_WAVEFORM);
        let mut buf = vec![0u8; 24];
        buf[16..20].copy_from_slice(&4u32.to_le_bytes());
        buf[22..24].copy_from_slice(&3u16.to_le_bytes());
        assert_eq!(probe(cat, &buf, 0), Verdict::NeedMore);
    }

    #[test]
    fn unknown_signature_match_at_k3() {
        let cat = PacketTypeRegistry::category(packet_type::DETECTRON_2D_DATA);
        let mut buf = vec![0u8; 16 + 3 * 16 + 6 + 2];
        let sig_pos = 16 + 3 * 16;
        buf[sig_pos..sig_pos + 6].copy_from_slice(&crate::wire::DETECTRON_SIGNATURE);
        assert_eq!(probe(cat, &buf, 0), Verdict::Size(sig_pos + 6 + 2));
    }

    #[test]
    fn unknown_no_signature_is_malformed() {
        let cat = PacketTypeRegistry::category(packet_type::DETECTRON_2D_DATA);
        // Large enough for the full scan limit, but no signature anywhere.
        let buf = vec![0u8; 16 + 64 * 16 + 8];
        assert_eq!(
            probe(cat, &buf, 0),
            Verdict::Malformed("no signature found within scan limit")
        );
    }

    #[test]
    fn unsupported_type_is_malformed() {
        assert_eq!(
            probe(Category::Unsupported, &[0u8; 64], 0),
            Verdict::Malformed("unsupported packet type")
        );
    }
}
