// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-specialized decoders (§4.4) and the tagged-union record type they
//! produce.
//!
//! Decoders differ by target record type but share one contract:
//! `decode(view) -> ParseResult<Record>`. This is exposed as a tagged
//! union of record variants ([`Record`]) rather than as type-erased
//! opaque pointers — the source's void-pointer worker pool is the
//! artifact the redesign notes (spec §9) call out for replacement.

mod detectron;
mod pha;
mod psd;
mod spectrum;
mod waveform;

pub use detectron::{Detectron2DData, DetectronHit, DetectronStatisticData};
pub use pha::{PhaEventInfo, PhaWaveform};
pub use psd::{PsdEventInfo, PsdEventInfoV2, PsdWaveform};
pub use spectrum::{Spectrum16, Spectrum32};
pub use waveform::WaveformRecord;

use crate::checksum;
use crate::error::{ParseError, ParseResult};
use crate::slice::PacketSlice;
use crate::wire::Header;

/// One decoded record, tagged by which wire type produced it.
#[derive(Debug, Clone)]
pub enum Record {
    PsdEventInfo(PsdEventInfo),
    PsdEventInfoV2(PsdEventInfoV2),
    PsdWaveform(PsdWaveform),
    PhaEventInfo(PhaEventInfo),
    PhaWaveform(PhaWaveform),
    InterleavedWaveform(WaveformRecord),
    SplitUpWaveform(WaveformRecord),
    Detectron2DData(Detectron2DData),
    DetectronStatisticData(DetectronStatisticData),
    Spectrum16(Spectrum16),
    Spectrum32(Spectrum32),
}

impl Record {
    pub fn header(&self) -> &Header {
        match self {
            Record::PsdEventInfo(r) => &r.header,
            Record::PsdEventInfoV2(r) => &r.header,
            Record::PsdWaveform(r) => &r.header,
            Record::PhaEventInfo(r) => &r.header,
            Record::PhaWaveform(r) => &r.header,
            Record::InterleavedWaveform(r) => &r.header,
            Record::SplitUpWaveform(r) => &r.header,
            Record::Detectron2DData(r) => &r.header,
            Record::DetectronStatisticData(r) => &r.header,
            Record::Spectrum16(r) => &r.header,
            Record::Spectrum32(r) => &r.header,
        }
    }

    pub fn raw(&self) -> &[u8] {
        match self {
            Record::PsdEventInfo(r) => &r.raw,
            Record::PsdEventInfoV2(r) => &r.raw,
            Record::PsdWaveform(r) => &r.raw,
            Record::PhaEventInfo(r) => &r.raw,
            Record::PhaWaveform(r) => &r.raw,
            Record::InterleavedWaveform(r) => &r.raw,
            Record::SplitUpWaveform(r) => &r.raw,
            Record::Detectron2DData(r) => &r.raw,
            Record::DetectronStatisticData(r) => &r.raw,
            Record::Spectrum16(r) => &r.raw,
            Record::Spectrum32(r) => &r.raw,
        }
    }
}

/// Validate the common header fields (device id, packet type) shared by
/// every decoder, and return the parsed header on success.
fn validate_header(view: &[u8], expected_device_id: u32, expected_type: u8) -> ParseResult<Header> {
    let header = Header::read(view);
    if header.device_id != expected_device_id {
        return Err(ParseError::InvalidDeviceId {
            expected: expected_device_id,
            actual: header.device_id,
        });
    }
    if header.packet_type != expected_type {
        return Err(ParseError::UnsupportedPacketType {
            expected: expected_type,
            actual: header.packet_type,
        });
    }
    Ok(header)
}

/// Validate a checksum window against the stored value at `stored_at`.
fn validate_checksum(view: &[u8], window: std::ops::Range<usize>, stored_at: usize) -> ParseResult<()> {
    let expected = checksum::checksum(&view[window]);
    let actual = u16::from_le_bytes([view[stored_at], view[stored_at + 1]]);
    if expected != actual {
        return Err(ParseError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

/// A type-specialized, per-worker decoder bound to one wire packet type
/// and one expected device id. Holds no shared mutable state and
/// allocates only for the record's own payload arrays (§4.4).
pub trait Decoder: Send + Sync {
    fn decode(&self, slice: &PacketSlice) -> ParseResult<Record>;
    /// The wire `packet_type` byte this decoder is bound to.
    fn packet_type(&self) -> u8;
}

macro_rules! simple_decoder {
    ($name:ident, $record:ident, $variant:ident, $type_const:expr) => {
        /// Decoder bound to one wire type and one expected device id.
        pub struct $name {
            expected_device_id: u32,
        }

        impl $name {
            pub fn new(expected_device_id: u32) -> Self {
                Self { expected_device_id }
            }
        }

        impl Decoder for $name {
            fn decode(&self, slice: &PacketSlice) -> ParseResult<Record> {
                Ok(Record::$variant($record::decode(
                    slice.view(),
                    self.expected_device_id,
                )?))
            }

            fn packet_type(&self) -> u8 {
                $type_const
            }
        }
    };
}

simple_decoder!(PsdEventInfoDecoder, PsdEventInfo, PsdEventInfo, crate::wire::packet_type::PSD_EVENT_INFO);
simple_decoder!(
    PsdEventInfoV2Decoder,
    PsdEventInfoV2,
    PsdEventInfoV2,
    crate::wire::packet_type::PSD_EVENT_INFO_V2
);
simple_decoder!(PhaEventInfoDecoder, PhaEventInfo, PhaEventInfo, crate::wire::packet_type::PHA_EVENT_INFO);
simple_decoder!(
    DetectronStatisticDataDecoder,
    DetectronStatisticData,
    DetectronStatisticData,
    crate::wire::packet_type::DETECTRON_STATISTIC_DATA
);
simple_decoder!(
    Detectron2DDataDecoder,
    Detectron2DData,
    Detectron2DData,
    crate::wire::packet_type::DETECTRON_2D_DATA
);
simple_decoder!(Spectrum16Decoder, Spectrum16, Spectrum16, crate::wire::packet_type::CONSISTENT_CHANNEL_SPECTRUM_16);
simple_decoder!(Spectrum32Decoder, Spectrum32, Spectrum32, crate::wire::packet_type::CONSISTENT_CHANNEL_SPECTRUM_32);

/// Waveform decoders need to know which `Record` variant to tag their
/// output with (the layout is identical across waveform types), so they
/// are not generated by the simple-decoder macro above.
pub struct PsdWaveformDecoder {
    expected_device_id: u32,
}
impl PsdWaveformDecoder {
    pub fn new(expected_device_id: u32) -> Self {
        Self { expected_device_id }
    }
}
impl Decoder for PsdWaveformDecoder {
    fn decode(&self, slice: &PacketSlice) -> ParseResult<Record> {
        Ok(Record::PsdWaveform(PsdWaveform(waveform::WaveformRecord::decode(
            slice.view(),
            self.expected_device_id,
            crate::wire::packet_type::PSD_WAVEFORM,
        )?)))
    }
    fn packet_type(&self) -> u8 {
        crate::wire::packet_type::PSD_WAVEFORM
    }
}

pub struct PhaWaveformDecoder {
    expected_device_id: u32,
}
impl PhaWaveformDecoder {
    pub fn new(expected_device_id: u32) -> Self {
        Self { expected_device_id }
    }
}
impl Decoder for PhaWaveformDecoder {
    fn decode(&self, slice: &PacketSlice) -> ParseResult<Record> {
        Ok(Record::PhaWaveform(PhaWaveform(waveform::WaveformRecord::decode(
            slice.view(),
            self.expected_device_id,
            crate::wire::packet_type::PHA_WAVEFORM,
        )?)))
    }
    fn packet_type(&self) -> u8 {
        crate::wire::packet_type::PHA_WAVEFORM
    }
}

pub struct InterleavedWaveformDecoder {
    expected_device_id: u32,
}
impl InterleavedWaveformDecoder {
    pub fn new(expected_device_id: u32) -> Self {
        Self { expected_device_id }
    }
}
impl Decoder for InterleavedWaveformDecoder {
    fn decode(&self, slice: &PacketSlice) -> ParseResult<Record> {
        Ok(Record::InterleavedWaveform(waveform::WaveformRecord::decode(
            slice.view(),
            self.expected_device_id,
            crate::wire::packet_type::INTERLEAVED_WAVEFORM,
        )?))
    }
    fn packet_type(&self) -> u8 {
        crate::wire::packet_type::INTERLEAVED_WAVEFORM
    }
}

pub struct SplitUpWaveformDecoder {
    expected_device_id: u32,
}
impl SplitUpWaveformDecoder {
    pub fn new(expected_device_id: u32) -> Self {
        Self { expected_device_id }
    }
}
impl Decoder for SplitUpWaveformDecoder {
    fn decode(&self, slice: &PacketSlice) -> ParseResult<Record> {
        Ok(Record::SplitUpWaveform(waveform::WaveformRecord::decode(
            slice.view(),
            self.expected_device_id,
            crate::wire::packet_type::SPLIT_UP_WAVEFORM,
        )?))
    }
    fn packet_type(&self) -> u8 {
        crate::wire::packet_type::SPLIT_UP_WAVEFORM
    }
}
