// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # pulseframe
//!
//! A per-device ingest pipeline for digitizer event/waveform streams: a
//! self-synchronizing byte framer, structural size probing, type-
//! specialized decoding on a bounded worker pool, info/waveform pair
//! coordination, split-waveform reassembly, and multi-channel
//! separation.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pulseframe::{open_device, Config};
//! use pulseframe::decode::{PhaEventInfoDecoder, PsdEventInfoDecoder, PsdWaveformDecoder};
//!
//! let buffer = open_device(1, Config::new()).expect("valid config");
//! buffer.register_parser(Box::new(PhaEventInfoDecoder::new(1)));
//! buffer.register_pair(
//!     Box::new(PsdEventInfoDecoder::new(1)),
//!     Box::new(PsdWaveformDecoder::new(1)),
//! );
//! buffer.on_parsed(|record| {
//!     // forward `record` to storage, a UI, whatever owns the data
//!     let _ = record;
//! });
//!
//! // Feed bytes as they arrive off the wire (socket, serial port, file...).
//! buffer.process_data(&[/* ... */]);
//! ```
//!
//! ## Modules
//!
//! - [`wire`] - header layout, packet-type registry, structural categories
//! - [`checksum`] - the one's-complement checksum used by every category
//! - [`sizeprobe`] - per-category total-size determination
//! - [`framer`] - the self-synchronizing byte-stream scanner
//! - [`decode`] - type-specialized decoders and the [`decode::Record`] union
//! - [`worker_pool`] - bounded, per-key-FIFO dispatch
//! - [`pair_coordinator`] - info/waveform pairing and dual-failure reporting
//! - [`split_reassembler`] - split-waveform fragment reassembly
//! - [`channel_separator`] - interleaved/consistent multi-channel splitting
//! - [`emit_queue`] - optional output batching
//! - [`config`] - runtime tuning knobs
//! - [`error`] - the crate's error taxonomy

pub mod channel_separator;
pub mod checksum;
pub mod config;
pub mod decode;
pub mod emit_queue;
pub mod error;
pub mod framer;
pub mod logging;
pub mod pair_coordinator;
mod packet_buffer;
pub mod sizeprobe;
pub mod slice;
pub mod split_reassembler;
pub mod wire;
pub mod worker_pool;

pub use config::Config;
pub use decode::{Decoder, Record};
pub use error::{ConfigError, ParseError, ParseResult, PacketTypeCode};
pub use packet_buffer::PacketBuffer;

/// Construct a [`PacketBuffer`] for `device_id`. A thin, named entry
/// point kept alongside `PacketBuffer::new` so callers reading
/// `open_device(...)` at a call site don't need to know the
/// composition root's type name up front.
pub fn open_device(device_id: u32, config: Config) -> Result<PacketBuffer, ConfigError> {
    PacketBuffer::new(device_id, config)
}
