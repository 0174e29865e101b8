// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Minimal end-to-end demonstration of [`pulseframe`]: build one PHA
//! event-info packet by hand, feed it through a [`PacketBuffer`], and
//! print whatever comes out. Only built with `--features logging`; its
//! purpose is to give the `env_logger` subscriber something to run
//! against, not to exercise every module.

use pulseframe::decode::PhaEventInfoDecoder;
use pulseframe::wire::{fixed_size, packet_type, Header};
use pulseframe::{open_device, Config};

fn build_pha_event_info(rtc: u64) -> Vec<u8> {
    let mut buf = vec![0u8; fixed_size::PHA_EVENT_INFO];
    let header = Header {
        device_id: 1,
        packet_type: packet_type::PHA_EVENT_INFO,
        flags: 0,
        channel_id: 0,
        rtc,
    };
    header.write(&mut buf);
    let checksum_at = fixed_size::PHA_EVENT_INFO - 2;
    let c = pulseframe::checksum::checksum(&buf[..checksum_at]);
    buf[checksum_at..checksum_at + 2].copy_from_slice(&c.to_le_bytes());
    buf
}

fn main() {
    env_logger::init();

    let buffer = open_device(1, Config::new().with_parser_pool_size(2)).expect("valid config");
    buffer.register_parser(Box::new(PhaEventInfoDecoder::new(1)));
    buffer.on_parsed_raw(|packet_type, bytes| {
        log::info!("raw slice: type={packet_type} len={}", bytes.len());
    });
    buffer.on_parsed(|record| {
        println!("decoded: {:?}", record.header());
    });

    let mut stream = Vec::new();
    for rtc in 0..3 {
        stream.extend_from_slice(&build_pha_event_info(rtc));
    }
    buffer.process_data(&stream);

    // process_data dispatches decoding to the worker pool; give it a
    // moment to drain before the process exits.
    std::thread::sleep(std::time::Duration::from_millis(100));

    println!("error counts: {:?}", buffer.error_counts());
}
