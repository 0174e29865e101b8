// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end scenarios driven entirely through the public
//! [`pulseframe::open_device`]/[`pulseframe::PacketBuffer`] surface —
//! bytes in one end, records or error counts out the other.

mod common;

use pulseframe::decode::{
    Detectron2DDataDecoder, InterleavedWaveformDecoder, PhaEventInfoDecoder, PsdEventInfoDecoder,
    PsdWaveformDecoder, Spectrum16Decoder, SplitUpWaveformDecoder,
};
use pulseframe::wire::{fixed_size, packet_type, Header, HEADER_SIZE};
use pulseframe::{open_device, Config, Record};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn checksummed(mut buf: Vec<u8>, checksum_at: usize) -> Vec<u8> {
    let c = pulseframe::checksum::checksum(&buf[..checksum_at]);
    buf[checksum_at..checksum_at + 2].copy_from_slice(&c.to_le_bytes());
    buf
}

fn pha_event_info(device_id: u32, rtc: u64, trap_height_max: i64) -> Vec<u8> {
    let mut buf = vec![0u8; fixed_size::PHA_EVENT_INFO];
    Header {
        device_id,
        packet_type: packet_type::PHA_EVENT_INFO,
        flags: 0,
        channel_id: 0,
        rtc,
    }
    .write(&mut buf);
    // trapHeightMax is the third i64 of the body, at offset 16+8+8=32.
    buf[HEADER_SIZE + 16..HEADER_SIZE + 24].copy_from_slice(&trap_height_max.to_le_bytes());
    checksummed(buf, fixed_size::PHA_EVENT_INFO - 2)
}

fn psd_event_info(device_id: u32, rtc: u64) -> Vec<u8> {
    let mut buf = vec![0u8; fixed_size::PSD_EVENT_INFO];
    Header {
        device_id,
        packet_type: packet_type::PSD_EVENT_INFO,
        flags: 0,
        channel_id: 0,
        rtc,
    }
    .write(&mut buf);
    checksummed(buf, fixed_size::PSD_EVENT_INFO - 2)
}

fn collector() -> (Arc<Mutex<Vec<Record>>>, impl Fn(Record) + Send + Sync + 'static) {
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    (records, move |r| sink.lock().unwrap().push(r))
}

/// S1 — single Fixed PHA (type 3): one record, correct fields, no errors.
#[test]
fn s1_single_fixed_pha_record() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_parser(Box::new(PhaEventInfoDecoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    buffer.process_data(&pha_event_info(1, 0x10, 0x7F));

    assert!(common::wait_until(Duration::from_millis(200), || !records.lock().unwrap().is_empty()));
    let got = records.lock().unwrap();
    assert_eq!(got.len(), 1);
    match &got[0] {
        Record::PhaEventInfo(r) => {
            assert_eq!(r.header.rtc, 0x10);
            assert_eq!(r.trap_height_max, 0x7F);
        }
        other => panic!("unexpected record: {other:?}"),
    }
    assert!(buffer.error_counts().is_empty());
}

/// S2 — two concatenated Fixed PSD packets: two records in order, framer
/// left with zero residual bytes.
#[test]
fn s2_two_concatenated_fixed_psd() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_parser(Box::new(PsdEventInfoDecoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    let mut stream = psd_event_info(1, 1);
    stream.extend_from_slice(&psd_event_info(1, 2));
    buffer.process_data(&stream);

    assert!(common::wait_until(Duration::from_millis(200), || records.lock().unwrap().len() == 2));
    let got = records.lock().unwrap();
    let rtcs: Vec<u64> = got
        .iter()
        .map(|r| match r {
            Record::PsdEventInfo(r) => r.header.rtc,
            other => panic!("unexpected record: {other:?}"),
        })
        .collect();
    assert_eq!(rtcs, vec![1, 2]);
}

/// S3 — Known waveform (type 2), arrayLen=4, paddingLen=3 (the only
/// 8-aligned choice at that array length): one record, array preserved.
#[test]
fn s3_known_waveform_array_preserved() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_parser(Box::new(PsdWaveformDecoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    let array = [10i16, 20, 30, 40];
    let packet = pulseframe::decode::WaveformRecord::encode(1, packet_type::PSD_WAVEFORM, 0, 0, 5, 0, &array, 3);
    assert_eq!(packet.len() % 8, 0);
    buffer.process_data(&packet);

    assert!(common::wait_until(Duration::from_millis(200), || !records.lock().unwrap().is_empty()));
    let records_guard = records.lock().unwrap();
    match &records_guard[0] {
        Record::PsdWaveform(w) => assert_eq!(w.array, array),
        other => panic!("unexpected record: {other:?}"),
    }
}

/// S4 — truncated Fixed packet: no record until the remaining bytes
/// arrive, then exactly one.
#[test]
fn s4_truncated_fixed_packet_completes_on_remainder() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_parser(Box::new(PhaEventInfoDecoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    let packet = pha_event_info(1, 0x20, 1);
    buffer.process_data(&packet[..30]);
    std::thread::sleep(Duration::from_millis(50));
    assert!(records.lock().unwrap().is_empty());

    buffer.process_data(&packet[30..]);
    assert!(common::wait_until(Duration::from_millis(200), || !records.lock().unwrap().is_empty()));
    assert_eq!(records.lock().unwrap().len(), 1);
}

/// S5 — Unknown packet (Detectron2DData) with signature match at k=3.
#[test]
fn s5_detectron_signature_match_at_k3() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_parser(Box::new(Detectron2DDataDecoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    let hits = [(1u32, 100i16, -50i16, 10u64), (2, 200, -60, 20), (3, 300, -70, 30)];
    let mut buf = vec![0u8; HEADER_SIZE + hits.len() * 16 + 6 + 2];
    Header {
        device_id: 1,
        packet_type: packet_type::DETECTRON_2D_DATA,
        flags: 0,
        channel_id: 0,
        rtc: 0,
    }
    .write(&mut buf);
    for (i, (channel_num, amp1, amp2, rtc)) in hits.iter().enumerate() {
        let off = HEADER_SIZE + i * 16;
        buf[off..off + 4].copy_from_slice(&channel_num.to_le_bytes());
        buf[off + 4..off + 6].copy_from_slice(&amp1.to_le_bytes());
        buf[off + 6..off + 8].copy_from_slice(&amp2.to_le_bytes());
        buf[off + 8..off + 16].copy_from_slice(&rtc.to_le_bytes());
    }
    let sig_at = HEADER_SIZE + hits.len() * 16;
    buf[sig_at..sig_at + 6].copy_from_slice(&pulseframe::wire::DETECTRON_SIGNATURE);
    let packet = checksummed(buf, sig_at + 6);

    buffer.process_data(&packet);
    assert!(common::wait_until(Duration::from_millis(200), || !records.lock().unwrap().is_empty()));
    let records_guard = records.lock().unwrap();
    match &records_guard[0] {
        Record::Detectron2DData(d) => assert_eq!(d.hits.len(), 3),
        other => panic!("unexpected record: {other:?}"),
    }
}

/// S6 — split-waveform reassembly: three fragments sharing
/// `channelId=7, rtc=0xAABB` merge into one record.
#[test]
fn s6_split_waveform_reassembly() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_parser(Box::new(SplitUpWaveformDecoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    use pulseframe::decode::WaveformRecord;
    use pulseframe::wire::split_flags;

    let begin = WaveformRecord::encode(1, packet_type::SPLIT_UP_WAVEFORM, split_flags::HAS_BEGIN, 7, 0xAABB, 1, &[1, 2], 0);
    let middle = WaveformRecord::encode(1, packet_type::SPLIT_UP_WAVEFORM, 0, 7, 0xAABB, 1, &[3, 4], 0);
    let end = WaveformRecord::encode(1, packet_type::SPLIT_UP_WAVEFORM, split_flags::HAS_END, 7, 0xAABB, 1, &[5, 6], 0);

    buffer.process_data(&begin);
    std::thread::sleep(Duration::from_millis(20));
    buffer.process_data(&middle);
    std::thread::sleep(Duration::from_millis(20));
    buffer.process_data(&end);

    assert!(common::wait_until(Duration::from_millis(300), || !records.lock().unwrap().is_empty()));
    let records_guard = records.lock().unwrap();
    match &records_guard[0] {
        Record::SplitUpWaveform(w) => {
            assert_eq!(w.array, vec![1, 2, 3, 4, 5, 6]);
            assert_eq!(w.header.channel_id, 7);
            assert_eq!(w.header.rtc, 0xAABB);
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

/// S7 — pair with rtc mismatch: two `RtcMismatch` errors, no records.
#[test]
fn s7_pair_rtc_mismatch_reports_both_sides() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_pair(Box::new(PsdEventInfoDecoder::new(1)), Box::new(PsdWaveformDecoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    let mut stream = psd_event_info(1, 10);
    stream.extend_from_slice(&pulseframe::decode::WaveformRecord::encode(
        1,
        packet_type::PSD_WAVEFORM,
        0,
        0,
        11,
        0,
        &[1, 2],
        0,
    ));
    buffer.process_data(&stream);

    assert!(common::wait_until(Duration::from_millis(200), || buffer.error_counts().len() == 2));
    let counts = buffer.error_counts();
    assert_eq!(counts.get(&packet_type::PSD_EVENT_INFO), Some(&1));
    assert_eq!(counts.get(&packet_type::PSD_WAVEFORM), Some(&1));
    assert!(records.lock().unwrap().is_empty());
}

/// Ambient: channel separation runs automatically downstream of decode —
/// an interleaved waveform with two active channel bits arrives as one
/// wire packet and is delivered as two records.
#[test]
fn interleaved_waveform_separates_into_two_channel_records() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_parser(Box::new(InterleavedWaveformDecoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    let array = [1i16, 2, 3, 4, 5];
    let packet = pulseframe::decode::WaveformRecord::encode(1, packet_type::INTERLEAVED_WAVEFORM, 0, 0b11, 9, 0, &array, 0);
    buffer.process_data(&packet);

    assert!(common::wait_until(Duration::from_millis(200), || records.lock().unwrap().len() == 2));
    let got = records.lock().unwrap();
    let channel_ids: Vec<u16> = got
        .iter()
        .map(|r| match r {
            Record::InterleavedWaveform(w) => w.header.channel_id,
            other => panic!("unexpected record: {other:?}"),
        })
        .collect();
    assert_eq!(channel_ids, vec![0, 1]);
}

/// Ambient: a consistent-channel spectrum whose bin count doesn't divide
/// evenly across active channels is dropped and counted as an error
/// rather than delivered malformed.
#[test]
fn consistent_spectrum_non_divisible_length_is_dropped_and_counted() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_parser(Box::new(Spectrum16Decoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    let fixed_part = HEADER_SIZE + 4 + 2 + 2;
    let bins = [1u16, 2, 3];
    let mut buf = vec![0u8; fixed_part + bins.len() * 2 + 2];
    Header {
        device_id: 1,
        packet_type: packet_type::CONSISTENT_CHANNEL_SPECTRUM_16,
        flags: 0,
        channel_id: 0b111,
        rtc: 0,
    }
    .write(&mut buf);
    buf[16..20].copy_from_slice(&(bins.len() as u32).to_le_bytes());
    for (i, b) in bins.iter().enumerate() {
        let off = fixed_part + i * 2;
        buf[off..off + 2].copy_from_slice(&b.to_le_bytes());
    }
    let packet = checksummed(buf, fixed_part + bins.len() * 2);

    buffer.process_data(&packet);

    assert!(common::wait_until(Duration::from_millis(200), || {
        buffer.error_counts().get(&packet_type::CONSISTENT_CHANNEL_SPECTRUM_16) == Some(&1)
    }));
    assert!(records.lock().unwrap().is_empty());
}

/// Ambient: `set_measurement_stopped(true)` drops the framer's retained
/// bytes and further `process_data` calls are no-ops until re-enabled.
#[test]
fn measurement_stopped_then_resumed() {
    common::init_test_logging();
    let buffer = open_device(1, Config::new().with_parser_pool_size(1)).unwrap();
    buffer.register_parser(Box::new(PhaEventInfoDecoder::new(1)));
    let (records, sink) = collector();
    buffer.on_parsed(sink);

    buffer.set_measurement_stopped(true);
    buffer.process_data(&pha_event_info(1, 1, 1));
    std::thread::sleep(Duration::from_millis(50));
    assert!(records.lock().unwrap().is_empty());

    buffer.set_measurement_stopped(false);
    buffer.process_data(&pha_event_info(1, 2, 1));
    assert!(common::wait_until(Duration::from_millis(200), || !records.lock().unwrap().is_empty()));
    let records_guard = records.lock().unwrap();
    match &records_guard[0] {
        Record::PhaEventInfo(r) => assert_eq!(r.header.rtc, 2),
        other => panic!("unexpected record: {other:?}"),
    }
}
