use std::fs;
use std::path::Path;

use callshark_core::{PacketSource, PcapFileSource, SourceError};
use tempfile::TempDir;

fn udp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = etherparse::PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [6, 5, 4, 3, 2, 1])
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .udp(5060, 5060);
    let mut data = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut data, payload).unwrap();
    data
}

fn write_legacy(path: &Path, frames: &[(u32, u32, Vec<u8>)]) {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for (sec, usec, frame) in frames {
        out.extend_from_slice(&sec.to_le_bytes());
        out.extend_from_slice(&usec.to_le_bytes());
        out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        out.extend_from_slice(frame);
    }
    fs::write(path, out).unwrap();
}

fn block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total = (12 + body.len()) as u32;
    let mut out = Vec::new();
    out.extend_from_slice(&block_type.to_le_bytes());
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(&total.to_le_bytes());
    out
}

/// Section header, one Ethernet interface with default (microsecond)
/// resolution, one enhanced packet block per frame.
fn write_pcapng(path: &Path, frames: &[(u64, Vec<u8>)]) {
    let mut shb = Vec::new();
    shb.extend_from_slice(&0x1a2b_3c4du32.to_le_bytes());
    shb.extend_from_slice(&1u16.to_le_bytes());
    shb.extend_from_slice(&0u16.to_le_bytes());
    shb.extend_from_slice(&(-1i64).to_le_bytes());
    let mut idb = Vec::new();
    idb.extend_from_slice(&1u16.to_le_bytes());
    idb.extend_from_slice(&0u16.to_le_bytes());
    idb.extend_from_slice(&65535u32.to_le_bytes());

    let mut out = block(0x0a0d_0d0a, &shb);
    out.extend(block(1, &idb));
    for (micros, frame) in frames {
        let mut epb = Vec::new();
        epb.extend_from_slice(&0u32.to_le_bytes());
        epb.extend_from_slice(&((micros >> 32) as u32).to_le_bytes());
        epb.extend_from_slice(&(*micros as u32).to_le_bytes());
        epb.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        epb.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        epb.extend_from_slice(frame);
        epb.resize(epb.len().next_multiple_of(4), 0);
        out.extend(block(6, &epb));
    }
    fs::write(path, out).unwrap();
}

#[test]
fn legacy_pcap_yields_frames_with_timestamps() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capture.pcap");
    write_legacy(
        &path,
        &[(10, 250_000, udp_frame(b"one")), (11, 0, udp_frame(b"two"))],
    );

    let mut source = PcapFileSource::open(&path).unwrap();
    let first = source.next_packet().unwrap().unwrap();
    assert_eq!(first.linktype, 1);
    assert_eq!(first.ts.sec, 10);
    assert_eq!(first.ts.usec, 250_000);
    assert_eq!(first.caplen as usize, first.data.len());
    assert!(first.data.ends_with(b"one"));
    let second = source.next_packet().unwrap().unwrap();
    assert_eq!(second.ts.sec, 11);
    assert!(source.next_packet().unwrap().is_none());
}

#[test]
fn pcapng_uses_interface_linktype_and_resolution() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capture.pcapng");
    write_pcapng(&path, &[(5_000_123, udp_frame(b"hello"))]);

    let mut source = PcapFileSource::open(&path).unwrap();
    let event = source.next_packet().unwrap().unwrap();
    assert_eq!(event.linktype, 1);
    assert_eq!(event.ts.sec, 5);
    assert_eq!(event.ts.usec, 123);
    assert!(event.data.ends_with(b"hello"));
    assert!(source.next_packet().unwrap().is_none());
}

#[test]
fn pcap_source_rejects_truncated_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("truncated.pcapng");
    fs::write(&path, [0x0a, 0x0d, 0x0d]).unwrap();

    let err = match PcapFileSource::open(&path) {
        Ok(_) => panic!("expected truncated file to be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Io(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = PcapFileSource::open(&dir.path().join("absent.pcap")).err().unwrap();
    assert!(matches!(err, SourceError::Io(_)));
}
