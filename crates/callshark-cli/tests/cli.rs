use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("callshark"))
}

fn sip_frame(src: [u8; 4], dst: [u8; 4], message: &str) -> Vec<u8> {
    let builder = etherparse::PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [6, 5, 4, 3, 2, 1])
        .ipv4(src, dst, 64)
        .udp(5060, 5060);
    let mut data = Vec::with_capacity(builder.size(message.len()));
    builder
        .write(&mut data, message.as_bytes())
        .expect("frame");
    data
}

fn message(start: &str, call_id: &str, cseq: &str) -> String {
    format!(
        "{start}\r\n\
From: <sip:alice@example.com>;tag=a\r\n\
To: <sip:bob@example.com>;tag=b\r\n\
Call-ID: {call_id}\r\n\
CSeq: {cseq}\r\n\
Content-Length: 0\r\n\r\n"
    )
}

/// Legacy little-endian pcap with one Ethernet frame per second.
fn write_pcap(path: &Path, frames: &[Vec<u8>]) {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for (sec, frame) in frames.iter().enumerate() {
        let len = frame.len() as u32;
        out.extend_from_slice(&(sec as u32 + 1).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(frame);
    }
    fs::write(path, out).expect("write pcap");
}

fn sample_capture(dir: &TempDir) -> PathBuf {
    let caller = [10, 0, 0, 1];
    let callee = [10, 0, 0, 2];
    let path = dir.path().join("call.pcap");
    write_pcap(
        &path,
        &[
            sip_frame(caller, callee, &message("INVITE sip:bob@example.com SIP/2.0", "c1", "1 INVITE")),
            sip_frame(callee, caller, &message("SIP/2.0 200 OK", "c1", "1 INVITE")),
            sip_frame(caller, callee, &message("BYE sip:bob@example.com SIP/2.0", "c1", "2 BYE")),
            sip_frame(callee, caller, &message("SIP/2.0 200 OK", "c1", "2 BYE")),
            sip_frame(caller, callee, &message("OPTIONS sip:bob@example.com SIP/2.0", "o1", "1 OPTIONS")),
        ],
    );
    path
}

fn stdout_report(args: &[&str], input: &Path) -> Value {
    let assert = cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("--stdout")
        .args(args)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_supports_analyse_and_analyze() {
    cmd().arg("pcap").arg("analyse").arg("--help").assert().success();
    cmd().arg("pcap").arg("analyze").arg("--help").assert().success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcap");
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn stdout_report_lists_calls() {
    let temp = TempDir::new().expect("tempdir");
    let report = stdout_report(&[], &sample_capture(&temp));

    assert_eq!(report["tool"]["name"], "callshark");
    assert_eq!(report["capture_summary"]["packets_total"], 5);
    assert_eq!(report["capture_summary"]["sip_packets"], 5);
    let calls = report["calls"].as_array().expect("calls");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["call_id"], "c1");
    assert_eq!(calls[0]["state"], "COMPLETED");
    assert_eq!(calls[0]["msg_count"], 4);
    assert_eq!(calls[0]["conversation_ms"], 1000);
    assert_eq!(calls[1]["method"], "OPTIONS");
    assert!(calls[1].get("state").is_none());
}

#[test]
fn disabled_sip_dissector_yields_no_calls() {
    let temp = TempDir::new().expect("tempdir");
    let report = stdout_report(&["--disable", "sip"], &sample_capture(&temp));
    assert_eq!(report["calls"].as_array().expect("calls").len(), 0);
    assert_eq!(report["capture_summary"]["dropped"], 5);
}

#[test]
fn unknown_protocol_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(sample_capture(&temp))
        .arg("--stdout")
        .arg("--disable")
        .arg("sctp")
        .assert()
        .failure()
        .stderr(contains("unknown protocol").and(contains("hint:")));
}

#[test]
fn settings_file_applies_limit() {
    let temp = TempDir::new().expect("tempdir");
    let config = temp.path().join("callshark.conf");
    fs::write(&config, "# one dialog only\nset capture.limit 1\n").expect("write config");
    let report = stdout_report(&["--config", config.to_str().expect("utf8")], &sample_capture(&temp));
    assert_eq!(report["calls"].as_array().expect("calls").len(), 1);
}

#[test]
fn save_config_writes_effective_settings() {
    let temp = TempDir::new().expect("tempdir");
    let saved = temp.path().join("saved.conf");
    stdout_report(
        &["--disable", "rtcp", "--save-config", saved.to_str().expect("utf8")],
        &sample_capture(&temp),
    );
    let text = fs::read_to_string(saved).expect("saved config");
    assert!(text.contains("set capture.packet.rtcp off"));
    assert!(text.contains("set capture.packet.sip on"));
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(sample_capture(&temp))
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(sample_capture(&temp))
        .arg("-o")
        .arg(report)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn report_file_and_quiet() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(sample_capture(&temp))
        .arg("-o")
        .arg(&report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
    let json: Value = serde_json::from_str(&fs::read_to_string(report).expect("report")).expect("json");
    assert_eq!(json["report_version"], 1);
}

#[test]
fn list_calls_prints_table() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(sample_capture(&temp))
        .arg("-o")
        .arg(report)
        .arg("--list-calls")
        .assert()
        .success()
        .stderr(contains("Calls:").and(contains("COMPLETED")).and(contains("c1")));
}

#[test]
fn glob_with_several_matches_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    sample_capture(&temp);
    fs::copy(temp.path().join("call.pcap"), temp.path().join("copy.pcap")).expect("copy");
    let pattern = temp.path().join("*.pcap");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("multiple files match"));
}
