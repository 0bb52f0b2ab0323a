//! CallShark core library: SIP dialogs and their RTP/RTCP streams from
//! packet captures.
//!
//! Frames read from a [`source`] go through the dissector [`pipeline`]
//! (link, IP with fragment reassembly, UDP/TCP, TLS, WebSocket, then SIP,
//! RTP or RTCP). SIP messages are grouped into dialogs by the
//! [`CallRegistry`], which runs the call-state machine; RTP and RTCP
//! packets are attributed to the streams that SDP negotiated by the stream
//! matcher. Parsing is byte-oriented and side-effect free; all I/O is
//! isolated in `source` and `config`.
//!
//! Invariants:
//! - Calls and streams are never removed or reordered while a capture runs.
//! - A packet belongs to at most one stream.
//! - Report output is deterministic for a given capture and settings.
//!
//! [`pipeline`]: dissect::Pipeline
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use callshark_core::{Settings, analyze_pcap_file};
//!
//! let report = analyze_pcap_file(Path::new("capture.pcap"), &Settings::default())?;
//! for call in &report.calls {
//!     println!("{} {:?}", call.call_id, call.state);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
pub mod call;
pub mod capture;
pub mod config;
pub mod dissect;
pub mod packet;
pub mod protocols;
pub mod source;
pub mod stream;
#[cfg(test)]
mod test_util;

pub use analysis::{AnalysisError, analyze_pcap_file, analyze_source};
pub use call::{Call, CallRegistry, CallState, RegistryOptions};
pub use capture::{Capture, CaptureError, CaptureSession, CaptureStats};
pub use config::{ConfigError, Settings};
pub use source::{MemorySource, PacketEvent, PacketSource, PcapFileSource, SourceError};
pub use stream::{RtpStream, StreamCodec, StreamKind};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Calls and capture counters for one input.
///
/// # Examples
/// ```
/// use callshark_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcap", 123);
/// assert_eq!(report.report_version, callshark_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 time of the last captured packet.
    pub generated_at: String,
    pub input: InputInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Calls in creation order.
    pub calls: Vec<CallSummary>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input capture metadata embedded in reports.
///
/// # Examples
/// ```
/// use callshark_core::InputInfo;
///
/// let input = InputInfo {
///     path: "capture.pcap".to_string(),
///     bytes: 1024,
/// };
/// assert_eq!(input.bytes, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes, 0 when the input is not a file.
    pub bytes: u64,
}

/// Packet counters for the whole capture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Frames read from the input.
    pub packets_total: u64,
    pub sip_packets: u64,
    pub rtp_packets: u64,
    pub rtcp_packets: u64,
    /// Media packets no call expected.
    pub media_unmatched: u64,
    /// Frames no application protocol claimed.
    pub dropped: u64,
    /// SIP messages identical to the previous one of their call.
    pub retransmissions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Owned view of one dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    pub index: usize,
    pub call_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_call_id: Option<String>,
    /// Method of the message that opened the dialog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    /// Only INVITE dialogs carry a state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<CallState>,
    pub msg_count: usize,
    pub retransmissions: usize,
    /// RFC3339 time of the first message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_ms: Option<u64>,
    pub streams: Vec<StreamSummary>,
}

impl CallSummary {
    pub fn from_call(call: &Call) -> Self {
        use crate::call::AttributeId;

        let first = call.first_message();
        let millis = |duration: std::time::Duration| duration.as_millis() as u64;
        Self {
            index: call.index(),
            call_id: call.call_id().to_string(),
            x_call_id: call.x_call_id().map(str::to_string),
            method: call.attribute(AttributeId::Method),
            from: call.attribute(AttributeId::From),
            to: call.attribute(AttributeId::To),
            src: call.attribute(AttributeId::Src),
            dst: call.attribute(AttributeId::Dst),
            transport: call.attribute(AttributeId::Transport),
            state: call.state(),
            msg_count: call.msg_count(),
            retransmissions: call.retransmissions(),
            start: first.and_then(|message| message.ts().to_rfc3339()),
            total_ms: call.total_duration().map(millis),
            conversation_ms: call.conversation_duration().map(millis),
            streams: call
                .streams()
                .iter()
                .map(|stream| StreamSummary::from_stream(call, stream))
                .collect(),
        }
    }
}

/// Owned view of one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub kind: StreamKind,
    /// Unknown until the first packet arrives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    pub dst: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<StreamCodec>,
    pub packets: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_packet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_packet: Option<String>,
}

impl StreamSummary {
    pub fn from_stream(call: &Call, stream: &RtpStream) -> Self {
        Self {
            kind: stream.kind(),
            src: stream.src().map(|src| src.to_string()),
            dst: stream.dst().to_string(),
            codec: call.codec(stream),
            packets: stream.pktcnt(),
            first_packet: stream.first_ts().and_then(|ts| ts.to_rfc3339()),
            last_packet: stream.last_ts().and_then(|ts| ts.to_rfc3339()),
        }
    }
}

/// Build a stub report with base fields filled and no calls.
///
/// # Examples
/// ```
/// use callshark_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcap", 123);
/// assert!(report.calls.is_empty());
/// assert_eq!(report.input.bytes, 123);
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "callshark".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        calls: vec![],
    }
}
