use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::capture::{Capture, CaptureError, CaptureStats};
use crate::config::Settings;
use crate::packet::Timestamp;
use crate::source::{PacketSource, PcapFileSource, SourceError};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, Report, make_stub_report};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Read a whole capture file and report every call found in it.
pub fn analyze_pcap_file(path: &Path, settings: &Settings) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    analyze_source(path, source, settings)
}

/// Drain `source` through a fresh capture engine. `path` only labels the
/// report input.
pub fn analyze_source<S: PacketSource>(
    path: &Path,
    mut source: S,
    settings: &Settings,
) -> Result<Report, AnalysisError> {
    let mut capture = Capture::new(settings, None)?;
    let stats = capture.run(&mut source)?;
    let registry = capture.registry().read();
    info!(
        path = %path.display(),
        frames = stats.frames,
        calls = registry.len(),
        "capture analyzed"
    );

    let bytes = std::fs::metadata(path).map_or(0, |meta| meta.len());
    let mut report = make_stub_report(&path.display().to_string(), bytes);
    report.capture_summary = Some(capture_summary(&stats, registry.stats().retransmissions));
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.calls = registry.snapshot();
    Ok(report)
}

fn capture_summary(stats: &CaptureStats, retransmissions: u64) -> CaptureSummary {
    CaptureSummary {
        packets_total: stats.frames,
        sip_packets: stats.sip_packets,
        rtp_packets: stats.rtp_packets,
        rtcp_packets: stats.rtcp_packets,
        media_unmatched: stats.media_unmatched,
        dropped: stats.dropped,
        retransmissions,
        time_start: ts_to_rfc3339(stats.first_ts),
        time_end: ts_to_rfc3339(stats.last_ts),
    }
}

fn ts_to_rfc3339(ts: Option<Timestamp>) -> Option<String> {
    ts?.to_rfc3339()
}
