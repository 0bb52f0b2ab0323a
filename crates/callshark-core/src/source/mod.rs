//! Capture sources.
//!
//! A [`PacketSource`] yields raw frames with their capture metadata; the
//! capture session turns them into [`Frame`](crate::packet::Frame)s and
//! feeds the dissector pipeline.

pub mod pcap;

pub use pcap::PcapFileSource;

use std::collections::VecDeque;

use thiserror::Error;

use crate::packet::{Frame, Timestamp};

/// One raw frame read from a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketEvent {
    pub ts: Timestamp,
    /// Bytes captured.
    pub caplen: u32,
    /// Bytes on the wire.
    pub len: u32,
    /// Datalink type of the interface the frame came from.
    pub linktype: i32,
    pub data: Vec<u8>,
}

impl PacketEvent {
    pub fn into_frame(self) -> (i32, Frame) {
        (
            self.linktype,
            Frame::new(self.ts, self.caplen, self.len, self.data),
        )
    }
}

pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error: {0}")]
    Pcap(String),
}

impl From<pcap::error::PcapSourceError> for SourceError {
    fn from(value: pcap::error::PcapSourceError) -> Self {
        match value {
            pcap::error::PcapSourceError::Io(err) => SourceError::Io(err),
            pcap::error::PcapSourceError::Pcap { context, message } => {
                SourceError::Pcap(format!("{context}: {message}"))
            }
        }
    }
}

/// In-memory source, mostly for tests and replay of prepared frames.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    events: VecDeque<PacketEvent>,
}

impl MemorySource {
    pub fn new(events: impl IntoIterator<Item = PacketEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn push(&mut self, event: PacketEvent) {
        self.events.push_back(event);
    }
}

impl PacketSource for MemorySource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        Ok(self.events.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(sec: i64) -> PacketEvent {
        PacketEvent {
            ts: Timestamp::new(sec, 0),
            caplen: 2,
            len: 60,
            linktype: 1,
            data: vec![1, 2],
        }
    }

    #[test]
    fn memory_source_yields_in_order() {
        let mut source = MemorySource::new([event(1), event(2)]);
        source.push(event(3));
        let secs: Vec<i64> = std::iter::from_fn(|| source.next_packet().unwrap())
            .map(|e| e.ts.sec)
            .collect();
        assert_eq!(secs, vec![1, 2, 3]);
    }

    #[test]
    fn event_becomes_frame() {
        let (linktype, frame) = event(5).into_frame();
        assert_eq!(linktype, 1);
        assert_eq!(frame.caplen(), 2);
        assert_eq!(frame.len(), 60);
        assert_eq!(frame.data(), &[1, 2]);
    }
}
