use std::fmt;

use serde::{Deserialize, Serialize};

use crate::packet::{Endpoint, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Rtp,
    Rtcp,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Rtp => "RTP",
            StreamKind::Rtcp => "RTCP",
        }
    }
}

/// SDP media a stream was negotiated by: message index inside the call and
/// media index inside that message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef {
    pub message: usize,
    pub media: usize,
}

/// Location of a stream: call index in the registry and stream index in
/// the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamRef {
    pub call: usize,
    pub stream: usize,
}

/// One directional media flow of a call.
///
/// A stream created from SDP only knows its destination; it becomes
/// complete when the first packet reveals its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpStream {
    kind: StreamKind,
    media: MediaRef,
    src: Option<Endpoint>,
    dst: Endpoint,
    format: Option<u8>,
    pktcnt: u64,
    first_ts: Option<Timestamp>,
    last_ts: Option<Timestamp>,
}

impl RtpStream {
    pub(crate) fn incomplete(kind: StreamKind, dst: Endpoint, media: MediaRef) -> Self {
        Self {
            kind,
            media,
            src: None,
            dst,
            format: None,
            pktcnt: 0,
            first_ts: None,
            last_ts: None,
        }
    }

    pub(crate) fn complete(
        kind: StreamKind,
        src: Endpoint,
        dst: Endpoint,
        format: Option<u8>,
        media: MediaRef,
    ) -> Self {
        Self {
            src: Some(src),
            format,
            ..Self::incomplete(kind, dst, media)
        }
    }

    /// Fix the source and format once the first packet is seen.
    pub(crate) fn set_source(&mut self, src: Endpoint, format: Option<u8>) {
        self.src = Some(src);
        self.format = format;
    }

    pub(crate) fn add_packet(&mut self, ts: Option<Timestamp>) {
        self.pktcnt += 1;
        if self.first_ts.is_none() {
            self.first_ts = ts;
        }
        if ts.is_some() {
            self.last_ts = ts;
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn media(&self) -> MediaRef {
        self.media
    }

    pub fn src(&self) -> Option<Endpoint> {
        self.src
    }

    pub fn dst(&self) -> Endpoint {
        self.dst
    }

    /// Payload type observed on the first packet (RTP only).
    pub fn format(&self) -> Option<u8> {
        self.format
    }

    pub fn pktcnt(&self) -> u64 {
        self.pktcnt
    }

    pub fn first_ts(&self) -> Option<Timestamp> {
        self.first_ts
    }

    pub fn last_ts(&self) -> Option<Timestamp> {
        self.last_ts
    }

    pub fn is_complete(&self) -> bool {
        self.src.is_some()
    }
}

/// Resolved codec of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCodec {
    pub id: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl fmt::Display for StreamCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.id),
        }
    }
}
