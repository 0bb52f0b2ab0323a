//! Layered dissector pipeline.
//!
//! Every protocol layer is a [`Dissector`] registered in a [`Pipeline`]
//! table keyed by [`ProtocolId`]. A dissector either consumes the buffer
//! (`None`) or hands a possibly rewritten remainder to its declared
//! subdissectors (`Some`). A layer *claims* a packet by attaching its
//! record; once a candidate claims, its siblings are not tried.
//!
//! Dissection never fails loudly: malformed or unrecognised bytes make a
//! layer decline, and the packet keeps the records of the layers that
//! succeeded.

mod conn;
mod ip;
mod link;
mod pipeline;
mod rtcp;
mod rtp;
mod sip;
mod tcp;
mod tls;
mod udp;
mod ws;

use serde::{Deserialize, Serialize};

use crate::packet::{Endpoint, Packet};

pub use conn::{ConnKey, ConnectionArena};
pub use ip::IpDissector;
pub use link::LinkDissector;
pub use pipeline::{DissectorToggles, Pipeline};
pub use rtcp::RtcpDissector;
pub use rtp::RtpDissector;
pub use sip::SipDissector;
pub use tcp::TcpDissector;
pub use tls::{TlsDecryptor, TlsDissector, TlsKey, TlsKeyError};
pub use udp::UdpDissector;
pub use ws::WsDissector;

/// Identifier of a protocol layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolId {
    Link,
    Ip,
    Udp,
    Tcp,
    Tls,
    Ws,
    Sip,
    Rtp,
    Rtcp,
}

impl ProtocolId {
    pub const COUNT: usize = 9;

    pub const ALL: [ProtocolId; Self::COUNT] = [
        ProtocolId::Link,
        ProtocolId::Ip,
        ProtocolId::Udp,
        ProtocolId::Tcp,
        ProtocolId::Tls,
        ProtocolId::Ws,
        ProtocolId::Sip,
        ProtocolId::Rtp,
        ProtocolId::Rtcp,
    ];

    /// Name used in settings (`capture.packet.<name>`).
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolId::Link => "link",
            ProtocolId::Ip => "ip",
            ProtocolId::Udp => "udp",
            ProtocolId::Tcp => "tcp",
            ProtocolId::Tls => "tls",
            ProtocolId::Ws => "ws",
            ProtocolId::Sip => "sip",
            ProtocolId::Rtp => "rtp",
            ProtocolId::Rtcp => "rtcp",
        }
    }

    pub fn from_name(name: &str) -> Option<ProtocolId> {
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(name))
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A further packet split off by a stream layer, resumed at that layer's
/// subdissectors once the current packet is done.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedPacket {
    pub layer: ProtocolId,
    pub packet: Packet,
    pub data: Vec<u8>,
}

/// Per-packet state threaded through one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct DissectContext {
    /// Capture datalink type of the frame being dissected.
    pub datalink: i32,
    /// Set by a layer that kept the packet's frames for reassembly; the
    /// packet is then not emitted by this run.
    pub held: bool,
    /// Packets that came out of the same frame after the current one.
    pub queued: Vec<QueuedPacket>,
}

impl DissectContext {
    pub fn new(datalink: i32) -> Self {
        Self {
            datalink,
            held: false,
            queued: Vec::new(),
        }
    }

    pub fn queue(&mut self, layer: ProtocolId, packet: Packet, data: Vec<u8>) {
        self.queued.push(QueuedPacket {
            layer,
            packet,
            data,
        });
    }
}

/// One protocol layer of the pipeline.
pub trait Dissector: Send {
    fn id(&self) -> ProtocolId;

    /// Candidate next layers, tried in order.
    fn subdissectors(&self) -> &'static [ProtocolId];

    /// Decode this layer from `data`.
    ///
    /// Returns `None` when the buffer was consumed (or dropped) and `Some`
    /// with the bytes to offer to the subdissectors otherwise. A dissector
    /// that does not recognise the data returns it unchanged without
    /// attaching a record.
    fn dissect(
        &mut self,
        ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>>;
}

pub(crate) fn packet_endpoints(packet: &Packet) -> Option<(Endpoint, Endpoint)> {
    Some((packet.src()?, packet.dst()?))
}
