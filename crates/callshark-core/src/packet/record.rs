use std::net::IpAddr;

use crate::protocols::rtp::RtpEncoding;
use crate::protocols::sip::SipPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub datalink: i32,
    pub header_len: usize,
    pub vlan: Option<u16>,
}

/// Network-layer fields, including fragment bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRecord {
    pub version: IpVersion,
    pub src: IpAddr,
    pub dst: IpAddr,
    pub protocol: u8,
    pub header_len: usize,
    pub id: u32,
    /// IP bytes present in this frame (header included).
    pub caplen: usize,
    /// IP bytes announced by the header (header included).
    pub len: usize,
    pub frag_offset: u16,
    pub more_fragments: bool,
    /// Number of fragments merged into this packet, 1 when unfragmented.
    pub fragments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpRecord {
    pub src_port: u16,
    pub dst_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpRecord {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub syn: bool,
    pub fin: bool,
    pub retransmission: bool,
    pub out_of_order: bool,
    /// Segments merged into the payload handed to the application layer.
    pub segments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsRecord {
    pub content_type: u8,
    pub version: u16,
    pub decrypted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsRecord {
    pub fin: bool,
    pub opcode: u8,
    pub masked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpRecord {
    pub marker: bool,
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    /// Static encoding, `None` for dynamic payload types.
    pub encoding: Option<&'static RtpEncoding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcpRecord {
    pub packet_type: u8,
    pub ssrc: u32,
}

/// Typed per-protocol record attached by a dissector.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtoRecord {
    Link(LinkRecord),
    Ip(IpRecord),
    Udp(UdpRecord),
    Tcp(TcpRecord),
    Tls(TlsRecord),
    Ws(WsRecord),
    Sip(Box<SipPayload>),
    Rtp(RtpRecord),
    Rtcp(RtcpRecord),
}
