//! Capture units and the per-packet record accumulator.
//!
//! A [`Frame`] is one raw capture unit; a [`Packet`] owns the frames it was
//! assembled from (several when IP fragments or TCP segments were merged)
//! and collects one typed record per protocol layer that claimed it.

mod frame;
mod record;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dissect::ProtocolId;

pub use frame::{Endpoint, Frame, Timestamp};
pub use record::{
    IpRecord, IpVersion, LinkRecord, ProtoRecord, RtcpRecord, RtpRecord, TcpRecord, TlsRecord,
    UdpRecord, WsRecord,
};

use crate::protocols::sip::SipPayload;

/// Classification derived from the records a packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketType {
    #[serde(rename = "SIP/UDP")]
    SipUdp,
    #[serde(rename = "SIP/TCP")]
    SipTcp,
    #[serde(rename = "SIP/TLS")]
    SipTls,
    #[serde(rename = "SIP/WS")]
    SipWs,
    #[serde(rename = "SIP/WSS")]
    SipWss,
    #[serde(rename = "RTP")]
    Rtp,
    #[serde(rename = "RTCP")]
    Rtcp,
    /// TLS traffic that could not be decrypted.
    #[serde(rename = "TLS")]
    Tls,
}

impl PacketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketType::SipUdp => "SIP/UDP",
            PacketType::SipTcp => "SIP/TCP",
            PacketType::SipTls => "SIP/TLS",
            PacketType::SipWs => "SIP/WS",
            PacketType::SipWss => "SIP/WSS",
            PacketType::Rtp => "RTP",
            PacketType::Rtcp => "RTCP",
            PacketType::Tls => "TLS",
        }
    }

    pub fn is_sip(&self) -> bool {
        matches!(
            self,
            PacketType::SipUdp
                | PacketType::SipTcp
                | PacketType::SipTls
                | PacketType::SipWs
                | PacketType::SipWss
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packet {
    frames: Vec<Frame>,
    records: BTreeMap<ProtocolId, ProtoRecord>,
    payload: Option<Vec<u8>>,
}

impl Packet {
    pub fn new(frame: Frame) -> Self {
        Self {
            frames: vec![frame],
            records: BTreeMap::new(),
            payload: None,
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Prepend frames that contributed bytes ahead of this packet's own
    /// (earlier fragments or held TCP segments).
    pub fn prepend_frames(&mut self, mut earlier: Vec<Frame>) {
        earlier.append(&mut self.frames);
        self.frames = earlier;
    }

    pub fn take_frames(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }

    /// Drop raw frames once the decoded payload is all that is needed.
    pub fn discard_frames(&mut self) {
        self.frames.clear();
        self.frames.shrink_to_fit();
    }

    /// Timestamp of the first frame, when frames are still held.
    pub fn ts(&self) -> Option<Timestamp> {
        self.frames.first().map(Frame::ts)
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = Some(payload);
    }

    pub fn set_record(&mut self, id: ProtocolId, record: ProtoRecord) {
        self.records.insert(id, record);
    }

    pub fn record(&self, id: ProtocolId) -> Option<&ProtoRecord> {
        self.records.get(&id)
    }

    pub fn has_record(&self, id: ProtocolId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn take_record(&mut self, id: ProtocolId) -> Option<ProtoRecord> {
        self.records.remove(&id)
    }

    pub fn protocols(&self) -> impl Iterator<Item = ProtocolId> + '_ {
        self.records.keys().copied()
    }

    pub fn ip(&self) -> Option<&IpRecord> {
        match self.record(ProtocolId::Ip) {
            Some(ProtoRecord::Ip(ip)) => Some(ip),
            _ => None,
        }
    }

    pub fn udp(&self) -> Option<&UdpRecord> {
        match self.record(ProtocolId::Udp) {
            Some(ProtoRecord::Udp(udp)) => Some(udp),
            _ => None,
        }
    }

    pub fn tcp(&self) -> Option<&TcpRecord> {
        match self.record(ProtocolId::Tcp) {
            Some(ProtoRecord::Tcp(tcp)) => Some(tcp),
            _ => None,
        }
    }

    pub fn sip(&self) -> Option<&SipPayload> {
        match self.record(ProtocolId::Sip) {
            Some(ProtoRecord::Sip(sip)) => Some(sip),
            _ => None,
        }
    }

    pub fn rtp(&self) -> Option<&RtpRecord> {
        match self.record(ProtocolId::Rtp) {
            Some(ProtoRecord::Rtp(rtp)) => Some(rtp),
            _ => None,
        }
    }

    pub fn rtcp(&self) -> Option<&RtcpRecord> {
        match self.record(ProtocolId::Rtcp) {
            Some(ProtoRecord::Rtcp(rtcp)) => Some(rtcp),
            _ => None,
        }
    }

    pub fn tls(&self) -> Option<&TlsRecord> {
        match self.record(ProtocolId::Tls) {
            Some(ProtoRecord::Tls(tls)) => Some(tls),
            _ => None,
        }
    }

    fn ports(&self) -> Option<(u16, u16)> {
        if let Some(udp) = self.udp() {
            return Some((udp.src_port, udp.dst_port));
        }
        self.tcp().map(|tcp| (tcp.src_port, tcp.dst_port))
    }

    pub fn src(&self) -> Option<Endpoint> {
        let ip = self.ip()?;
        let (src_port, _) = self.ports()?;
        Some(Endpoint::new(ip.src, src_port))
    }

    pub fn dst(&self) -> Option<Endpoint> {
        let ip = self.ip()?;
        let (_, dst_port) = self.ports()?;
        Some(Endpoint::new(ip.dst, dst_port))
    }

    pub fn ip_version(&self) -> Option<IpVersion> {
        self.ip().map(|ip| ip.version)
    }

    /// Transport name as shown to users ("UDP", "TCP", "TLS", "WS", "WSS").
    pub fn transport_name(&self) -> Option<&'static str> {
        let secure = self.has_record(ProtocolId::Tls);
        let ws = self.has_record(ProtocolId::Ws);
        match (ws, secure) {
            (true, true) => Some("WSS"),
            (true, false) => Some("WS"),
            (false, true) => Some("TLS"),
            (false, false) if self.tcp().is_some() => Some("TCP"),
            (false, false) if self.udp().is_some() => Some("UDP"),
            _ => None,
        }
    }

    pub fn packet_type(&self) -> Option<PacketType> {
        if self.has_record(ProtocolId::Sip) {
            let ws = self.has_record(ProtocolId::Ws);
            let tls = self.has_record(ProtocolId::Tls);
            return Some(match (ws, tls) {
                (true, true) => PacketType::SipWss,
                (true, false) => PacketType::SipWs,
                (false, true) => PacketType::SipTls,
                (false, false) if self.tcp().is_some() => PacketType::SipTcp,
                (false, false) => PacketType::SipUdp,
            });
        }
        if self.has_record(ProtocolId::Rtp) {
            return Some(PacketType::Rtp);
        }
        if self.has_record(ProtocolId::Rtcp) {
            return Some(PacketType::Rtcp);
        }
        if self.has_record(ProtocolId::Tls) {
            return Some(PacketType::Tls);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn frame(sec: i64) -> Frame {
        Frame::new(Timestamp::new(sec, 0), 4, 4, vec![0, 1, 2, 3])
    }

    fn ip_record() -> IpRecord {
        IpRecord {
            version: IpVersion::V4,
            src: "10.0.0.1".parse::<IpAddr>().unwrap(),
            dst: "10.0.0.2".parse::<IpAddr>().unwrap(),
            protocol: 17,
            header_len: 20,
            id: 1,
            caplen: 28,
            len: 28,
            frag_offset: 0,
            more_fragments: false,
            fragments: 1,
        }
    }

    #[test]
    fn endpoints_come_from_ip_and_transport_records() {
        let mut packet = Packet::new(frame(1));
        assert!(packet.src().is_none());
        packet.set_record(ProtocolId::Ip, ProtoRecord::Ip(ip_record()));
        packet.set_record(
            ProtocolId::Udp,
            ProtoRecord::Udp(UdpRecord {
                src_port: 5060,
                dst_port: 5080,
            }),
        );
        assert_eq!(packet.src().unwrap().to_string(), "10.0.0.1:5060");
        assert_eq!(packet.dst().unwrap().to_string(), "10.0.0.2:5080");
        assert_eq!(packet.transport_name(), Some("UDP"));
        assert_eq!(packet.packet_type(), None);
    }

    #[test]
    fn prepended_frames_keep_arrival_order() {
        let mut packet = Packet::new(frame(3));
        packet.prepend_frames(vec![frame(1), frame(2)]);
        let secs: Vec<i64> = packet.frames().iter().map(|f| f.ts().sec).collect();
        assert_eq!(secs, vec![1, 2, 3]);
        assert_eq!(packet.ts().unwrap().sec, 1);
    }

    #[test]
    fn discarding_frames_keeps_payload() {
        let mut packet = Packet::new(frame(1));
        packet.set_payload(b"INVITE".to_vec());
        packet.discard_frames();
        assert!(packet.frames().is_empty());
        assert_eq!(packet.payload(), Some(&b"INVITE"[..]));
    }

    #[test]
    fn rtp_record_classifies_packet() {
        let mut packet = Packet::new(frame(1));
        packet.set_record(
            ProtocolId::Rtp,
            ProtoRecord::Rtp(RtpRecord {
                marker: false,
                payload_type: 0,
                sequence: 1,
                timestamp: 160,
                ssrc: 7,
                encoding: None,
            }),
        );
        assert_eq!(packet.packet_type(), Some(PacketType::Rtp));
        assert!(!PacketType::Rtp.is_sip());
    }
}
