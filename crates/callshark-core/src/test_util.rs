//! Builders for packets already carrying dissected records.

use crate::dissect::ProtocolId;
use crate::packet::{
    Endpoint, Frame, IpRecord, IpVersion, Packet, ProtoRecord, RtcpRecord, RtpRecord, Timestamp,
    UdpRecord,
};
use crate::protocols::rtp::encoding_by_id;
use crate::protocols::sip::parse_sip;

pub fn endpoint(value: &str) -> Endpoint {
    let addr: std::net::SocketAddr = value.parse().unwrap();
    Endpoint::new(addr.ip(), addr.port())
}

fn udp_packet(sec: i64, src: &str, dst: &str) -> Packet {
    let (src, dst) = (endpoint(src), endpoint(dst));
    let mut packet = Packet::new(Frame::new(Timestamp::new(sec, 0), 0, 0, Vec::new()));
    packet.set_record(
        ProtocolId::Ip,
        ProtoRecord::Ip(IpRecord {
            version: IpVersion::V4,
            src: src.addr,
            dst: dst.addr,
            protocol: 17,
            header_len: 20,
            id: 0,
            caplen: 0,
            len: 0,
            frag_offset: 0,
            more_fragments: false,
            fragments: 1,
        }),
    );
    packet.set_record(
        ProtocolId::Udp,
        ProtoRecord::Udp(UdpRecord {
            src_port: src.port,
            dst_port: dst.port,
        }),
    );
    packet
}

pub fn sip_packet(sec: i64, src: &str, dst: &str, message: &str) -> Packet {
    let mut packet = udp_packet(sec, src, dst);
    let payload = parse_sip(message.as_bytes()).unwrap().unwrap();
    packet.set_record(ProtocolId::Sip, ProtoRecord::Sip(Box::new(payload)));
    packet
}

pub fn rtp_packet(sec: i64, src: &str, dst: &str, payload_type: u8) -> Packet {
    let mut packet = udp_packet(sec, src, dst);
    packet.set_record(
        ProtocolId::Rtp,
        ProtoRecord::Rtp(RtpRecord {
            marker: false,
            payload_type,
            sequence: 1,
            timestamp: 160,
            ssrc: 0x1234,
            encoding: encoding_by_id(payload_type),
        }),
    );
    packet
}

pub fn rtcp_packet(sec: i64, src: &str, dst: &str) -> Packet {
    let mut packet = udp_packet(sec, src, dst);
    packet.set_record(
        ProtocolId::Rtcp,
        ProtoRecord::Rtcp(RtcpRecord {
            packet_type: 200,
            ssrc: 0x1234,
        }),
    );
    packet
}

/// INVITE offering audio at `media` (`ip:port`); payload type 101 is
/// always offered as telephone-event.
pub fn invite(call_id: &str, media: &str, formats: &[u8]) -> String {
    let media = endpoint(media);
    let mut ids: Vec<String> = formats.iter().map(u8::to_string).collect();
    ids.push("101".to_string());
    let sdp = format!(
        "v=0\r\no=- 1 1 IN IP4 {addr}\r\ns=-\r\nc=IN IP4 {addr}\r\nt=0 0\r\n\
m=audio {port} RTP/AVP {ids}\r\na=rtpmap:101 telephone-event/8000\r\n",
        addr = media.addr,
        port = media.port,
        ids = ids.join(" "),
    );
    format!(
        "INVITE sip:bob@example.com SIP/2.0\r\n\
From: <sip:alice@example.com>;tag=a\r\n\
To: <sip:bob@example.com>\r\n\
Call-ID: {call_id}\r\n\
CSeq: 1 INVITE\r\n\
Content-Type: application/sdp\r\n\
Content-Length: {}\r\n\r\n{sdp}",
        sdp.len()
    )
}

pub fn request(call_id: &str, method: &str, cseq: u32) -> String {
    format!(
        "{method} sip:bob@example.com SIP/2.0\r\n\
From: <sip:alice@example.com>;tag=a\r\n\
To: <sip:bob@example.com>;tag=b\r\n\
Call-ID: {call_id}\r\n\
CSeq: {cseq} {method}\r\n\
Content-Length: 0\r\n\r\n"
    )
}

pub fn response(call_id: &str, code: u16) -> String {
    format!(
        "SIP/2.0 {code} Status\r\n\
From: <sip:alice@example.com>;tag=a\r\n\
To: <sip:bob@example.com>;tag=b\r\n\
Call-ID: {call_id}\r\n\
CSeq: 1 INVITE\r\n\
Content-Length: 0\r\n\r\n"
    )
}
