use etherparse::TcpHeaderSlice;
use tracing::{debug, trace};

use crate::packet::{Endpoint, Frame, Packet, ProtoRecord, TcpRecord};
use crate::protocols::sip::layout::MAX_MESSAGE_LEN;
use crate::protocols::sip::{looks_like_sip, message_length};

use super::{ConnKey, ConnectionArena, DissectContext, Dissector, ProtocolId};

const IPPROTO_TCP: u8 = 6;
const DEFAULT_MAX_CONNECTIONS: usize = 4096;
const MAX_HELD_BYTES: usize = MAX_MESSAGE_LEN;

#[derive(Debug, Default)]
struct TcpFlow {
    next_seq: Option<u32>,
    held: Vec<u8>,
    held_frames: Vec<Frame>,
    held_segments: usize,
}

impl TcpFlow {
    fn clear_held(&mut self) {
        self.held.clear();
        self.held_frames.clear();
        self.held_segments = 0;
    }
}

/// Queue every further complete message in `rest` as a packet of its own,
/// carrying only the current frame, and hold a partial tail.
fn split_following(
    flow: &mut TcpFlow,
    key: &ConnKey,
    ctx: &mut DissectContext,
    packet: &Packet,
    record: TcpRecord,
    mut rest: Vec<u8>,
) {
    let own_frames: Vec<Frame> = packet.frames().last().cloned().into_iter().collect();
    while !rest.is_empty() {
        match message_length(&rest) {
            Ok(Some(len)) => {
                let tail = rest.split_off(len);
                let message = std::mem::replace(&mut rest, tail);
                if !looks_like_sip(&message) {
                    trace!(conn = %key, bytes = message.len(), "skipping non-sip block");
                    continue;
                }
                let mut next = packet.clone();
                next.take_frames();
                next.prepend_frames(own_frames.clone());
                next.set_record(
                    ProtocolId::Tcp,
                    ProtoRecord::Tcp(TcpRecord {
                        segments: 1,
                        ..record
                    }),
                );
                ctx.queue(ProtocolId::Tcp, next, message);
            }
            Ok(None) if rest.len() <= MAX_HELD_BYTES => {
                trace!(conn = %key, bytes = rest.len(), "holding partial sip message");
                flow.held = rest;
                flow.held_frames = own_frames;
                flow.held_segments = 1;
                return;
            }
            Ok(None) => {
                debug!(conn = %key, bytes = rest.len(), "partial sip message too large");
                return;
            }
            Err(err) => {
                debug!(conn = %key, error = %err, "unparseable sip framing");
                return;
            }
        }
    }
}

fn seq_lt(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

fn seq_le(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) <= 0
}

/// TCP decoding with per-direction sequence tracking.
///
/// Segments entirely below the expected sequence number are marked as
/// retransmissions and not forwarded. A SIP message split across segments
/// is held until its Content-Length is satisfied, then forwarded with all
/// contributing frames attached to the packet.
pub struct TcpDissector {
    flows: ConnectionArena<TcpFlow>,
}

impl Default for TcpDissector {
    fn default() -> Self {
        Self::with_max_connections(DEFAULT_MAX_CONNECTIONS)
    }
}

impl TcpDissector {
    pub fn with_max_connections(max_connections: usize) -> Self {
        Self {
            flows: ConnectionArena::with_capacity(max_connections),
        }
    }

    pub fn tracked_connections(&self) -> usize {
        self.flows.len()
    }
}

impl Dissector for TcpDissector {
    fn id(&self) -> ProtocolId {
        ProtocolId::Tcp
    }

    fn subdissectors(&self) -> &'static [ProtocolId] {
        &[ProtocolId::Sip, ProtocolId::Tls, ProtocolId::Ws]
    }

    fn dissect(
        &mut self,
        ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        let Some((src, dst)) = packet
            .ip()
            .filter(|ip| ip.protocol == IPPROTO_TCP)
            .map(|ip| (ip.src, ip.dst))
        else {
            return Some(data);
        };
        let header = match TcpHeaderSlice::from_slice(&data) {
            Ok(header) => header,
            Err(err) => {
                trace!(error = %err, "invalid tcp header");
                return Some(data);
            }
        };
        let header_len = usize::from(header.data_offset()) * 4;
        let mut record = TcpRecord {
            src_port: header.source_port(),
            dst_port: header.destination_port(),
            seq: header.sequence_number(),
            syn: header.syn(),
            fin: header.fin(),
            retransmission: false,
            out_of_order: false,
            segments: 1,
        };
        let key = ConnKey::new(
            Endpoint::new(src, record.src_port),
            Endpoint::new(dst, record.dst_port),
        );
        let flow = self.flows.entry(key);

        if record.syn {
            flow.clear_held();
            flow.next_seq = Some(record.seq.wrapping_add(1));
        }
        let mut payload = &data[header_len.min(data.len())..];
        if payload.is_empty() {
            if record.fin {
                flow.clear_held();
            }
            packet.set_record(ProtocolId::Tcp, ProtoRecord::Tcp(record));
            return None;
        }

        let end = record.seq.wrapping_add(payload.len() as u32);
        if let Some(next) = flow.next_seq {
            if seq_le(end, next) {
                trace!(conn = %key, seq = record.seq, "tcp retransmission");
                record.retransmission = true;
                packet.set_record(ProtocolId::Tcp, ProtoRecord::Tcp(record));
                return None;
            }
            if seq_lt(record.seq, next) {
                payload = &payload[next.wrapping_sub(record.seq) as usize..];
            } else if seq_lt(next, record.seq) {
                trace!(conn = %key, seq = record.seq, expected = next, "tcp segment out of order");
                record.out_of_order = true;
                if !flow.held.is_empty() {
                    debug!(conn = %key, bytes = flow.held.len(), "dropping held bytes after gap");
                    flow.clear_held();
                }
            }
        }
        flow.next_seq = Some(if record.fin {
            end.wrapping_add(1)
        } else {
            end
        });

        let mut buffer = if flow.held.is_empty() {
            payload.to_vec()
        } else {
            let mut buffer = std::mem::take(&mut flow.held);
            buffer.extend_from_slice(payload);
            packet.prepend_frames(std::mem::take(&mut flow.held_frames));
            record.segments += flow.held_segments;
            buffer
        };
        flow.held_segments = 0;

        if looks_like_sip(&buffer) {
            match message_length(&buffer) {
                Ok(None) if buffer.len() <= MAX_HELD_BYTES => {
                    trace!(conn = %key, bytes = buffer.len(), "holding partial sip message");
                    flow.held = buffer;
                    flow.held_frames = packet.take_frames();
                    flow.held_segments = record.segments;
                    ctx.held = true;
                    return None;
                }
                Ok(None) => {
                    debug!(conn = %key, bytes = buffer.len(), "partial sip message too large");
                }
                Ok(Some(len)) if len < buffer.len() => {
                    let rest = buffer.split_off(len);
                    split_following(flow, &key, ctx, packet, record, rest);
                }
                Ok(Some(_)) => {}
                Err(err) => {
                    debug!(conn = %key, error = %err, "unparseable sip framing");
                }
            }
        }

        packet.set_record(ProtocolId::Tcp, ProtoRecord::Tcp(record));
        Some(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{IpRecord, IpVersion, Timestamp};
    use etherparse::TcpHeader;

    fn segment(seq: u32, payload: &[u8]) -> Vec<u8> {
        let header = TcpHeader::new(40000, 5060, seq, 1024);
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        out.extend_from_slice(payload);
        out
    }

    fn packet(sec: i64) -> Packet {
        let mut packet = Packet::new(Frame::new(Timestamp::new(sec, 0), 0, 0, Vec::new()));
        packet.set_record(
            ProtocolId::Ip,
            ProtoRecord::Ip(IpRecord {
                version: IpVersion::V4,
                src: "10.0.0.1".parse().unwrap(),
                dst: "10.0.0.2".parse().unwrap(),
                protocol: IPPROTO_TCP,
                header_len: 20,
                id: 0,
                caplen: 0,
                len: 0,
                frag_offset: 0,
                more_fragments: false,
                fragments: 1,
            }),
        );
        packet
    }

    fn message() -> Vec<u8> {
        b"OPTIONS sip:bob@example.com SIP/2.0\r\n\
Call-ID: tcp-1\r\n\
CSeq: 1 OPTIONS\r\n\
Content-Length: 4\r\n\
\r\n\
ping"
            .to_vec()
    }

    #[test]
    fn split_sip_message_is_reassembled() {
        let mut dissector = TcpDissector::default();
        let msg = message();
        let (head, tail) = msg.split_at(30);

        let mut ctx = DissectContext::new(1);
        let mut first = packet(1);
        assert!(dissector.dissect(&mut ctx, &mut first, segment(100, head)).is_none());
        assert!(ctx.held);
        assert!(first.frames().is_empty());

        let mut ctx = DissectContext::new(1);
        let mut second = packet(2);
        let out = dissector
            .dissect(&mut ctx, &mut second, segment(100 + head.len() as u32, tail))
            .unwrap();
        assert!(!ctx.held);
        assert_eq!(out, msg);
        assert_eq!(second.frames().len(), 2);
        assert_eq!(second.frames()[0].ts().sec, 1);
        assert_eq!(second.tcp().unwrap().segments, 2);
    }

    fn options(call_id: &str) -> Vec<u8> {
        format!(
            "OPTIONS sip:bob@example.com SIP/2.0\r\nCall-ID: {call_id}\r\nCSeq: 1 OPTIONS\r\nContent-Length: 0\r\n\r\n"
        )
        .into_bytes()
    }

    #[test]
    fn every_complete_message_in_a_segment_is_emitted() {
        let mut dissector = TcpDissector::default();
        let first = options("first");
        let second = options("second");
        let third = message();
        let (partial, remainder) = third.split_at(20);
        let mut data = first.clone();
        data.extend_from_slice(&second);
        data.extend_from_slice(partial);

        let mut ctx = DissectContext::new(1);
        let mut current = packet(1);
        let out = dissector.dissect(&mut ctx, &mut current, segment(10, &data));
        assert_eq!(out, Some(first));
        assert!(!ctx.held);
        assert_eq!(ctx.queued.len(), 1);
        let queued = &ctx.queued[0];
        assert_eq!(queued.layer, ProtocolId::Tcp);
        assert_eq!(queued.data, second);
        assert_eq!(queued.packet.frames().len(), 1);
        assert_eq!(queued.packet.ts().unwrap().sec, 1);

        let mut ctx = DissectContext::new(1);
        let mut next = packet(2);
        let out = dissector.dissect(&mut ctx, &mut next, segment(10 + data.len() as u32, remainder));
        assert_eq!(out, Some(third));
        assert_eq!(next.frames().len(), 2);
        assert_eq!(next.ts().unwrap().sec, 1);
    }

    #[test]
    fn oversized_content_length_is_not_held() {
        let mut dissector = TcpDissector::default();
        let data = b"INVITE sip:bob@example.com SIP/2.0\r\nCall-ID: big\r\n\
Content-Length: 18446744073709551615\r\n\r\n";
        let mut ctx = DissectContext::new(1);
        let mut current = packet(1);
        let out = dissector.dissect(&mut ctx, &mut current, segment(1, data));
        assert_eq!(out.as_deref(), Some(&data[..]));
        assert!(!ctx.held);
    }

    #[test]
    fn retransmission_is_flagged_and_not_forwarded() {
        let mut dissector = TcpDissector::default();
        let msg = message();
        let mut ctx = DissectContext::new(1);
        let mut first = packet(1);
        assert_eq!(
            dissector.dissect(&mut ctx, &mut first, segment(500, &msg)),
            Some(msg.clone())
        );

        let mut again = packet(2);
        assert!(dissector.dissect(&mut ctx, &mut again, segment(500, &msg)).is_none());
        assert!(again.tcp().unwrap().retransmission);
    }

    #[test]
    fn gap_marks_segment_out_of_order() {
        let mut dissector = TcpDissector::default();
        let mut ctx = DissectContext::new(1);
        let mut first = packet(1);
        dissector.dissect(&mut ctx, &mut first, segment(1, b"abcd"));
        let mut second = packet(2);
        let out = dissector.dissect(&mut ctx, &mut second, segment(100, b"efgh"));
        assert_eq!(out.as_deref(), Some(&b"efgh"[..]));
        assert!(second.tcp().unwrap().out_of_order);
    }

    #[test]
    fn non_tcp_ip_protocol_is_declined() {
        let mut dissector = TcpDissector::default();
        let mut ctx = DissectContext::new(1);
        let mut udp = Packet::new(Frame::new(Timestamp::new(1, 0), 0, 0, Vec::new()));
        let data = vec![1, 2, 3];
        assert_eq!(dissector.dissect(&mut ctx, &mut udp, data.clone()), Some(data));
        assert_eq!(dissector.tracked_connections(), 0);
    }
}
