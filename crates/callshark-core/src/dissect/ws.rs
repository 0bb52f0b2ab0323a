use tracing::trace;

use crate::packet::{Packet, ProtoRecord, WsRecord};
use crate::protocols::websocket::parse_ws_frame;

use super::{DissectContext, Dissector, ProtocolId};

/// WebSocket framing; text frames carry SIP (RFC 7118).
///
/// On TCP every well-formed frame is claimed. A datagram is only claimed
/// when it is a single final text frame, since RTP headers with high
/// payload types can look like exact-length continuation frames.
#[derive(Debug, Default)]
pub struct WsDissector;

impl Dissector for WsDissector {
    fn id(&self) -> ProtocolId {
        ProtocolId::Ws
    }

    fn subdissectors(&self) -> &'static [ProtocolId] {
        &[ProtocolId::Sip]
    }

    fn dissect(
        &mut self,
        _ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        let frame = match parse_ws_frame(&data) {
            Ok(Some(frame)) => frame,
            Ok(None) => return Some(data),
            Err(err) => {
                trace!(error = %err, "not a websocket frame");
                return Some(data);
            }
        };
        if packet.tcp().is_none() && !(frame.fin && frame.is_text()) {
            // Over UDP only a complete text frame is taken as WebSocket;
            // anything else is left to the media layers.
            trace!(opcode = frame.opcode, "websocket-shaped datagram declined");
            return Some(data);
        }
        packet.set_record(
            ProtocolId::Ws,
            ProtoRecord::Ws(WsRecord {
                fin: frame.fin,
                opcode: frame.opcode,
                masked: frame.masked,
            }),
        );
        if !frame.is_text() {
            trace!(opcode = frame.opcode, "non-text websocket frame");
            return None;
        }
        Some(frame.payload)
    }
}
