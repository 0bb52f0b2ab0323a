use crate::packet::{Packet, ProtoRecord, RtpRecord};
use crate::protocols::rtp::parse_rtp;

use super::{DissectContext, Dissector, ProtocolId};

#[derive(Debug, Default)]
pub struct RtpDissector;

impl Dissector for RtpDissector {
    fn id(&self) -> ProtocolId {
        ProtocolId::Rtp
    }

    fn subdissectors(&self) -> &'static [ProtocolId] {
        &[]
    }

    fn dissect(
        &mut self,
        _ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        let Ok(Some(header)) = parse_rtp(&data) else {
            return Some(data);
        };
        packet.set_record(
            ProtocolId::Rtp,
            ProtoRecord::Rtp(RtpRecord {
                marker: header.marker,
                payload_type: header.payload_type,
                sequence: header.sequence,
                timestamp: header.timestamp,
                ssrc: header.ssrc,
                encoding: header.encoding(),
            }),
        );
        packet.set_payload(data);
        None
    }
}
