use crate::packet::{Packet, ProtoRecord, RtcpRecord};
use crate::protocols::rtcp::parse_rtcp;

use super::{DissectContext, Dissector, ProtocolId};

#[derive(Debug, Default)]
pub struct RtcpDissector;

impl Dissector for RtcpDissector {
    fn id(&self) -> ProtocolId {
        ProtocolId::Rtcp
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
        let Ok(Some(header)) = parse_rtcp(&data) else {
            return Some(data);
        };
        packet.set_record(
            ProtocolId::Rtcp,
            ProtoRecord::Rtcp(RtcpRecord {
                packet_type: header.packet_type,
                ssrc: header.ssrc,
            }),
        );
        None
    }
}
