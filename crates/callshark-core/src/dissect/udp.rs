use etherparse::UdpHeaderSlice;
use tracing::trace;

use crate::packet::{Packet, ProtoRecord, UdpRecord};

use super::{DissectContext, Dissector, ProtocolId};

const IPPROTO_UDP: u8 = 17;
const UDP_HEADER_LEN: usize = 8;

#[derive(Debug, Default)]
pub struct UdpDissector;

impl Dissector for UdpDissector {
    fn id(&self) -> ProtocolId {
        ProtocolId::Udp
    }

    fn subdissectors(&self) -> &'static [ProtocolId] {
        &[
            ProtocolId::Sip,
            ProtocolId::Ws,
            ProtocolId::Tls,
            ProtocolId::Rtp,
            ProtocolId::Rtcp,
        ]
    }

    fn dissect(
        &mut self,
        _ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        if packet.ip().map(|ip| ip.protocol) != Some(IPPROTO_UDP) {
            return Some(data);
        }
        let (src_port, dst_port, length) = match UdpHeaderSlice::from_slice(&data) {
            Ok(header) => (
                header.source_port(),
                header.destination_port(),
                header.length() as usize,
            ),
            Err(err) => {
                trace!(error = %err, "truncated udp header");
                return Some(data);
            }
        };
        packet.set_record(
            ProtocolId::Udp,
            ProtoRecord::Udp(UdpRecord { src_port, dst_port }),
        );

        let end = if length >= UDP_HEADER_LEN {
            length.min(data.len())
        } else {
            data.len()
        };
        if end <= UDP_HEADER_LEN {
            return None;
        }
        Some(data[UDP_HEADER_LEN..end].to_vec())
    }
}
