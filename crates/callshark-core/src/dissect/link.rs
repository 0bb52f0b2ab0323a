use tracing::trace;

use crate::packet::{LinkRecord, Packet, ProtoRecord};
use crate::protocols::link::parse_link;

use super::{DissectContext, Dissector, ProtocolId};

/// Strips the datalink header; unknown datalinks drop the packet.
#[derive(Debug, Default)]
pub struct LinkDissector;

impl Dissector for LinkDissector {
    fn id(&self) -> ProtocolId {
        ProtocolId::Link
    }

    fn subdissectors(&self) -> &'static [ProtocolId] {
        &[ProtocolId::Ip]
    }

    fn dissect(
        &mut self,
        ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        let frame = match parse_link(ctx.datalink, &data) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                trace!(datalink = ctx.datalink, "no network layer in frame");
                return None;
            }
            Err(err) => {
                trace!(datalink = ctx.datalink, error = %err, "malformed link header");
                return None;
            }
        };
        packet.set_record(
            ProtocolId::Link,
            ProtoRecord::Link(LinkRecord {
                datalink: ctx.datalink,
                header_len: frame.header_len,
                vlan: frame.vlan,
            }),
        );
        Some(data[frame.payload].to_vec())
    }
}
