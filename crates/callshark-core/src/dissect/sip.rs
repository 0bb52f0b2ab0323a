use tracing::{debug, trace};

use crate::packet::{Packet, ProtoRecord};
use crate::protocols::sip::parse_sip;

use super::{DissectContext, Dissector, ProtocolId};

#[derive(Debug, Default)]
pub struct SipDissector;

impl Dissector for SipDissector {
    fn id(&self) -> ProtocolId {
        ProtocolId::Sip
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
        match parse_sip(&data) {
            Ok(Some(payload)) => {
                trace!(
                    call_id = %payload.call_id,
                    summary = %payload.summary(),
                    "sip message"
                );
                packet.set_record(ProtocolId::Sip, ProtoRecord::Sip(Box::new(payload)));
                None
            }
            Ok(None) => Some(data),
            Err(err) => {
                debug!(error = %err, "discarding malformed sip payload");
                Some(data)
            }
        }
    }
}
