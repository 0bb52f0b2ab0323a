use crate::packet::{Endpoint, Packet, PacketType, Timestamp};
use crate::protocols::sdp::SdpMedia;
use crate::protocols::sip::layout::{HDR_CSEQ, HDR_REASON, HDR_USER_AGENT, HDR_WARNING};
use crate::protocols::sip::{SipMethod, SipPayload};

use super::attribute::{AttributeId, AttributeSet, format_date, format_time};

/// A SIP message attached to its dialog.
///
/// Owns the decoded payload and the packet it arrived in. The owning call
/// is referenced by index into the registry.
#[derive(Debug, Clone)]
pub struct SipMessage {
    call: usize,
    index: usize,
    payload: SipPayload,
    packet: Packet,
    packet_type: Option<PacketType>,
    ts: Timestamp,
    retransmission: bool,
    attributes: AttributeSet,
}

impl SipMessage {
    pub(crate) fn new(
        call: usize,
        index: usize,
        payload: SipPayload,
        packet: Packet,
        packet_type: Option<PacketType>,
        retransmission: bool,
    ) -> Self {
        let ts = packet.ts().unwrap_or_default();
        let attributes = collect_attributes(&payload, &packet, ts);
        Self {
            call,
            index,
            payload,
            packet,
            packet_type,
            ts,
            retransmission,
            attributes,
        }
    }

    /// Index of the owning call in the registry.
    pub fn call(&self) -> usize {
        self.call
    }

    /// Position inside the call, in arrival order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn payload(&self) -> &SipPayload {
        &self.payload
    }

    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    pub fn is_retransmission(&self) -> bool {
        self.retransmission
    }

    pub fn is_request(&self) -> bool {
        self.payload.is_request()
    }

    pub fn method(&self) -> Option<&SipMethod> {
        self.payload.method()
    }

    pub fn status(&self) -> Option<u16> {
        self.payload.status()
    }

    pub fn src(&self) -> Option<Endpoint> {
        self.packet.src()
    }

    pub fn dst(&self) -> Option<Endpoint> {
        self.packet.dst()
    }

    /// Classification of the packet when the message was dissected.
    pub fn packet_type(&self) -> Option<PacketType> {
        self.packet_type
    }

    pub fn medias(&self) -> &[SdpMedia] {
        &self.payload.medias
    }

    pub fn raw(&self) -> &[u8] {
        &self.payload.raw
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&str> {
        self.attributes.get(id)
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }
}

fn collect_attributes(payload: &SipPayload, packet: &Packet, ts: Timestamp) -> AttributeSet {
    let mut attributes = AttributeSet::default();
    attributes.set(AttributeId::Method, payload.summary());
    attributes.set(AttributeId::CallId, payload.call_id.as_str());

    let headers = [
        (AttributeId::From, payload.from()),
        (AttributeId::FromUser, payload.from_user()),
        (AttributeId::To, payload.to()),
        (AttributeId::ToUser, payload.to_user()),
        (AttributeId::XCallId, payload.x_call_id()),
        (AttributeId::CSeq, payload.header(HDR_CSEQ)),
        (AttributeId::UserAgent, payload.header(HDR_USER_AGENT)),
        (AttributeId::Reason, payload.header(HDR_REASON)),
        (AttributeId::Warning, payload.header(HDR_WARNING)),
    ];
    for (id, value) in headers {
        if let Some(value) = value {
            attributes.set(id, value);
        }
    }

    if let Some(src) = packet.src() {
        attributes.set(AttributeId::Src, src.to_string());
    }
    if let Some(dst) = packet.dst() {
        attributes.set(AttributeId::Dst, dst.to_string());
    }
    if let Some(transport) = packet.transport_name() {
        attributes.set(AttributeId::Transport, transport);
    }
    if let Some(date) = format_date(ts) {
        attributes.set(AttributeId::Date, date);
    }
    if let Some(time) = format_time(ts) {
        attributes.set(AttributeId::Time, time);
    }
    attributes
}
