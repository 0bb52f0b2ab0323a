use std::time::Duration;

use tracing::debug;

use crate::packet::{Endpoint, Packet, PacketType};
use crate::protocols::rtp::encoding_by_id;
use crate::protocols::sdp::SdpMedia;
use crate::protocols::sip::{SipMethod, SipPayload};
use crate::stream::{MediaRef, RtpStream, StreamCodec, StreamKind};

use super::attribute::{AttributeId, format_duration};
use super::message::SipMessage;
use super::state::{CallState, next_state};

/// A SIP dialog: every message sharing one Call-ID, plus the media
/// streams its SDP negotiated.
#[derive(Debug, Clone)]
pub struct Call {
    index: usize,
    call_id: String,
    x_call_id: Option<String>,
    messages: Vec<SipMessage>,
    streams: Vec<RtpStream>,
    state: Option<CallState>,
    conversation_start: Option<usize>,
    conversation_end: Option<usize>,
}

impl Call {
    pub(crate) fn new(index: usize, call_id: String, x_call_id: Option<String>) -> Self {
        Self {
            index,
            call_id,
            x_call_id,
            messages: Vec::new(),
            streams: Vec::new(),
            state: None,
            conversation_start: None,
            conversation_end: None,
        }
    }

    /// Position of the call in the registry.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn x_call_id(&self) -> Option<&str> {
        self.x_call_id.as_deref()
    }

    pub fn messages(&self) -> &[SipMessage] {
        &self.messages
    }

    pub fn message(&self, index: usize) -> Option<&SipMessage> {
        self.messages.get(index)
    }

    pub fn streams(&self) -> &[RtpStream] {
        &self.streams
    }

    pub fn stream(&self, index: usize) -> Option<&RtpStream> {
        self.streams.get(index)
    }

    pub fn state(&self) -> Option<CallState> {
        self.state
    }

    /// Calls in setup or conversation accept media.
    pub fn is_active(&self) -> bool {
        self.state.is_some_and(|state| state.is_active())
    }

    pub fn msg_count(&self) -> usize {
        self.messages.len()
    }

    pub fn retransmissions(&self) -> usize {
        self.messages
            .iter()
            .filter(|message| message.is_retransmission())
            .count()
    }

    pub fn first_message(&self) -> Option<&SipMessage> {
        self.messages.first()
    }

    pub fn last_message(&self) -> Option<&SipMessage> {
        self.messages.last()
    }

    /// Whether the dialog was opened by an INVITE.
    pub fn is_invite_dialog(&self) -> bool {
        self.first_message()
            .and_then(SipMessage::method)
            .is_some_and(|method| *method == SipMethod::Invite)
    }

    /// Time between the first and the last message.
    pub fn total_duration(&self) -> Option<Duration> {
        let first = self.first_message()?;
        let last = self.last_message()?;
        Some(last.ts().duration_since(first.ts()))
    }

    /// Time between the answer and the BYE, once the call completed.
    pub fn conversation_duration(&self) -> Option<Duration> {
        let start = self.messages.get(self.conversation_start?)?;
        let end = self.messages.get(self.conversation_end?)?;
        Some(end.ts().duration_since(start.ts()))
    }

    /// Message that opened the conversation interval.
    pub fn conversation_start(&self) -> Option<&SipMessage> {
        self.messages.get(self.conversation_start?)
    }

    pub fn conversation_end(&self) -> Option<&SipMessage> {
        self.messages.get(self.conversation_end?)
    }

    /// Message attribute of the first message, or a call attribute.
    pub fn attribute(&self, id: AttributeId) -> Option<String> {
        match id {
            AttributeId::MsgCount => Some(self.msg_count().to_string()),
            AttributeId::State => self.state.map(|state| state.to_string()),
            AttributeId::ConvDur => self.conversation_duration().map(format_duration),
            AttributeId::TotalDur => self.total_duration().map(format_duration),
            _ => self
                .first_message()
                .and_then(|message| message.attribute(id))
                .map(str::to_string),
        }
    }

    pub fn media(&self, media: MediaRef) -> Option<&SdpMedia> {
        self.messages
            .get(media.message)?
            .medias()
            .get(media.media)
    }

    /// Codec of a stream: static payload types first, then the SDP that
    /// negotiated the stream, then any SDP of the call.
    pub fn codec(&self, stream: &RtpStream) -> Option<StreamCodec> {
        let id = stream.format()?;
        if let Some(encoding) = encoding_by_id(id) {
            return Some(StreamCodec {
                id,
                name: Some(encoding.name.to_string()),
                alias: Some(encoding.format.to_string()),
            });
        }
        let negotiated = self
            .media(stream.media())
            .and_then(|media| media.format(id))
            .filter(|format| format.name.is_some());
        let format = negotiated.or_else(|| {
            self.messages
                .iter()
                .flat_map(|message| message.medias())
                .filter_map(|media| media.format(id))
                .find(|format| format.name.is_some())
        });
        Some(StreamCodec {
            id,
            name: format.and_then(|format| format.name.clone()),
            alias: format.and_then(|format| format.alias.clone()),
        })
    }

    pub fn has_stream(&self, kind: StreamKind, dst: Endpoint) -> bool {
        self.streams
            .iter()
            .any(|stream| stream.kind() == kind && stream.dst() == dst)
    }

    pub(crate) fn streams_mut(&mut self) -> &mut Vec<RtpStream> {
        &mut self.streams
    }

    pub(crate) fn add_stream(&mut self, stream: RtpStream) -> usize {
        debug!(
            call_id = %self.call_id,
            kind = stream.kind().as_str(),
            dst = %stream.dst(),
            complete = stream.is_complete(),
            "stream created"
        );
        self.streams.push(stream);
        self.streams.len() - 1
    }

    /// Append a message, run the state machine and register SDP streams.
    pub(crate) fn add_message(
        &mut self,
        payload: SipPayload,
        packet: Packet,
        packet_type: Option<PacketType>,
    ) -> usize {
        let index = self.messages.len();
        let retransmission = self
            .messages
            .last()
            .is_some_and(|previous| previous.raw() == payload.raw.as_slice());
        self.messages.push(SipMessage::new(
            self.index,
            index,
            payload,
            packet,
            packet_type,
            retransmission,
        ));

        if self.is_invite_dialog() {
            self.update_state(index);
        }
        self.register_media(index);
        index
    }

    fn update_state(&mut self, index: usize) {
        let message = &self.messages[index];
        let Some(state) = next_state(self.state, message.method(), message.status()) else {
            return;
        };
        debug!(
            call_id = %self.call_id,
            from = ?self.state,
            to = %state,
            "call state changed"
        );
        match state {
            CallState::CallSetup | CallState::InCall => self.conversation_start = Some(index),
            CallState::Completed => self.conversation_end = Some(index),
            _ => {}
        }
        self.state = Some(state);
    }

    fn register_media(&mut self, index: usize) {
        let mut pending = Vec::new();
        for (media_index, media) in self.messages[index].medias().iter().enumerate() {
            let Some(address) = media.address else {
                continue;
            };
            if media.port == 0 {
                continue;
            }
            let media_ref = MediaRef {
                message: index,
                media: media_index,
            };
            pending.push(RtpStream::incomplete(
                StreamKind::Rtp,
                Endpoint::new(address, media.port),
                media_ref,
            ));
            pending.push(RtpStream::incomplete(
                StreamKind::Rtcp,
                Endpoint::new(media.rtcp_address.unwrap_or(address), media.rtcp_port),
                media_ref,
            ));
        }
        for stream in pending {
            if !self.has_stream(stream.kind(), stream.dst()) {
                self.add_stream(stream);
            }
        }
    }
}
