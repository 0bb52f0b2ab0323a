use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::packet::{Frame, Packet};

use super::{
    DissectContext, Dissector, IpDissector, LinkDissector, ProtocolId, QueuedPacket,
    RtcpDissector, RtpDissector, SipDissector, TcpDissector, TlsDissector, UdpDissector, WsDissector,
};

/// Runtime on/off switch per protocol.
///
/// Shared between the capture worker and whoever owns the settings; flags
/// are read once per layer per packet, so changes apply to the next packet.
#[derive(Debug)]
pub struct DissectorToggles {
    enabled: [AtomicBool; ProtocolId::COUNT],
}

impl Default for DissectorToggles {
    fn default() -> Self {
        Self {
            enabled: std::array::from_fn(|_| AtomicBool::new(true)),
        }
    }
}

impl DissectorToggles {
    pub fn is_enabled(&self, id: ProtocolId) -> bool {
        self.enabled[id.index()].load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, id: ProtocolId, enabled: bool) {
        self.enabled[id.index()].store(enabled, Ordering::Relaxed);
    }
}

/// Table of dissectors driven from the link layer down.
pub struct Pipeline {
    dissectors: Vec<Option<Box<dyn Dissector>>>,
    toggles: Arc<DissectorToggles>,
}

impl Pipeline {
    /// Pipeline without any registered dissector.
    pub fn empty(toggles: Arc<DissectorToggles>) -> Self {
        Self {
            dissectors: ProtocolId::ALL.iter().map(|_| None).collect(),
            toggles,
        }
    }

    /// Pipeline with the full default protocol stack.
    pub fn new(toggles: Arc<DissectorToggles>) -> Self {
        let mut pipeline = Self::empty(toggles);
        pipeline.register(Box::new(LinkDissector::default()));
        pipeline.register(Box::new(IpDissector::default()));
        pipeline.register(Box::new(UdpDissector));
        pipeline.register(Box::new(TcpDissector::default()));
        pipeline.register(Box::new(TlsDissector::default()));
        pipeline.register(Box::new(WsDissector));
        pipeline.register(Box::new(SipDissector));
        pipeline.register(Box::new(RtpDissector));
        pipeline.register(Box::new(RtcpDissector));
        pipeline
    }

    /// Register (or replace) the dissector for its protocol id.
    pub fn register(&mut self, dissector: Box<dyn Dissector>) {
        let id = dissector.id();
        self.dissectors[id.index()] = Some(dissector);
    }

    pub fn toggles(&self) -> &Arc<DissectorToggles> {
        &self.toggles
    }

    /// Dissect one captured frame.
    ///
    /// Usually yields one packet. The result is empty when a layer kept
    /// the frame for reassembly (the frame then reappears inside a later
    /// packet) and holds several packets when one TCP segment carried
    /// several SIP messages.
    pub fn dissect_frame(&mut self, datalink: i32, frame: Frame) -> Vec<Packet> {
        let data = frame.data().to_vec();
        let mut packet = Packet::new(frame);
        let mut ctx = DissectContext::new(datalink);
        let _ = self.dissect_with(ProtocolId::Link, &mut ctx, &mut packet, data);

        let mut packets = Vec::new();
        if ctx.held {
            trace!("frame held for reassembly");
        } else {
            packets.push(packet);
        }
        let mut queue = VecDeque::from(ctx.queued);
        while let Some(QueuedPacket {
            layer,
            mut packet,
            data,
        }) = queue.pop_front()
        {
            let mut ctx = DissectContext::new(datalink);
            let _ = self.dissect_children(layer, &mut ctx, &mut packet, data);
            if !ctx.held {
                packets.push(packet);
            }
            queue.extend(ctx.queued);
        }
        packets
    }

    fn subdissectors(&self, id: ProtocolId) -> &'static [ProtocolId] {
        self.dissectors[id.index()]
            .as_ref()
            .map(|d| d.subdissectors())
            .unwrap_or(&[])
    }

    fn dissect_with(
        &mut self,
        id: ProtocolId,
        ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        if !self.toggles.is_enabled(id) {
            trace!(protocol = id.name(), "dissector disabled, passing through");
            return self.dissect_children(id, ctx, packet, data);
        }
        let Some(dissector) = self.dissectors[id.index()].as_mut() else {
            return Some(data);
        };
        let rest = dissector.dissect(ctx, packet, data)?;
        if !packet.has_record(id) {
            return Some(rest);
        }
        self.dissect_children(id, ctx, packet, rest)
    }

    fn dissect_children(
        &mut self,
        id: ProtocolId,
        ctx: &mut DissectContext,
        packet: &mut Packet,
        mut data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        for &child in self.subdissectors(id) {
            data = self.dissect_with(child, ctx, packet, data)?;
            if packet.has_record(child) {
                break;
            }
        }
        Some(data)
    }
}
