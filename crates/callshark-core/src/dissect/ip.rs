use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;

use etherparse::{Ipv4HeaderSlice, Ipv6HeaderSlice};
use tracing::{debug, trace};

use crate::packet::{Frame, IpRecord, IpVersion, Packet, ProtoRecord};

use super::{DissectContext, Dissector, ProtocolId};

const IPV6_HEADER_LEN: usize = 40;
/// Extension headers skipped on the way to the transport header.
const IPV6_SKIPPABLE: [u8; 3] = [0, 43, 60];
const MAX_DATAGRAM_LEN: usize = 65_535;
const DEFAULT_MAX_PENDING: usize = 256;
const MAX_FRAGMENTS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FragmentKey {
    src: IpAddr,
    dst: IpAddr,
    id: u32,
    protocol: u8,
}

#[derive(Debug, Default)]
struct PendingDatagram {
    /// Sorted by offset.
    fragments: Vec<(usize, Vec<u8>)>,
    bytes: usize,
    total_len: Option<usize>,
    frames: Vec<Frame>,
}

impl PendingDatagram {
    /// Whether `start..end` is already filled by earlier fragments.
    fn covers(&self, start: usize, end: usize) -> bool {
        let mut pos = start;
        for (offset, data) in &self.fragments {
            if *offset > pos {
                break;
            }
            pos = pos.max(offset + data.len());
            if pos >= end {
                return true;
            }
        }
        pos >= end
    }

    fn insert(&mut self, offset: usize, data: Vec<u8>) {
        let at = self.fragments.partition_point(|(o, _)| *o <= offset);
        self.bytes += data.len();
        self.fragments.insert(at, (offset, data));
    }

    /// Payload once every byte up to the last fragment has arrived.
    fn assemble(&self) -> Option<Vec<u8>> {
        let total = self.total_len?;
        let mut covered = 0;
        for (offset, data) in &self.fragments {
            if *offset > covered {
                return None;
            }
            covered = covered.max(offset + data.len());
        }
        if covered < total {
            return None;
        }
        let mut payload = vec![0; total];
        for (offset, data) in &self.fragments {
            let end = (offset + data.len()).min(total);
            if *offset < end {
                payload[*offset..end].copy_from_slice(&data[..end - offset]);
            }
        }
        Some(payload)
    }
}

/// IPv4/IPv6 decoding with IPv4 fragment reassembly.
///
/// Fragments are keyed by (source, destination, identification, protocol).
/// Incomplete datagrams are bounded; the oldest is evicted when the limit
/// is reached. A fragment whose range is already filled is absorbed
/// without being stored, and a datagram exceeding the per-datagram byte
/// or fragment cap is evicted.
#[derive(Debug)]
pub struct IpDissector {
    pending: HashMap<FragmentKey, PendingDatagram>,
    order: VecDeque<FragmentKey>,
    max_pending: usize,
}

impl Default for IpDissector {
    fn default() -> Self {
        Self::with_max_pending(DEFAULT_MAX_PENDING)
    }
}

impl IpDissector {
    pub fn with_max_pending(max_pending: usize) -> Self {
        Self {
            pending: HashMap::new(),
            order: VecDeque::new(),
            max_pending: max_pending.max(1),
        }
    }

    /// Number of datagrams waiting for more fragments.
    pub fn pending_datagrams(&self) -> usize {
        self.pending.len()
    }

    /// Fragment payload bytes held across pending datagrams.
    pub fn pending_bytes(&self) -> usize {
        self.pending.values().map(|d| d.bytes).sum()
    }

    fn forget(&mut self, key: &FragmentKey) -> Option<PendingDatagram> {
        self.order.retain(|k| k != key);
        self.pending.remove(key)
    }

    fn reassemble(
        &mut self,
        key: FragmentKey,
        offset: usize,
        more_fragments: bool,
        fragment: &[u8],
        ctx: &mut DissectContext,
        packet: &mut Packet,
    ) -> Option<(Vec<u8>, usize)> {
        if offset + fragment.len() > MAX_DATAGRAM_LEN {
            debug!(id = key.id, offset, "fragment beyond maximum datagram size");
            self.forget(&key);
            return None;
        }
        if !self.pending.contains_key(&key) {
            if self.pending.len() >= self.max_pending {
                if let Some(oldest) = self.order.pop_front() {
                    debug!(id = oldest.id, "evicting incomplete datagram");
                    self.pending.remove(&oldest);
                }
            }
            self.order.push_back(key);
        }
        let datagram = self.pending.entry(key).or_default();
        if !more_fragments {
            datagram.total_len = Some(offset + fragment.len());
        }
        if !fragment.is_empty() && datagram.covers(offset, offset + fragment.len()) {
            trace!(id = key.id, offset, "duplicate fragment");
            packet.take_frames();
        } else {
            if datagram.fragments.len() >= MAX_FRAGMENTS
                || datagram.bytes + fragment.len() > MAX_DATAGRAM_LEN
            {
                debug!(
                    id = key.id,
                    fragments = datagram.fragments.len(),
                    bytes = datagram.bytes,
                    "evicting oversized datagram"
                );
                self.forget(&key);
                return None;
            }
            datagram.insert(offset, fragment.to_vec());
            datagram.frames.extend(packet.take_frames());
        }

        match datagram.assemble() {
            Some(payload) => {
                let datagram = self.forget(&key)?;
                trace!(
                    id = key.id,
                    fragments = datagram.fragments.len(),
                    "datagram reassembled"
                );
                let count = datagram.fragments.len();
                packet.prepend_frames(datagram.frames);
                Some((payload, count))
            }
            None => {
                ctx.held = true;
                None
            }
        }
    }

    fn dissect_v4(
        &mut self,
        ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        let header = match Ipv4HeaderSlice::from_slice(&data) {
            Ok(header) => header,
            Err(err) => {
                trace!(error = %err, "invalid ipv4 header");
                return None;
            }
        };
        let header_len = usize::from(header.ihl()) * 4;
        let total_len = usize::from(header.total_len());
        let end = total_len.clamp(header_len, data.len());
        let frag_offset = header.fragments_offset().value();
        let more_fragments = header.more_fragments();
        let mut record = IpRecord {
            version: IpVersion::V4,
            src: IpAddr::V4(header.source_addr()),
            dst: IpAddr::V4(header.destination_addr()),
            protocol: header.protocol().0,
            header_len,
            id: u32::from(header.identification()),
            caplen: data.len(),
            len: total_len,
            frag_offset,
            more_fragments,
            fragments: 1,
        };

        let mut payload = data[header_len..end].to_vec();
        if more_fragments || frag_offset > 0 {
            let key = FragmentKey {
                src: record.src,
                dst: record.dst,
                id: record.id,
                protocol: record.protocol,
            };
            let offset = usize::from(frag_offset) * 8;
            let (assembled, count) =
                self.reassemble(key, offset, more_fragments, &payload, ctx, packet)?;
            payload = assembled;
            record.fragments = count;
        }
        packet.set_record(ProtocolId::Ip, ProtoRecord::Ip(record));
        Some(payload)
    }

    fn dissect_v6(&mut self, packet: &mut Packet, data: Vec<u8>) -> Option<Vec<u8>> {
        let header = match Ipv6HeaderSlice::from_slice(&data) {
            Ok(header) => header,
            Err(err) => {
                trace!(error = %err, "invalid ipv6 header");
                return None;
            }
        };
        let payload_len = usize::from(header.payload_length());
        let end = if payload_len == 0 {
            data.len()
        } else {
            (IPV6_HEADER_LEN + payload_len).min(data.len())
        };

        let mut protocol = header.next_header().0;
        let mut offset = IPV6_HEADER_LEN;
        while IPV6_SKIPPABLE.contains(&protocol) {
            let (Some(&next), Some(&len)) = (data.get(offset), data.get(offset + 1)) else {
                break;
            };
            let ext_len = (usize::from(len) + 1) * 8;
            if offset + ext_len > end {
                break;
            }
            protocol = next;
            offset += ext_len;
        }

        packet.set_record(
            ProtocolId::Ip,
            ProtoRecord::Ip(IpRecord {
                version: IpVersion::V6,
                src: IpAddr::V6(header.source_addr()),
                dst: IpAddr::V6(header.destination_addr()),
                protocol,
                header_len: offset,
                id: 0,
                caplen: data.len(),
                len: IPV6_HEADER_LEN + payload_len,
                frag_offset: 0,
                more_fragments: false,
                fragments: 1,
            }),
        );
        Some(data[offset.min(end)..end].to_vec())
    }
}

impl Dissector for IpDissector {
    fn id(&self) -> ProtocolId {
        ProtocolId::Ip
    }

    fn subdissectors(&self) -> &'static [ProtocolId] {
        &[ProtocolId::Udp, ProtocolId::Tcp]
    }

    fn dissect(
        &mut self,
        ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        match data.first().map(|b| b >> 4) {
            Some(4) => self.dissect_v4(ctx, packet, data),
            Some(6) => self.dissect_v6(packet, data),
            _ => {
                trace!("not an ip packet");
                None
            }
        }
    }
}
