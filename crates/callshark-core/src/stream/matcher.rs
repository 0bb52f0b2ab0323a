use tracing::{debug, trace};

use crate::call::{Call, CallRegistry};
use crate::packet::{Endpoint, Packet};

use super::{RtpStream, StreamKind, StreamRef};

/// Result of offering a media packet to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaMatch {
    Matched(StreamRef),
    /// No active call expects this flow.
    Unmatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    /// Same 4-tuple and format, already carrying packets.
    Exact,
    /// Same 4-tuple, any format, already carrying packets.
    Tuple,
    /// Same destination, no packet yet.
    Destination,
}

impl Tier {
    const ORDER: [Tier; 3] = [Tier::Exact, Tier::Tuple, Tier::Destination];

    fn accepts(
        self,
        stream: &RtpStream,
        kind: StreamKind,
        src: Endpoint,
        dst: Endpoint,
        format: Option<u8>,
    ) -> bool {
        if stream.kind() != kind || stream.dst() != dst {
            return false;
        }
        match self {
            Tier::Exact => {
                stream.pktcnt() > 0 && stream.src() == Some(src) && stream.format() == format
            }
            Tier::Tuple => stream.pktcnt() > 0 && stream.src() == Some(src),
            Tier::Destination => stream.pktcnt() == 0,
        }
    }
}

/// Search active calls, newest first, tier by tier.
///
/// The first tier that matches anywhere wins. Two active calls expecting
/// media on the same destination cannot be told apart here; the newest
/// one gets the flow.
fn find_stream(
    registry: &CallRegistry,
    kind: StreamKind,
    src: Endpoint,
    dst: Endpoint,
    format: Option<u8>,
) -> Option<(usize, usize, Tier)> {
    Tier::ORDER.into_iter().find_map(|tier| {
        registry.active_calls().rev().find_map(|call| {
            call.streams()
                .iter()
                .rposition(|stream| tier.accepts(stream, kind, src, dst, format))
                .map(|stream| (call.index(), stream, tier))
        })
    })
}

fn has_reverse(call: &Call, kind: StreamKind, src: Endpoint, dst: Endpoint) -> bool {
    call.streams().iter().any(|stream| {
        stream.kind() == kind
            && stream.dst() == src
            && stream.src().is_none_or(|reverse_src| reverse_src == dst)
    })
}

/// Attribute a dissected RTP or RTCP packet to a call stream.
///
/// Returns `None` for packets that carry neither record.
pub fn match_packet(registry: &mut CallRegistry, packet: &Packet) -> Option<MediaMatch> {
    let (kind, format) = if let Some(rtp) = packet.rtp() {
        (StreamKind::Rtp, Some(rtp.payload_type))
    } else if packet.rtcp().is_some() {
        (StreamKind::Rtcp, None)
    } else {
        return None;
    };
    let (src, dst) = (packet.src()?, packet.dst()?);

    let Some((call_index, mut stream_index, tier)) =
        find_stream(registry, kind, src, dst, format)
    else {
        trace!(kind = kind.as_str(), %src, %dst, "media packet without call");
        return Some(MediaMatch::Unmatched);
    };
    let call = registry.call_mut(call_index)?;

    if tier == Tier::Tuple && call.streams()[stream_index].format() != format {
        let previous = &call.streams()[stream_index];
        debug!(
            call_id = %call.call_id(),
            from = ?previous.format(),
            to = ?format,
            "format change, starting new stream"
        );
        let media = previous.media();
        stream_index = call.add_stream(RtpStream::complete(kind, src, dst, format, media));
    }

    if call.streams()[stream_index].pktcnt() == 0 {
        let media = call.streams()[stream_index].media();
        call.streams_mut()[stream_index].set_source(src, format);
        if kind == StreamKind::Rtp && !has_reverse(call, kind, src, dst) {
            call.add_stream(RtpStream::complete(kind, dst, src, format, media));
        }
    }
    call.streams_mut()[stream_index].add_packet(packet.ts());

    Some(MediaMatch::Matched(StreamRef {
        call: call_index,
        stream: stream_index,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::RegistryOptions;
    use crate::test_util::{endpoint, invite, response, rtcp_packet, rtp_packet, sip_packet};

    const ALICE: &str = "10.0.0.1:5060";
    const BOB: &str = "10.0.0.2:5060";

    fn registry_with_call(call_id: &str, media: &str) -> CallRegistry {
        let mut registry = CallRegistry::new(RegistryOptions::default());
        registry
            .process_packet(sip_packet(1, ALICE, BOB, &invite(call_id, media, &[0, 8])))
            .unwrap();
        registry
    }

    #[test]
    fn first_packet_completes_sdp_stream_and_creates_reverse() {
        let mut registry = registry_with_call("abc", "10.0.0.1:4000");
        let packet = rtp_packet(2, "10.0.0.2:6000", "10.0.0.1:4000", 0);
        let matched = match_packet(&mut registry, &packet).unwrap();
        assert_eq!(
            matched,
            MediaMatch::Matched(StreamRef { call: 0, stream: 0 })
        );

        let call = registry.call(0).unwrap();
        let stream = call.stream(0).unwrap();
        assert!(stream.is_complete());
        assert_eq!(stream.src(), Some(endpoint("10.0.0.2:6000")));
        assert_eq!(stream.pktcnt(), 1);

        let reverse = call.streams().last().unwrap();
        assert_eq!(reverse.kind(), StreamKind::Rtp);
        assert_eq!(reverse.src(), Some(endpoint("10.0.0.1:4000")));
        assert_eq!(reverse.dst(), endpoint("10.0.0.2:6000"));
        assert_eq!(reverse.pktcnt(), 0);
    }

    #[test]
    fn pcmu_stream_counts_packets_and_resolves_codec() {
        let mut registry = registry_with_call("abc", "10.0.0.1:4000");
        let packet = rtp_packet(2, "10.0.0.2:6000", "10.0.0.1:4000", 0);
        match_packet(&mut registry, &packet);
        assert_eq!(registry.call(0).unwrap().stream(0).unwrap().pktcnt(), 1);
        match_packet(&mut registry, &packet);

        let call = registry.call(0).unwrap();
        let stream = call.stream(0).unwrap();
        assert_eq!(stream.pktcnt(), 2);
        let codec = call.codec(stream).unwrap();
        assert_eq!(codec.name.as_deref(), Some("PCMU/8000"));
        assert_eq!(codec.alias.as_deref(), Some("g711u"));
    }

    #[test]
    fn format_change_creates_new_stream_and_keeps_original() {
        let mut registry = registry_with_call("abc", "10.0.0.1:4000");
        match_packet(
            &mut registry,
            &rtp_packet(2, "10.0.0.2:6000", "10.0.0.1:4000", 0),
        );
        let streams_before = registry.call(0).unwrap().streams().len();

        let changed = match_packet(
            &mut registry,
            &rtp_packet(3, "10.0.0.2:6000", "10.0.0.1:4000", 8),
        )
        .unwrap();
        let MediaMatch::Matched(stream_ref) = changed else {
            panic!("expected a match");
        };
        let call = registry.call(0).unwrap();
        assert_eq!(call.streams().len(), streams_before + 1);
        assert_ne!(stream_ref.stream, 0);
        assert_eq!(call.stream(0).unwrap().format(), Some(0));
        assert_eq!(call.stream(0).unwrap().pktcnt(), 1);
        let new_stream = call.stream(stream_ref.stream).unwrap();
        assert_eq!(new_stream.format(), Some(8));
        assert_eq!(new_stream.pktcnt(), 1);
    }

    #[test]
    fn rtcp_completes_rtcp_stream_without_reverse() {
        let mut registry = registry_with_call("abc", "10.0.0.1:4000");
        let before = registry.call(0).unwrap().streams().len();
        let matched = match_packet(
            &mut registry,
            &rtcp_packet(2, "10.0.0.2:6001", "10.0.0.1:4001"),
        )
        .unwrap();
        let MediaMatch::Matched(stream_ref) = matched else {
            panic!("expected a match");
        };
        let call = registry.call(0).unwrap();
        let stream = call.stream(stream_ref.stream).unwrap();
        assert_eq!(stream.kind(), StreamKind::Rtcp);
        assert_eq!(stream.pktcnt(), 1);
        assert_eq!(stream.format(), None);
        assert_eq!(call.streams().len(), before);
    }

    #[test]
    fn media_without_active_call_is_unmatched() {
        let mut registry = registry_with_call("abc", "10.0.0.1:4000");
        let packet = rtp_packet(2, "10.0.0.2:6000", "10.0.0.9:4000", 0);
        assert_eq!(
            match_packet(&mut registry, &packet),
            Some(MediaMatch::Unmatched)
        );

        registry
            .process_packet(sip_packet(3, BOB, ALICE, &response("abc", 486)))
            .unwrap();
        let packet = rtp_packet(4, "10.0.0.2:6000", "10.0.0.1:4000", 0);
        assert_eq!(
            match_packet(&mut registry, &packet),
            Some(MediaMatch::Unmatched)
        );
    }

    #[test]
    fn non_media_packets_are_ignored() {
        let mut registry = registry_with_call("abc", "10.0.0.1:4000");
        let packet = sip_packet(2, ALICE, BOB, &invite("other", "10.0.0.1:4000", &[0]));
        assert_eq!(match_packet(&mut registry, &packet), None);
    }

    /// Two live calls expecting media on the same destination: the newest
    /// call takes the flow even if it belongs to the older one. Known
    /// misattribution under NAT or port reuse.
    #[test]
    fn shared_destination_goes_to_newest_call() {
        let mut registry = registry_with_call("first", "10.0.0.1:4000");
        registry
            .process_packet(sip_packet(
                2,
                ALICE,
                BOB,
                &invite("second", "10.0.0.1:4000", &[0]),
            ))
            .unwrap();
        let matched = match_packet(
            &mut registry,
            &rtp_packet(3, "10.0.0.2:6000", "10.0.0.1:4000", 0),
        );
        assert_eq!(
            matched,
            Some(MediaMatch::Matched(StreamRef { call: 1, stream: 0 }))
        );
        assert_eq!(registry.call(0).unwrap().stream(0).unwrap().pktcnt(), 0);
    }

    #[test]
    fn dynamic_payload_type_resolves_from_sdp() {
        let mut registry = registry_with_call("abc", "10.0.0.1:4000");
        match_packet(
            &mut registry,
            &rtp_packet(2, "10.0.0.2:6000", "10.0.0.1:4000", 101),
        );
        let call = registry.call(0).unwrap();
        let codec = call.codec(call.stream(0).unwrap()).unwrap();
        assert_eq!(codec.id, 101);
        assert_eq!(codec.name.as_deref(), Some("telephone-event/8000"));
    }

    #[test]
    fn unknown_dynamic_payload_type_keeps_raw_id() {
        let mut registry = registry_with_call("abc", "10.0.0.1:4000");
        match_packet(
            &mut registry,
            &rtp_packet(2, "10.0.0.2:6000", "10.0.0.1:4000", 110),
        );
        let call = registry.call(0).unwrap();
        let codec = call.codec(call.stream(0).unwrap()).unwrap();
        assert_eq!(codec.name, None);
        assert_eq!(codec.to_string(), "110");
    }
}
