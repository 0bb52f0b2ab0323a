//! RTP/RTCP stream attribution.
//!
//! Streams belong to calls. SDP offers create incomplete streams waiting
//! for their first packet; [`match_packet`] attributes dissected RTP and
//! RTCP packets to them.

mod matcher;
mod rtp_stream;

pub use matcher::{MediaMatch, match_packet};
pub use rtp_stream::{MediaRef, RtpStream, StreamCodec, StreamKind, StreamRef};
