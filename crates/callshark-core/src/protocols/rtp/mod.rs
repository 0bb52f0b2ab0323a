//! RTP header classification and the static payload-type table.
//!
//! Classification follows the RTP/RTCP demultiplexing rules of RFC 5761 and
//! RFC 5764: version 2, and a payload type outside the 65..=95 band that
//! RTCP packet types occupy once the marker bit is folded in.

pub mod codec;
pub mod error;
pub mod layout;
pub mod parser;

pub use codec::{RtpEncoding, STANDARD_ENCODINGS, encoding_by_id};
pub use error::RtpError;
pub use parser::{RtpHeader, is_rtp, parse_rtp};
