//! RTCP header classification (first packet of a compound datagram).

pub mod error;
pub mod layout;
pub mod parser;

pub use error::RtcpError;
pub use parser::{RtcpHeader, is_rtcp, parse_rtcp};
