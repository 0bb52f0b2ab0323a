//! SDP media extraction.
//!
//! Only what media correlation needs is read: `c=` connection addresses,
//! `m=` lines, `a=rtpmap` and `a=rtcp`. Anything else is ignored; this is
//! not a validating SDP parser.

pub mod error;
pub mod parser;

pub use error::SdpError;
pub use parser::{SdpFormat, SdpMedia, parse_sdp};
