//! SIP message decoding.
//!
//! The parser recognises a request or status line, collects the header
//! block (long and compact names, folded lines), delimits the body with
//! Content-Length when present and extracts SDP media from
//! `application/sdp` bodies, including `multipart/*` ones. A message
//! without Call-ID is rejected: it cannot be correlated.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::SipError;
pub use parser::{SipMethod, SipPayload, SipStartLine, looks_like_sip, message_length, parse_sip};
