//! Link-layer header stripping.
//!
//! The capture datalink type selects how many bytes precede the network
//! header. Ethernet (optionally 802.1Q / 802.1ad tagged), Linux cooked
//! capture v1/v2, NFLOG, BSD loopback, null and raw IP are supported.
//! Unknown datalink types are reported as `Ok(None)` so the caller can
//! drop the frame.

pub mod error;
pub mod layout;
pub mod parser;

pub use error::LinkError;
pub use parser::{LinkFrame, parse_link};
