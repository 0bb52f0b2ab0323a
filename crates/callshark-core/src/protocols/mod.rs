//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets, constants and tables (source of truth)
//! - `reader`: safe byte access and protocol conventions
//! - `parser`: domain-level decoding returning `Ok(None)` for "not this
//!   protocol" and `Err` for malformed input
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O or state; the dissector pipeline
//! owns per-connection state and decides what to do with a decline.

pub(crate) mod common;
pub mod link;
pub mod rtcp;
pub mod rtp;
pub mod sdp;
pub mod sip;
pub mod tls;
pub mod websocket;
