//! WebSocket framing (RFC 6455).
//!
//! Frames are accepted only when reserved bits are clear, the opcode is
//! defined and the announced payload length matches the buffer exactly;
//! masked payloads are unmasked on the way out.

pub mod error;
pub mod layout;
pub mod parser;

pub use error::WsError;
pub use parser::{WsFrame, parse_ws_frame};
