//! TLS record-layer framing.
//!
//! Only the record header is interpreted here; handshake tracking and
//! decryption belong to the TLS dissector and its decryptor collaborator.

pub mod error;
pub mod layout;
pub mod parser;

pub use error::TlsRecordError;
pub use parser::{TlsRecordView, split_records};
