use thiserror::Error;

use crate::protocols::common::reader::ReadError;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    Truncated(#[from] ReadError),
    #[error("NFLOG frame without payload TLV")]
    MissingNflogPayload,
    #[error("invalid NFLOG TLV length: {length}")]
    InvalidNflogTlv { length: u16 },
}
