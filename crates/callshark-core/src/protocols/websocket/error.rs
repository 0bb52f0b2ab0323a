use thiserror::Error;

use crate::protocols::common::reader::ReadError;

#[derive(Debug, Error)]
pub enum WsError {
    #[error(transparent)]
    Truncated(#[from] ReadError),
    #[error("payload length overflows: {length}")]
    LengthOverflow { length: u64 },
}
