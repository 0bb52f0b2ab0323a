use thiserror::Error;

use crate::protocols::common::reader::ReadError;

#[derive(Debug, Error)]
pub enum TlsRecordError {
    #[error(transparent)]
    Truncated(#[from] ReadError),
    #[error("record length {length} exceeds maximum")]
    RecordTooLong { length: u16 },
}
