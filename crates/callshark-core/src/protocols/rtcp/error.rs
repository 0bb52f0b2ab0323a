use thiserror::Error;

use crate::protocols::common::reader::ReadError;

#[derive(Debug, Error)]
pub enum RtcpError {
    #[error(transparent)]
    Truncated(#[from] ReadError),
}
