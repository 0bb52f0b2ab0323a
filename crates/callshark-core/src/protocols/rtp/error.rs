use thiserror::Error;

use crate::protocols::common::reader::ReadError;

#[derive(Debug, Error)]
pub enum RtpError {
    #[error(transparent)]
    Truncated(#[from] ReadError),
}
