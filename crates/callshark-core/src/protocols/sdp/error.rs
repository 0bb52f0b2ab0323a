use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdpError {
    #[error("invalid media line: {line}")]
    InvalidMedia { line: String },
    #[error("invalid connection address: {line}")]
    InvalidConnection { line: String },
}
