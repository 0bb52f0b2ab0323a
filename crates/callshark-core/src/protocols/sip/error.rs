use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SipError {
    #[error("header block is not terminated")]
    IncompleteHeaders,
    #[error("body incomplete: need {expected} bytes, got {actual}")]
    IncompleteBody { expected: usize, actual: usize },
    #[error("invalid start line: {line}")]
    InvalidStartLine { line: String },
    #[error("invalid Content-Length: {value}")]
    InvalidContentLength { value: String },
    #[error("message too long: Content-Length {length}")]
    MessageTooLong { length: usize },
    #[error("missing Call-ID header")]
    MissingCallId,
}
