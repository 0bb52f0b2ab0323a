pub const SIP_VERSION: &str = "SIP/2.0";
pub const HEADER_END: &[u8] = b"\r\n\r\n";
pub const HEADER_END_LF: &[u8] = b"\n\n";
/// Largest message (headers and body) accepted from a stream transport.
pub const MAX_MESSAGE_LEN: usize = 64 * 1024;
/// Longest method token accepted on a request line.
pub const MAX_METHOD_LEN: usize = 16;

pub const HDR_CALL_ID: &str = "call-id";
pub const HDR_X_CALL_ID: &str = "x-call-id";
pub const HDR_X_CID: &str = "x-cid";
pub const HDR_FROM: &str = "from";
pub const HDR_TO: &str = "to";
pub const HDR_CSEQ: &str = "cseq";
pub const HDR_CONTENT_LENGTH: &str = "content-length";
pub const HDR_CONTENT_TYPE: &str = "content-type";
pub const HDR_USER_AGENT: &str = "user-agent";
pub const HDR_REASON: &str = "reason";
pub const HDR_WARNING: &str = "warning";

/// Compact header forms (RFC 3261 section 7.3.3).
pub const COMPACT_HEADERS: &[(&str, &str)] = &[
    ("i", HDR_CALL_ID),
    ("f", HDR_FROM),
    ("t", HDR_TO),
    ("l", HDR_CONTENT_LENGTH),
    ("c", HDR_CONTENT_TYPE),
    ("m", "contact"),
    ("v", "via"),
    ("k", "supported"),
    ("s", "subject"),
    ("e", "content-encoding"),
];

pub const MIME_SDP: &str = "application/sdp";
pub const MIME_MULTIPART: &str = "multipart/";
