use std::fmt;

use serde::Serialize;

use super::error::SipError;
use super::layout;
use super::reader::{canonical_name, find, header_lines, split_head};
use crate::protocols::sdp::{SdpMedia, parse_sdp};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SipMethod {
    Register,
    Invite,
    Subscribe,
    Notify,
    Options,
    Publish,
    Message,
    Cancel,
    Bye,
    Ack,
    Prack,
    Info,
    Refer,
    Update,
    Other(String),
}

impl SipMethod {
    const KNOWN: [SipMethod; 14] = [
        SipMethod::Register,
        SipMethod::Invite,
        SipMethod::Subscribe,
        SipMethod::Notify,
        SipMethod::Options,
        SipMethod::Publish,
        SipMethod::Message,
        SipMethod::Cancel,
        SipMethod::Bye,
        SipMethod::Ack,
        SipMethod::Prack,
        SipMethod::Info,
        SipMethod::Refer,
        SipMethod::Update,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SipMethod::Register => "REGISTER",
            SipMethod::Invite => "INVITE",
            SipMethod::Subscribe => "SUBSCRIBE",
            SipMethod::Notify => "NOTIFY",
            SipMethod::Options => "OPTIONS",
            SipMethod::Publish => "PUBLISH",
            SipMethod::Message => "MESSAGE",
            SipMethod::Cancel => "CANCEL",
            SipMethod::Bye => "BYE",
            SipMethod::Ack => "ACK",
            SipMethod::Prack => "PRACK",
            SipMethod::Info => "INFO",
            SipMethod::Refer => "REFER",
            SipMethod::Update => "UPDATE",
            SipMethod::Other(name) => name,
        }
    }

    pub fn from_token(token: &str) -> SipMethod {
        Self::KNOWN
            .iter()
            .find(|method| method.as_str() == token)
            .cloned()
            .unwrap_or_else(|| SipMethod::Other(token.to_string()))
    }

    pub fn is_known_token(token: &str) -> bool {
        Self::KNOWN.iter().any(|method| method.as_str() == token)
    }
}

impl fmt::Display for SipMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SipStartLine {
    Request { method: SipMethod, uri: String },
    Response { code: u16, reason: String },
}

/// Decoded SIP message, before it is attached to a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipPayload {
    pub start: SipStartLine,
    /// Headers in wire order, names as written.
    pub headers: Vec<(String, String)>,
    pub call_id: String,
    pub body: Vec<u8>,
    pub medias: Vec<SdpMedia>,
    /// Complete message bytes (start line through body).
    pub raw: Vec<u8>,
}

impl SipPayload {
    pub fn method(&self) -> Option<&SipMethod> {
        match &self.start {
            SipStartLine::Request { method, .. } => Some(method),
            SipStartLine::Response { .. } => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match &self.start {
            SipStartLine::Response { code, .. } => Some(*code),
            SipStartLine::Request { .. } => None,
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self.start, SipStartLine::Request { .. })
    }

    /// First header value with the given (canonical, lowercase) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| canonical_name(header) == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn x_call_id(&self) -> Option<&str> {
        self.header(layout::HDR_X_CALL_ID)
            .or_else(|| self.header(layout::HDR_X_CID))
    }

    pub fn from(&self) -> Option<&str> {
        self.header(layout::HDR_FROM)
    }

    pub fn to(&self) -> Option<&str> {
        self.header(layout::HDR_TO)
    }

    pub fn from_user(&self) -> Option<&str> {
        self.from().and_then(uri_user)
    }

    pub fn to_user(&self) -> Option<&str> {
        self.to().and_then(uri_user)
    }

    /// CSeq number and method.
    pub fn cseq(&self) -> Option<(u32, &str)> {
        let value = self.header(layout::HDR_CSEQ)?;
        let (number, method) = value.split_once(char::is_whitespace)?;
        Some((number.trim().parse().ok()?, method.trim()))
    }

    /// Summary line: method name for requests, `code reason` for responses.
    pub fn summary(&self) -> String {
        match &self.start {
            SipStartLine::Request { method, .. } => method.to_string(),
            SipStartLine::Response { code, reason } => format!("{code} {reason}"),
        }
    }
}

/// User part of a name-addr or addr-spec (`"A" <sip:alice@host>;tag=1`).
pub fn uri_user(value: &str) -> Option<&str> {
    let start = ["sips:", "sip:", "tel:"]
        .iter()
        .find_map(|scheme| value.find(scheme).map(|pos| pos + scheme.len()))?;
    let rest = &value[start..];
    let end = rest.find(['@', '>', ';', ':']).unwrap_or(rest.len());
    let user = &rest[..end];
    if user.is_empty() { None } else { Some(user) }
}

fn first_line(data: &[u8]) -> Option<&[u8]> {
    find(data, b"\n").map(|pos| {
        let line = &data[..pos];
        line.strip_suffix(b"\r").unwrap_or(line)
    })
}

/// Cheap check that a buffer starts with a SIP request or status line.
///
/// Accepts a partial first line when its method token is a known one, so
/// TCP segments that split the request line can be held for reassembly.
pub fn looks_like_sip(data: &[u8]) -> bool {
    if data.starts_with(b"SIP/2.0 ") {
        return true;
    }
    let token_len = data
        .iter()
        .take(layout::MAX_METHOD_LEN + 1)
        .position(|b| *b == b' ')
        .unwrap_or(0);
    if token_len == 0 || !data[..token_len].iter().all(u8::is_ascii_uppercase) {
        return false;
    }
    match first_line(data) {
        Some(line) => line.ends_with(layout::SIP_VERSION.as_bytes()),
        None => std::str::from_utf8(&data[..token_len]).is_ok_and(SipMethod::is_known_token),
    }
}

fn content_length(headers: &[(String, String)]) -> Result<Option<usize>, SipError> {
    let Some((_, value)) = headers
        .iter()
        .find(|(name, _)| canonical_name(name) == layout::HDR_CONTENT_LENGTH)
    else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| SipError::InvalidContentLength {
            value: value.clone(),
        })
}

/// Total length of the first complete SIP message in `data`.
///
/// `Ok(None)` when more bytes are needed; messages without Content-Length
/// end with their header block. A message announced as longer than
/// [`layout::MAX_MESSAGE_LEN`] is an error.
pub fn message_length(data: &[u8]) -> Result<Option<usize>, SipError> {
    let Some((head, body_offset)) = split_head(data) else {
        return Ok(None);
    };
    let head = String::from_utf8_lossy(head);
    let length = content_length(&header_lines(&head))?.unwrap_or(0);
    let total = body_offset
        .checked_add(length)
        .filter(|total| *total <= layout::MAX_MESSAGE_LEN)
        .ok_or(SipError::MessageTooLong { length })?;
    Ok((data.len() >= total).then_some(total))
}

fn parse_start_line(line: &str) -> Result<SipStartLine, SipError> {
    let invalid = || SipError::InvalidStartLine {
        line: line.to_string(),
    };
    if let Some(rest) = line.strip_prefix("SIP/2.0 ") {
        let (code, reason) = rest.split_once(' ').unwrap_or((rest, ""));
        let code: u16 = code.parse().map_err(|_| invalid())?;
        if !(100..=699).contains(&code) {
            return Err(invalid());
        }
        return Ok(SipStartLine::Response {
            code,
            reason: reason.trim().to_string(),
        });
    }
    let mut parts = line.split(' ');
    let (Some(method), Some(uri), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    if version != layout::SIP_VERSION || method.is_empty() {
        return Err(invalid());
    }
    Ok(SipStartLine::Request {
        method: SipMethod::from_token(method),
        uri: uri.to_string(),
    })
}

fn mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn multipart_boundary(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"'))
    })
}

fn sdp_from_multipart(body: &[u8], boundary: &str) -> Vec<SdpMedia> {
    let delimiter = format!("--{boundary}");
    let text = String::from_utf8_lossy(body);
    text.split(delimiter.as_str())
        .filter_map(|part| {
            let (head, part_body) = split_head(part.as_bytes())
                .map(|(head, offset)| (head, &part.as_bytes()[offset..]))?;
            let head = String::from_utf8_lossy(head);
            let is_sdp = head.lines().any(|line| {
                line.split_once(':').is_some_and(|(name, value)| {
                    canonical_name(name) == layout::HDR_CONTENT_TYPE
                        && mime_type(value) == layout::MIME_SDP
                })
            });
            is_sdp.then(|| parse_sdp(part_body).unwrap_or_default())
        })
        .flatten()
        .collect()
}

fn extract_medias(content_type: Option<&str>, body: &[u8]) -> Vec<SdpMedia> {
    let Some(content_type) = content_type else {
        return Vec::new();
    };
    let mime = mime_type(content_type);
    if mime == layout::MIME_SDP {
        // Media extraction is best effort; a broken SDP leaves the message intact.
        return parse_sdp(body).unwrap_or_default();
    }
    if mime.starts_with(layout::MIME_MULTIPART) {
        if let Some(boundary) = multipart_boundary(content_type) {
            return sdp_from_multipart(body, boundary);
        }
    }
    Vec::new()
}

/// Parse the first SIP message in `data`.
///
/// Returns `Ok(None)` when the buffer does not start like SIP, and an error
/// when it does but is truncated or malformed.
pub fn parse_sip(data: &[u8]) -> Result<Option<SipPayload>, SipError> {
    if !looks_like_sip(data) {
        return Ok(None);
    }
    let (head, body_offset) = split_head(data).ok_or(SipError::IncompleteHeaders)?;
    let head = String::from_utf8_lossy(head);
    let start = parse_start_line(head.lines().next().unwrap_or_default().trim_end())?;
    let headers = header_lines(&head);

    let call_id = headers
        .iter()
        .find(|(name, _)| canonical_name(name) == layout::HDR_CALL_ID)
        .map(|(_, value)| value.clone())
        .filter(|value| !value.is_empty())
        .ok_or(SipError::MissingCallId)?;

    let available = data.len() - body_offset;
    let body_len = match content_length(&headers)? {
        Some(expected) if expected > available => {
            return Err(SipError::IncompleteBody {
                expected,
                actual: available,
            });
        }
        Some(expected) => expected,
        None => available,
    };
    let end = body_offset + body_len;
    let body = data[body_offset..end].to_vec();

    let content_type = headers
        .iter()
        .find(|(name, _)| canonical_name(name) == layout::HDR_CONTENT_TYPE)
        .map(|(_, value)| value.as_str());
    let medias = extract_medias(content_type, &body);

    Ok(Some(SipPayload {
        start,
        headers,
        call_id,
        body,
        medias,
        raw: data[..end].to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite() -> String {
        let sdp = "v=0\r\nc=IN IP4 10.0.0.1\r\nm=audio 49170 RTP/AVP 0\r\n";
        format!(
            "INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
From: \"Alice\" <sip:alice@atlanta.com>;tag=1928301774\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
X-Call-ID: leg-a\r\n\
CSeq: 314159 INVITE\r\n\
Content-Type: application/sdp\r\n\
Content-Length: {}\r\n\
\r\n{}",
            sdp.len(),
            sdp
        )
    }

    #[test]
    fn parses_invite_with_sdp() {
        let payload = invite();
        let parsed = parse_sip(payload.as_bytes()).unwrap().unwrap();
        assert_eq!(parsed.method(), Some(&SipMethod::Invite));
        assert!(parsed.is_request());
        assert_eq!(parsed.call_id, "a84b4c76e66710@pc33.atlanta.com");
        assert_eq!(parsed.x_call_id(), Some("leg-a"));
        assert_eq!(parsed.from_user(), Some("alice"));
        assert_eq!(parsed.to_user(), Some("bob"));
        assert_eq!(parsed.cseq(), Some((314159, "INVITE")));
        assert_eq!(parsed.medias.len(), 1);
        assert_eq!(parsed.medias[0].port, 49170);
        assert_eq!(parsed.raw.len(), payload.len());
    }

    #[test]
    fn trailing_bytes_after_content_length_are_not_part_of_the_message() {
        let mut payload = invite().into_bytes();
        let len = payload.len();
        payload.extend_from_slice(b"garbage");
        let parsed = parse_sip(&payload).unwrap().unwrap();
        assert_eq!(parsed.raw.len(), len);
    }

    #[test]
    fn parses_response_with_compact_headers() {
        let data = b"SIP/2.0 180 Ringing\r\ni: abc\r\nf: <sip:a@x>\r\nt: <sip:b@y>\r\nl: 0\r\n\r\n";
        let parsed = parse_sip(data).unwrap().unwrap();
        assert_eq!(parsed.status(), Some(180));
        assert_eq!(parsed.summary(), "180 Ringing");
        assert_eq!(parsed.call_id, "abc");
        assert_eq!(parsed.from_user(), Some("a"));
        assert!(parsed.body.is_empty());
    }

    #[test]
    fn non_sip_is_declined() {
        assert!(parse_sip(b"GET / HTTP/1.1\r\n\r\n").unwrap().is_none());
        assert!(parse_sip(&[0x80, 0x00, 0x01, 0x02]).unwrap().is_none());
        assert!(parse_sip(b"").unwrap().is_none());
    }

    #[test]
    fn missing_call_id_is_an_error() {
        let data = b"OPTIONS sip:a SIP/2.0\r\nCSeq: 1 OPTIONS\r\n\r\n";
        assert_eq!(parse_sip(data).unwrap_err(), SipError::MissingCallId);
    }

    #[test]
    fn truncated_body_is_an_error() {
        let data = b"MESSAGE sip:a SIP/2.0\r\nCall-ID: x\r\nContent-Length: 10\r\n\r\nhello";
        assert_eq!(
            parse_sip(data).unwrap_err(),
            SipError::IncompleteBody {
                expected: 10,
                actual: 5
            }
        );
    }

    #[test]
    fn bad_status_code_is_an_error() {
        let data = b"SIP/2.0 999 Nope\r\nCall-ID: x\r\n\r\n";
        assert!(matches!(
            parse_sip(data),
            Err(SipError::InvalidStartLine { .. })
        ));
    }

    #[test]
    fn message_length_uses_content_length() {
        let data = b"BYE sip:a SIP/2.0\r\nCall-ID: x\r\nContent-Length: 4\r\n\r\nbodyNEXT";
        let expected = data.len() - 4;
        assert_eq!(message_length(data).unwrap(), Some(expected));
        assert_eq!(message_length(&data[..expected - 1]).unwrap(), None);
        assert_eq!(message_length(b"BYE sip:a SIP/2.0\r\n").unwrap(), None);
    }

    #[test]
    fn oversized_content_length_is_rejected() {
        let huge = b"INVITE sip:a SIP/2.0\r\nCall-ID: x\r\nContent-Length: 18446744073709551615\r\n\r\n";
        assert!(matches!(
            message_length(huge),
            Err(SipError::MessageTooLong { .. })
        ));
        let large = b"INVITE sip:a SIP/2.0\r\nCall-ID: x\r\nContent-Length: 70000\r\n\r\n";
        assert_eq!(
            message_length(large),
            Err(SipError::MessageTooLong { length: 70000 })
        );
    }

    #[test]
    fn partial_request_line_of_known_method_looks_like_sip() {
        assert!(looks_like_sip(b"INVITE sip:bo"));
        assert!(!looks_like_sip(b"FOO sip:bo"));
        assert!(!looks_like_sip(b"invite sip:b SIP/2.0\r\n"));
        assert!(looks_like_sip(b"FOO sip:b SIP/2.0\r\n"));
    }

    #[test]
    fn multipart_body_sdp_is_extracted() {
        let body = "--b1\r\nContent-Type: application/sdp\r\n\r\nv=0\r\nc=IN IP4 10.0.0.2\r\nm=audio 4000 RTP/AVP 8\r\n--b1\r\nContent-Type: application/isup\r\n\r\nxx\r\n--b1--\r\n";
        let data = format!(
            "INVITE sip:b SIP/2.0\r\nCall-ID: m\r\nContent-Type: multipart/mixed;boundary=\"b1\"\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let parsed = parse_sip(data.as_bytes()).unwrap().unwrap();
        assert_eq!(parsed.medias.len(), 1);
        assert_eq!(parsed.medias[0].port, 4000);
        assert_eq!(parsed.medias[0].format(8).unwrap().alias.as_deref(), Some("g711a"));
    }

    #[test]
    fn uri_user_variants() {
        assert_eq!(uri_user("<sip:1000@pbx>;tag=a"), Some("1000"));
        assert_eq!(uri_user("sips:bob@secure"), Some("bob"));
        assert_eq!(uri_user("<tel:+15551234;phone-context=x>"), Some("+15551234"));
        assert_eq!(uri_user("<sip:pbx.example.com>"), Some("pbx.example.com"));
        assert_eq!(uri_user("anonymous"), None);
    }
}
