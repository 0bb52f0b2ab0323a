use super::codec::{RtpEncoding, encoding_by_id};
use super::error::RtpError;
use super::layout;
use crate::protocols::common::reader::ByteReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub marker: bool,
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

impl RtpHeader {
    /// Static encoding for this payload type, `None` when dynamic.
    pub fn encoding(&self) -> Option<&'static RtpEncoding> {
        encoding_by_id(self.payload_type)
    }
}

/// RTP demultiplexing heuristic.
pub fn is_rtp(data: &[u8]) -> bool {
    let (Some(&first), Some(&second)) = (data.first(), data.get(1)) else {
        return false;
    };
    let payload_type = second & layout::PAYLOAD_TYPE_MASK;
    data.len() >= layout::HEADER_LEN
        && first >> layout::VERSION_SHIFT == layout::VERSION
        && (layout::FIRST_OCTET_MIN..=layout::FIRST_OCTET_MAX).contains(&first)
        && (payload_type <= layout::PAYLOAD_TYPE_LOW_MAX
            || payload_type >= layout::PAYLOAD_TYPE_DYNAMIC_MIN)
}

/// Parse an RTP fixed header, `Ok(None)` when the heuristic rejects it.
pub fn parse_rtp(data: &[u8]) -> Result<Option<RtpHeader>, RtpError> {
    if !is_rtp(data) {
        return Ok(None);
    }
    let reader = ByteReader::new(data);
    let second = reader.read_u8(1)?;
    Ok(Some(RtpHeader {
        marker: second & layout::MARKER_MASK != 0,
        payload_type: second & layout::PAYLOAD_TYPE_MASK,
        sequence: reader.read_u16_be(layout::SEQUENCE_OFFSET)?,
        timestamp: reader.read_u32_be(layout::TIMESTAMP_OFFSET)?,
        ssrc: reader.read_u32_be(layout::SSRC_OFFSET)?,
    }))
}
