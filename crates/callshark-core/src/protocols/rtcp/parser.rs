use super::error::RtcpError;
use super::layout;
use crate::protocols::common::reader::ByteReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcpHeader {
    pub count: u8,
    pub packet_type: u8,
    /// Length in 32-bit words minus one.
    pub length: u16,
    pub ssrc: u32,
}

impl RtcpHeader {
    pub fn type_name(&self) -> &'static str {
        match self.packet_type {
            layout::PT_SR => "SR",
            layout::PT_RR => "RR",
            layout::PT_SDES => "SDES",
            layout::PT_BYE => "BYE",
            layout::PT_APP => "APP",
            _ => "RTCP",
        }
    }
}

pub fn is_rtcp(data: &[u8]) -> bool {
    let (Some(&first), Some(&packet_type)) = (data.first(), data.get(1)) else {
        return false;
    };
    data.len() >= layout::MIN_LEN
        && first >> layout::VERSION_SHIFT == layout::VERSION
        && (layout::FIRST_OCTET_MIN..=layout::FIRST_OCTET_MAX).contains(&first)
        && (layout::PACKET_TYPE_MIN..=layout::PACKET_TYPE_MAX).contains(&packet_type)
}

pub fn parse_rtcp(data: &[u8]) -> Result<Option<RtcpHeader>, RtcpError> {
    if !is_rtcp(data) {
        return Ok(None);
    }
    let reader = ByteReader::new(data);
    Ok(Some(RtcpHeader {
        count: reader.read_u8(0)? & layout::COUNT_MASK,
        packet_type: reader.read_u8(layout::PACKET_TYPE_OFFSET)?,
        length: reader.read_u16_be(layout::LENGTH_OFFSET)?,
        ssrc: reader.read_u32_be(layout::SSRC_OFFSET)?,
    }))
}
