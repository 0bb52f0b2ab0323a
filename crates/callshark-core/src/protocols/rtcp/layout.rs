pub const MIN_LEN: usize = 8;
pub const VERSION: u8 = 2;
pub const VERSION_SHIFT: u8 = 6;
pub const FIRST_OCTET_MIN: u8 = 0x80;
pub const FIRST_OCTET_MAX: u8 = 0xbf;
pub const COUNT_MASK: u8 = 0x1f;

pub const PACKET_TYPE_OFFSET: usize = 1;
pub const LENGTH_OFFSET: usize = 2;
pub const SSRC_OFFSET: usize = 4;

/// Packet type range reserved for RTCP (RFC 5761 section 4).
pub const PACKET_TYPE_MIN: u8 = 192;
pub const PACKET_TYPE_MAX: u8 = 223;

pub const PT_SR: u8 = 200;
pub const PT_RR: u8 = 201;
pub const PT_SDES: u8 = 202;
pub const PT_BYE: u8 = 203;
pub const PT_APP: u8 = 204;
