pub const HEADER_LEN: usize = 12;
pub const VERSION: u8 = 2;
pub const VERSION_SHIFT: u8 = 6;
/// First octet range for version 2 with any padding/extension/CSRC bits.
pub const FIRST_OCTET_MIN: u8 = 0x80;
pub const FIRST_OCTET_MAX: u8 = 0xbf;

pub const MARKER_MASK: u8 = 0x80;
pub const PAYLOAD_TYPE_MASK: u8 = 0x7f;
/// Highest payload type below the RTCP-conflicting band.
pub const PAYLOAD_TYPE_LOW_MAX: u8 = 64;
/// Lowest dynamic payload type above the RTCP-conflicting band.
pub const PAYLOAD_TYPE_DYNAMIC_MIN: u8 = 96;

pub const SEQUENCE_OFFSET: usize = 2;
pub const TIMESTAMP_OFFSET: usize = 4;
pub const SSRC_OFFSET: usize = 8;
