pub const MIN_HEADER_LEN: usize = 2;
pub const FIN_MASK: u8 = 0x80;
pub const RSV_MASK: u8 = 0x70;
pub const OPCODE_MASK: u8 = 0x0f;
pub const MASKED_MASK: u8 = 0x80;
pub const LEN7_MASK: u8 = 0x7f;
pub const LEN_EXT16: u8 = 126;
pub const LEN_EXT64: u8 = 127;
pub const MASKING_KEY_LEN: usize = 4;

pub const OPCODE_CONTINUATION: u8 = 0x0;
pub const OPCODE_TEXT: u8 = 0x1;
pub const OPCODE_BINARY: u8 = 0x2;
pub const OPCODE_CLOSE: u8 = 0x8;
pub const OPCODE_PING: u8 = 0x9;
pub const OPCODE_PONG: u8 = 0xa;
