pub const RECORD_HEADER_LEN: usize = 5;
pub const CONTENT_TYPE_OFFSET: usize = 0;
pub const VERSION_OFFSET: usize = 1;
pub const LENGTH_OFFSET: usize = 3;

pub const CONTENT_CHANGE_CIPHER_SPEC: u8 = 20;
pub const CONTENT_ALERT: u8 = 21;
pub const CONTENT_HANDSHAKE: u8 = 22;
pub const CONTENT_APPLICATION_DATA: u8 = 23;

pub const VERSION_MAJOR: u8 = 3;
pub const MAX_VERSION_MINOR: u8 = 4;
/// 2^14 plus the largest expansion allowed for ciphertext records.
pub const MAX_RECORD_LEN: u16 = 16384 + 2048;
