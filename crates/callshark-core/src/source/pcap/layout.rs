/// Section header block type, first four bytes of any PCAPNG file.
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

pub const PCAP_READER_BUFFER_SIZE: usize = 64 * 1024;

/// Default `if_tsresol`: microseconds.
pub const DEFAULT_TSRESOL: u8 = 6;

/// `if_tsresol` flag selecting a power-of-two resolution.
pub const TSRESOL_POW2_FLAG: u8 = 0x80;

pub const LINKTYPE_ETHERNET: i32 = 1;
