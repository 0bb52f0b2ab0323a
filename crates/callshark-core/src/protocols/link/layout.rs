// Datalink identifiers (LINKTYPE_* values stored in capture headers).
pub const DLT_NULL: i32 = 0;
pub const DLT_EN10MB: i32 = 1;
pub const DLT_RAW_BSD: i32 = 12;
pub const DLT_RAW_OPENBSD: i32 = 14;
pub const DLT_RAW: i32 = 101;
pub const DLT_LOOP: i32 = 108;
pub const DLT_LINUX_SLL: i32 = 113;
pub const DLT_IPV4: i32 = 228;
pub const DLT_IPV6: i32 = 229;
pub const DLT_NFLOG: i32 = 239;
pub const DLT_LINUX_SLL2: i32 = 276;

pub const ETHER_HEADER_LEN: usize = 14;
pub const ETHER_TYPE_OFFSET: usize = 12;
pub const VLAN_TAG_LEN: usize = 4;
pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_IPV6: u16 = 0x86dd;
pub const ETHERTYPE_VLAN: u16 = 0x8100;
pub const ETHERTYPE_QINQ: u16 = 0x88a8;

pub const SLL_HEADER_LEN: usize = 16;
pub const SLL_PROTOCOL_OFFSET: usize = 14;
pub const SLL2_HEADER_LEN: usize = 20;
pub const SLL2_PROTOCOL_OFFSET: usize = 0;

pub const LOOPBACK_HEADER_LEN: usize = 4;

pub const NFLOG_HEADER_LEN: usize = 4;
pub const NFLOG_TLV_HEADER_LEN: usize = 4;
pub const NFULA_PAYLOAD: u16 = 9;
