use std::io::{Read, Seek, SeekFrom};

use super::error::PcapSourceError;
use super::layout;
use crate::packet::Timestamp;

/// Capture interface described by a PCAPNG interface description block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interface {
    pub linktype: i32,
    pub tsresol: u8,
}

impl Default for Interface {
    fn default() -> Self {
        Self {
            linktype: layout::LINKTYPE_ETHERNET,
            tsresol: layout::DEFAULT_TSRESOL,
        }
    }
}

/// Read the magic bytes and rewind the reader to the start.
///
/// # Errors
/// Returns `PcapSourceError` when the reader cannot be read or rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], PcapSourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    magic == &layout::PCAPNG_MAGIC
}

/// Interface for a given id, defaulting to Ethernet with microsecond
/// timestamps when the block was never seen.
pub fn interface_for_id(interfaces: &[Interface], if_id: u32) -> Interface {
    interfaces
        .get(if_id as usize)
        .copied()
        .unwrap_or_default()
}

/// Timestamp of a legacy pcap record; `nanos` selects the nanosecond
/// magic variant.
pub fn legacy_timestamp(ts_sec: u32, ts_frac: u32, nanos: bool) -> Timestamp {
    let usec = if nanos { ts_frac / 1_000 } else { ts_frac };
    Timestamp::new(i64::from(ts_sec), usec)
}

/// Convert a PCAPNG high/low timestamp using the interface resolution.
pub fn pcapng_timestamp(ts_high: u32, ts_low: u32, tsresol: u8) -> Timestamp {
    let raw = (u128::from(ts_high) << 32) | u128::from(ts_low);
    let exponent = u32::from(tsresol & !layout::TSRESOL_POW2_FLAG);
    let units_per_sec: u128 = if tsresol & layout::TSRESOL_POW2_FLAG != 0 {
        1u128.checked_shl(exponent).unwrap_or(1)
    } else {
        10u128.checked_pow(exponent).unwrap_or(1)
    };
    let sec = raw / units_per_sec;
    let usec = (raw % units_per_sec) * 1_000_000 / units_per_sec;
    Timestamp::new(sec as i64, usec as u32)
}
