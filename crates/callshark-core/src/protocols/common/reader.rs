use std::ops::Range;

use thiserror::Error;

/// Out-of-bounds read reported by [`ByteReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("payload too short: need {needed} bytes, got {actual}")]
pub struct ReadError {
    pub needed: usize,
    pub actual: usize,
}

/// Bounds-checked big-endian access to a protocol payload.
///
/// Every accessor returns `ReadError` instead of panicking, so parsers can
/// run on truncated or hostile input.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    payload: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), ReadError> {
        if self.payload.len() < needed {
            return Err(ReadError {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, ReadError> {
        self.payload.get(offset).copied().ok_or(ReadError {
            needed: offset + 1,
            actual: self.payload.len(),
        })
    }

    pub fn read_u16_be(&self, offset: usize) -> Result<u16, ReadError> {
        let bytes = self.read_slice(offset..offset + 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u16_le(&self, offset: usize) -> Result<u16, ReadError> {
        let bytes = self.read_slice(offset..offset + 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_be(&self, offset: usize) -> Result<u32, ReadError> {
        let bytes = self.read_slice(offset..offset + 4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64_be(&self, offset: usize) -> Result<u64, ReadError> {
        let bytes = self.read_slice(offset..offset + 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], ReadError> {
        self.payload.get(range.clone()).ok_or(ReadError {
            needed: range.end,
            actual: self.payload.len(),
        })
    }

    pub fn rest(&self, offset: usize) -> Result<&'a [u8], ReadError> {
        self.payload.get(offset..).ok_or(ReadError {
            needed: offset,
            actual: self.payload.len(),
        })
    }
}
