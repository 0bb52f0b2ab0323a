use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Capture timestamp with microsecond resolution.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub sec: i64,
    pub usec: u32,
}

impl Timestamp {
    pub fn new(sec: i64, usec: u32) -> Self {
        Self {
            sec: sec + i64::from(usec / 1_000_000),
            usec: usec % 1_000_000,
        }
    }

    pub fn from_micros(micros: i64) -> Self {
        Self {
            sec: micros.div_euclid(1_000_000),
            usec: micros.rem_euclid(1_000_000) as u32,
        }
    }

    pub fn as_micros(&self) -> i64 {
        self.sec * 1_000_000 + i64::from(self.usec)
    }

    /// Elapsed time since `earlier`, saturating at zero for reordered input.
    pub fn duration_since(&self, earlier: Timestamp) -> Duration {
        let delta = self.as_micros() - earlier.as_micros();
        if delta <= 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(delta as u64)
        }
    }

    pub fn to_rfc3339(&self) -> Option<String> {
        let nanos = i128::from(self.as_micros()) * 1_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|dt| dt.format(&Rfc3339).ok())
    }
}

/// One raw capture unit as delivered by the capture source.
///
/// Frames are immutable once built; a [`Packet`](super::Packet) owns one or
/// more of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    ts: Timestamp,
    caplen: u32,
    len: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(ts: Timestamp, caplen: u32, len: u32, data: Vec<u8>) -> Self {
        Self {
            ts,
            caplen,
            len,
            data,
        }
    }

    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    /// Number of bytes actually captured.
    pub fn caplen(&self) -> u32 {
        self.caplen
    }

    /// Length of the frame on the wire.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Transport endpoint (address and port).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub addr: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(addr: IpAddr, port: u16) -> Self {
        Self { addr, port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.addr {
            IpAddr::V4(addr) => write!(f, "{}:{}", addr, self.port),
            IpAddr::V6(addr) => write!(f, "[{}]:{}", addr, self.port),
        }
    }
}
