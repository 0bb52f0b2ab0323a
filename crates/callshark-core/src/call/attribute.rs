use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::packet::Timestamp;

/// Named attribute exposed by messages and calls.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AttributeId {
    Method,
    From,
    FromUser,
    To,
    ToUser,
    CallId,
    XCallId,
    Src,
    Dst,
    Date,
    Time,
    Transport,
    CSeq,
    UserAgent,
    Reason,
    Warning,
    MsgCount,
    State,
    ConvDur,
    TotalDur,
}

impl AttributeId {
    /// Attributes carried by every SIP message.
    pub const MESSAGE: [AttributeId; 16] = [
        AttributeId::Method,
        AttributeId::From,
        AttributeId::FromUser,
        AttributeId::To,
        AttributeId::ToUser,
        AttributeId::CallId,
        AttributeId::XCallId,
        AttributeId::Src,
        AttributeId::Dst,
        AttributeId::Date,
        AttributeId::Time,
        AttributeId::Transport,
        AttributeId::CSeq,
        AttributeId::UserAgent,
        AttributeId::Reason,
        AttributeId::Warning,
    ];

    /// Attributes derived from the whole dialog.
    pub const CALL: [AttributeId; 4] = [
        AttributeId::MsgCount,
        AttributeId::State,
        AttributeId::ConvDur,
        AttributeId::TotalDur,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AttributeId::Method => "method",
            AttributeId::From => "sipfrom",
            AttributeId::FromUser => "sipfromuser",
            AttributeId::To => "sipto",
            AttributeId::ToUser => "siptouser",
            AttributeId::CallId => "callid",
            AttributeId::XCallId => "xcallid",
            AttributeId::Src => "src",
            AttributeId::Dst => "dst",
            AttributeId::Date => "date",
            AttributeId::Time => "time",
            AttributeId::Transport => "transport",
            AttributeId::CSeq => "cseq",
            AttributeId::UserAgent => "useragent",
            AttributeId::Reason => "reason",
            AttributeId::Warning => "warning",
            AttributeId::MsgCount => "msgcnt",
            AttributeId::State => "state",
            AttributeId::ConvDur => "convdur",
            AttributeId::TotalDur => "totaldur",
        }
    }

    /// Column title.
    pub fn title(&self) -> &'static str {
        match self {
            AttributeId::Method => "Method",
            AttributeId::From => "SIP From",
            AttributeId::FromUser => "SIP From User",
            AttributeId::To => "SIP To",
            AttributeId::ToUser => "SIP To User",
            AttributeId::CallId => "Call-ID",
            AttributeId::XCallId => "X-Call-ID",
            AttributeId::Src => "Source",
            AttributeId::Dst => "Destination",
            AttributeId::Date => "Date",
            AttributeId::Time => "Time",
            AttributeId::Transport => "Transport",
            AttributeId::CSeq => "CSeq",
            AttributeId::UserAgent => "User-Agent",
            AttributeId::Reason => "Reason Text",
            AttributeId::Warning => "Warning",
            AttributeId::MsgCount => "Msgs",
            AttributeId::State => "Call State",
            AttributeId::ConvDur => "Conversation Duration",
            AttributeId::TotalDur => "Total Duration",
        }
    }

    pub fn from_name(name: &str) -> Option<AttributeId> {
        Self::MESSAGE
            .into_iter()
            .chain(Self::CALL)
            .find(|id| id.name() == name)
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered attribute values, set once when a message is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    values: Vec<(AttributeId, String)>,
}

impl AttributeSet {
    pub(crate) fn set(&mut self, id: AttributeId, value: impl Into<String>) {
        let value = value.into();
        match self.values.binary_search_by_key(&id, |(key, _)| *key) {
            Ok(pos) => self.values[pos].1 = value,
            Err(pos) => self.values.insert(pos, (id, value)),
        }
    }

    pub fn get(&self, id: AttributeId) -> Option<&str> {
        self.values
            .binary_search_by_key(&id, |(key, _)| *key)
            .ok()
            .map(|pos| self.values[pos].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeId, &str)> {
        self.values.iter().map(|(id, value)| (*id, value.as_str()))
    }
}

/// `YYYY/MM/DD` in UTC.
pub fn format_date(ts: Timestamp) -> Option<String> {
    let dt = time::OffsetDateTime::from_unix_timestamp(ts.sec).ok()?;
    Some(format!(
        "{:04}/{:02}/{:02}",
        dt.year(),
        u8::from(dt.month()),
        dt.day()
    ))
}

/// `HH:MM:SS.uuuuuu` in UTC.
pub fn format_time(ts: Timestamp) -> Option<String> {
    let dt = time::OffsetDateTime::from_unix_timestamp(ts.sec).ok()?;
    Some(format!(
        "{:02}:{:02}:{:02}.{:06}",
        dt.hour(),
        dt.minute(),
        dt.second(),
        ts.usec
    ))
}

/// `MM:SS`, or `H:MM:SS` past one hour.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
