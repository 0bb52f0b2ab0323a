use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocols::sip::SipMethod;

/// Dialog state, tracked only for INVITE-initiated calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    CallSetup,
    InCall,
    Completed,
    Cancelled,
    Rejected,
    Busy,
    Diverted,
}

impl CallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::CallSetup => "CALL SETUP",
            CallState::InCall => "IN CALL",
            CallState::Completed => "COMPLETED",
            CallState::Cancelled => "CANCELLED",
            CallState::Rejected => "REJECTED",
            CallState::Busy => "BUSY",
            CallState::Diverted => "DIVERTED",
        }
    }

    /// States that never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::Completed | CallState::Cancelled | CallState::Rejected
        )
    }

    /// Whether RTP may still be attributed to the call.
    pub fn is_active(&self) -> bool {
        matches!(self, CallState::CallSetup | CallState::InCall)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next state after a request (`method`) or response (`status`).
///
/// Returns `None` when the state does not change.
pub fn next_state(
    current: Option<CallState>,
    method: Option<&SipMethod>,
    status: Option<u16>,
) -> Option<CallState> {
    let is_invite = method == Some(&SipMethod::Invite);
    match current {
        None => is_invite.then_some(CallState::CallSetup),
        Some(state) if state.is_terminal() => None,
        Some(CallState::CallSetup) => match (method, status) {
            (Some(SipMethod::Cancel), _) => Some(CallState::Cancelled),
            (_, Some(200)) => Some(CallState::InCall),
            (_, Some(480 | 486 | 600)) => Some(CallState::Busy),
            // Authentication challenges keep the dialog in setup.
            (_, Some(401 | 407)) => None,
            (_, Some(code)) if code > 400 => Some(CallState::Rejected),
            (_, Some(code)) if code > 300 => Some(CallState::Diverted),
            _ => None,
        },
        Some(CallState::InCall) => {
            (method == Some(&SipMethod::Bye)).then_some(CallState::Completed)
        }
        Some(CallState::Busy | CallState::Diverted) => {
            is_invite.then_some(CallState::CallSetup)
        }
        Some(_) => None,
    }
}
