//! SIP dialog correlation.
//!
//! Dissected SIP messages are grouped into [`Call`]s by Call-ID inside a
//! [`CallRegistry`]. INVITE dialogs run a small state machine
//! ([`CallState`]) used for media attribution and duration reporting.

mod attribute;
mod dialog;
mod message;
mod registry;
mod state;

pub use attribute::{AttributeId, AttributeSet, format_date, format_duration, format_time};
pub use dialog::Call;
pub use message::SipMessage;
pub use registry::{CallRegistry, MessageRef, RegistryOptions, RegistryStats};
pub use state::{CallState, next_state};
