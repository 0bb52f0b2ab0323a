use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::CallSummary;
use crate::dissect::ProtocolId;
use crate::packet::{Packet, ProtoRecord};

use super::dialog::Call;

/// Filters applied when a SIP message would open a new dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Maximum number of dialogs kept.
    pub limit: Option<usize>,
    /// Only open dialogs from requests.
    pub only_requests: bool,
    /// Enable X-Call-ID cross-leg lookups.
    pub x_call_id: bool,
}

/// Message counters maintained by the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub messages: u64,
    pub retransmissions: u64,
    pub dropped_limit: u64,
    pub dropped_incomplete: u64,
}

/// Location of a message: call index and message index in the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub call: usize,
    pub message: usize,
}

/// Arena of dialogs indexed by Call-ID.
///
/// Calls are never removed or reordered, so a call index stays valid for
/// the registry's lifetime.
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: Vec<Call>,
    by_call_id: HashMap<String, usize>,
    by_x_call_id: HashMap<String, Vec<usize>>,
    options: RegistryOptions,
    stats: RegistryStats,
    limit_warned: bool,
}

impl CallRegistry {
    pub fn new(options: RegistryOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    /// Attach the SIP message carried by `packet` to its dialog.
    ///
    /// Returns `None` when the packet has no SIP record or the message was
    /// filtered out.
    pub fn process_packet(&mut self, mut packet: Packet) -> Option<MessageRef> {
        let packet_type = packet.packet_type();
        let Some(ProtoRecord::Sip(payload)) = packet.take_record(ProtocolId::Sip) else {
            return None;
        };

        let call = match self.by_call_id.get(&payload.call_id) {
            Some(&index) => index,
            None => {
                if self.options.only_requests && !payload.is_request() {
                    debug!(call_id = %payload.call_id, "ignoring dialog started by a response");
                    self.stats.dropped_incomplete += 1;
                    return None;
                }
                if self
                    .options
                    .limit
                    .is_some_and(|limit| self.calls.len() >= limit)
                {
                    if !self.limit_warned {
                        warn!(
                            limit = self.calls.len(),
                            "call limit reached, new dialogs are dropped"
                        );
                        self.limit_warned = true;
                    }
                    self.stats.dropped_limit += 1;
                    return None;
                }
                self.insert_call(payload.call_id.clone(), payload.x_call_id().map(str::to_string))
            }
        };

        let message = self.calls[call].add_message(*payload, packet, packet_type);
        self.stats.messages += 1;
        if self.calls[call].messages()[message].is_retransmission() {
            self.stats.retransmissions += 1;
        }
        Some(MessageRef { call, message })
    }

    fn insert_call(&mut self, call_id: String, x_call_id: Option<String>) -> usize {
        let index = self.calls.len();
        debug!(index, call_id = %call_id, x_call_id = ?x_call_id, "call created");
        if let Some(x_call_id) = &x_call_id {
            self.by_x_call_id
                .entry(x_call_id.clone())
                .or_default()
                .push(index);
        }
        self.by_call_id.insert(call_id.clone(), index);
        self.calls.push(Call::new(index, call_id, x_call_id));
        index
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn call(&self, index: usize) -> Option<&Call> {
        self.calls.get(index)
    }

    pub(crate) fn call_mut(&mut self, index: usize) -> Option<&mut Call> {
        self.calls.get_mut(index)
    }

    pub fn find(&self, call_id: &str) -> Option<&Call> {
        self.by_call_id.get(call_id).map(|&index| &self.calls[index])
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn active_calls(&self) -> impl DoubleEndedIterator<Item = &Call> {
        self.calls.iter().filter(|call| call.is_active())
    }

    /// Other legs of the same session linked through X-Call-ID.
    pub fn related_calls(&self, index: usize) -> Vec<&Call> {
        if !self.options.x_call_id {
            return Vec::new();
        }
        let Some(call) = self.calls.get(index) else {
            return Vec::new();
        };
        let mut related: Vec<usize> = self
            .by_x_call_id
            .get(call.call_id())
            .cloned()
            .unwrap_or_default();
        if let Some(&parent) = call.x_call_id().and_then(|x| self.by_call_id.get(x)) {
            related.push(parent);
        }
        related.sort_unstable();
        related.dedup();
        related
            .into_iter()
            .filter(|&other| other != index)
            .map(|other| &self.calls[other])
            .collect()
    }

    /// Owned summaries of every call, for readers outside the lock.
    pub fn snapshot(&self) -> Vec<CallSummary> {
        self.calls.iter().map(CallSummary::from_call).collect()
    }
}
