//! Outbound queue for envelopes awaiting the handshake.
//!
//! Unbounded FIFO. Entries leave only by being popped for transmission.

use bridge_envelope::OutgoingEnvelope;
use bridge_types::MessageId;
use std::collections::VecDeque;

/// An envelope together with its serialized form
#[derive(Debug, Clone)]
pub(crate) struct QueuedEnvelope {
    pub(crate) envelope: OutgoingEnvelope,
    pub(crate) wire: String,
}

#[derive(Debug, Default)]
pub(crate) struct OutboundQueue {
    entries: VecDeque<QueuedEnvelope>,
}

impl OutboundQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, entry: QueuedEnvelope) {
        self.entries.push_back(entry);
    }

    pub(crate) fn pop(&mut self) -> Option<QueuedEnvelope> {
        self.entries.pop_front()
    }

    /// Ids of queued envelopes, oldest first
    pub(crate) fn ids(&self) -> Vec<MessageId> {
        self.entries.iter().map(|entry| entry.envelope.id).collect()
    }
}
