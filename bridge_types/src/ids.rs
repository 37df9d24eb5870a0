//! Unique identifiers for contexts and envelopes

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a window-like execution context
///
/// A page and each of its embedded frames get their own context id. The
/// transport reports the sender's context id with every inbound message,
/// and a channel accepts traffic from exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Creates a new random context ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a context ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({})", self.0)
    }
}

/// Identifier of an envelope, unique within the channel that assigned it
///
/// Ids are handed out by a channel's counter starting at 1 and are never
/// reused. On the wire they are bare integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Wraps a raw id value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for MessageId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Msg({})", self.0)
    }
}
