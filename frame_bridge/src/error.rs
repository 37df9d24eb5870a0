//! Error types surfaced by the bridge

use bridge_types::MessageId;
use thiserror::Error;

/// Failure of a send, as seen by whoever awaits its response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// No response arrived in time
    #[error("no response to {id} within {timeout_ms}ms")]
    Timeout { id: MessageId, timeout_ms: u64 },

    /// The channel was dropped before the future settled
    #[error("channel closed")]
    Closed,

    /// The outgoing data could not be serialized
    #[error("encode error: {0}")]
    Encode(String),
}

/// Failure to load a channel configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid channel config: {0}")]
    Parse(#[from] serde_json::Error),
}
