//! # Cross-Context Transport
//!
//! Abstraction of a one-way, fire-and-forget messaging primitive between
//! window-like contexts.
//!
//! ## Contract
//!
//! - `post` is best effort. It never blocks and never confirms delivery.
//! - Messages from one sender usually arrive in posting order, but nothing
//!   here promises it.
//! - The environment serialises delivery: registered handlers are invoked
//!   once per inbound message, never concurrently.
//! - A post whose `target_origin` does not match the target context's
//!   origin (and is not `*`) is discarded by the environment.

use bridge_types::ContextId;

/// One raw message as delivered by the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Serialized payload, exactly as posted
    pub payload: String,
    /// Context that posted the message, if the environment knows it
    pub source: Option<ContextId>,
    /// Origin of the posting context
    pub origin: String,
}

impl InboundMessage {
    /// Creates an inbound message
    pub fn new(
        payload: impl Into<String>,
        source: Option<ContextId>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            source,
            origin: origin.into(),
        }
    }
}

/// What a handler wants once it has seen a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listening {
    /// Keep delivering to this handler
    Continue,
    /// Unregister this handler; it is never called again
    Stop,
}

/// Handler invoked once per inbound message
pub type InboundHandler = Box<dyn FnMut(InboundMessage) -> Listening>;

/// The raw send/receive primitive a channel is layered on
pub trait Transport {
    /// Posts a serialized payload to `target`
    ///
    /// `target_origin` restricts delivery to a target whose origin matches,
    /// or `*` for any origin.
    fn post(&self, target: &ContextId, target_origin: &str, payload: String);

    /// Registers a handler for messages delivered to this context
    ///
    /// The handler stays registered until it returns [`Listening::Stop`].
    fn on_receive(&self, handler: InboundHandler);
}
