//! # Bridge Envelopes
//!
//! This crate defines the wire format of the frame bridge.
//!
//! ## Philosophy
//!
//! - **Tagged, not ambient**: Every frame carries a protocol tag so traffic
//!   from unrelated libraries sharing the transport can be told apart
//! - **Lenient in, strict out**: Inbound payloads never produce errors, only
//!   frames the channel can ignore. Outbound frames always carry the full
//!   field set
//! - **Traceable**: Data frames carry an id and an optional response id for
//!   request/response matching
//!
//! ## Architecture
//!
//! A serialized frame is one of:
//! - A handshake request (`handshake: true`)
//! - A handshake confirmation (`handshakeConfirmation: true`)
//! - A data message (`id`, `responseToId`, `namespace`, `data`)
//!
//! Inbound text is decoded into a [`WireEnvelope`] and then classified into
//! a [`Frame`]. Outbound data is built as an [`OutgoingEnvelope`].

pub mod frame;
pub mod outgoing;

pub use frame::{encode_handshake, DataFrame, Frame, HandshakeKind, WireEnvelope};
pub use outgoing::OutgoingEnvelope;

/// Protocol tag written into the `type` field when none is configured
pub const DEFAULT_PROTOCOL_TAG: &str = "frame-bridge/1";
