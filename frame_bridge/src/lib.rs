//! # Frame Bridge
//!
//! A request/response channel between two browsing contexts that can only
//! exchange posted text messages.
//!
//! ## Philosophy
//!
//! - **Handshake first**: Nothing but handshake frames crosses the transport
//!   until both sides have proven they are listening
//! - **Nothing lost while waiting**: Sends made before the handshake are
//!   queued and transmitted in order afterwards
//! - **Every send gets an answer**: The returned future resolves with the
//!   matching response or fails with a timeout
//! - **Trust is explicit**: Inbound frames from any context, origin or
//!   protocol other than the configured ones are ignored
//!
//! ## Example
//!
//! ```
//! use bridge_sim::SimWorld;
//! use frame_bridge::Channel;
//! use futures::FutureExt;
//! use serde_json::json;
//!
//! let world = SimWorld::new();
//! let page = world.open("https://page.example");
//! let frame = world.open("https://frame.example");
//! let (page_ctx, frame_ctx) = (page.context(), frame.context());
//!
//! let a = Channel::new(page, world.timer.clone(), frame_ctx, "https://frame.example");
//! let b = Channel::new(frame, world.timer.clone(), page_ctx, "https://page.example");
//! b.set_on_message(|incoming| {
//!     let _ = incoming.respond(json!("pong"));
//! });
//!
//! let response = a.send(Some("demo"), json!("ping"));
//! world.settle();
//!
//! let reply = response.now_or_never().unwrap().unwrap();
//! assert_eq!(reply.data(), &json!("pong"));
//! ```

mod channel;
pub mod config;
pub mod error;
pub mod handshake;
mod incoming;
mod pending;
mod queue;
mod signal;

pub use bridge_envelope::DEFAULT_PROTOCOL_TAG;
pub use channel::{Channel, MessageHandler};
pub use config::{ChannelConfig, DEFAULT_TIMEOUT_MS};
pub use error::{ChannelError, ConfigError};
pub use handshake::{HandshakeState, HandshakeStep};
pub use incoming::IncomingEnvelope;
pub use pending::ResponseFuture;
pub use signal::HandshakeSignal;
