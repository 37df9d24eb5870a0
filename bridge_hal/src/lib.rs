//! # Bridge Abstraction Layer
//!
//! Collaborator traits the frame bridge is built on.
//!
//! ## Philosophy
//!
//! **The environment must be fully abstracted and swappable.**
//!
//! The channel never talks to a browser, an event loop, or a clock
//! directly. A host provides a [`Transport`] (the raw cross-context
//! messaging primitive) and a [`TimerFacility`] (a cooperative timer), and
//! the simulation crate provides deterministic versions of both for tests.
//!
//! ## Design Principles
//!
//! 1. **Best effort**: Posting never reports delivery
//! 2. **Callback driven**: Inbound messages arrive one at a time through a
//!    registered handler
//! 3. **Single threaded**: Handlers and timer callbacks are not `Send`

pub mod timer;
pub mod transport;

pub use timer::{TimerCallback, TimerFacility, TimerId};
pub use transport::{InboundHandler, InboundMessage, Listening, Transport};
