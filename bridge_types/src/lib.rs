//! # Bridge Types
//!
//! Fundamental types shared by every crate in the frame bridge.
//!
//! ## Philosophy
//!
//! - **Identities are opaque**: A context is named by a [`ContextId`], never
//!   by a raw pointer or handle that could be confused with another resource.
//! - **Origins are explicit**: The wildcard is a variant, not a magic string
//!   scattered through the code.
//! - **Time is virtual**: [`Duration`] and [`Instant`] are millisecond values
//!   handed out by a timer facility, so tests control the clock.
//!
//! ## Key Types
//!
//! - [`ContextId`]: Identity of a window-like execution context
//! - [`MessageId`]: Channel-scoped envelope identifier
//! - [`RemoteOrigin`]: Accepted origin or the `*` wildcard
//! - [`Duration`], [`Instant`]: Millisecond time values

pub mod ids;
pub mod origin;
pub mod time;

pub use ids::{ContextId, MessageId};
pub use origin::{RemoteOrigin, WILDCARD_ORIGIN};
pub use time::{Duration, Instant};
