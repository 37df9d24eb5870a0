//! # Bridge Host
//!
//! A host for running scripted frame bridge sessions.
//!
//! ## Philosophy
//!
//! - **Simulation first**: Both contexts live on one deterministic bus
//! - **Scripts, not stdin**: Scenarios are plain text, replayable exactly
//! - **Report, don't print**: The runtime returns a report; the binary
//!   decides how to show it

pub mod runtime;
pub mod script;

pub use runtime::{
    BridgeRuntime, BridgeRuntimeConfig, BridgeRuntimeError, RunReport, SendOutcome, SendRecord,
};
pub use script::{BridgeScript, ScriptError, ScriptStep};
