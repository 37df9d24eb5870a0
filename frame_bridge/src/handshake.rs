//! Handshake state machine
//!
//! ```text
//! Uninitialized --construct--> Pending --request/confirmation--> Established
//! ```
//!
//! `Established` is terminal. Only the first inbound handshake frame moves
//! the machine; every later one is absorbed without effect.

use bridge_envelope::HandshakeKind;

/// Where a channel is in its handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Not yet announced to the remote
    Uninitialized,
    /// Handshake request sent, waiting for the remote
    Pending,
    /// Both sides known to be listening
    Established,
}

impl HandshakeState {
    pub fn is_established(&self) -> bool {
        matches!(self, HandshakeState::Established)
    }
}

/// What the channel must do after an inbound handshake frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeStep {
    /// This frame completed the handshake
    pub established: bool,
    /// A confirmation must be posted back
    pub reply_confirmation: bool,
}

impl HandshakeStep {
    const ABSORBED: HandshakeStep = HandshakeStep {
        established: false,
        reply_confirmation: false,
    };
}

#[derive(Debug, Clone)]
pub(crate) struct Handshake {
    state: HandshakeState,
}

impl Handshake {
    pub(crate) fn new() -> Self {
        Self {
            state: HandshakeState::Uninitialized,
        }
    }

    pub(crate) fn state(&self) -> HandshakeState {
        self.state
    }

    /// Records that our handshake request is going out
    ///
    /// Returns false if the request should not be sent because the machine
    /// already left `Uninitialized`.
    pub(crate) fn begin(&mut self) -> bool {
        if self.state != HandshakeState::Uninitialized {
            return false;
        }
        self.state = HandshakeState::Pending;
        true
    }

    /// Feeds an accepted inbound handshake frame
    pub(crate) fn receive(&mut self, kind: HandshakeKind) -> HandshakeStep {
        if self.state.is_established() {
            return HandshakeStep::ABSORBED;
        }
        self.state = HandshakeState::Established;
        HandshakeStep {
            established: true,
            reply_confirmation: kind == HandshakeKind::Request,
        }
    }
}
