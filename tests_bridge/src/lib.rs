//! Bridge Test Utilities
//!
//! Shared helpers for the channel integration tests.
//!
//! ## Test Philosophy
//!
//! - **Deterministic delivery**: Nothing moves until a test settles the bus
//!   or advances the clock
//! - **Observe the wire**: Assertions look at what was actually posted, not
//!   just at channel state
//! - **Faults are explicit**: Lost, duplicated and reordered posts come from
//!   a FaultPlan, never from chance

use bridge_envelope::{Frame, WireEnvelope};
use bridge_sim::{SimEndpoint, SimTimer, SimWorld};
use bridge_types::{ContextId, MessageId};
use frame_bridge::{Channel, IncomingEnvelope};
use std::cell::RefCell;
use std::rc::Rc;

pub const PAGE_ORIGIN: &str = "https://page.example";
pub const FRAME_ORIGIN: &str = "https://frame.example";

pub type SimChannel = Channel<SimEndpoint, SimTimer>;

/// Two contexts on one world, before any channel exists
pub struct Contexts {
    pub page: SimEndpoint,
    pub frame: SimEndpoint,
}

impl Contexts {
    pub fn open(world: &SimWorld) -> Self {
        Self {
            page: world.open(PAGE_ORIGIN),
            frame: world.open(FRAME_ORIGIN),
        }
    }

    pub fn page_ctx(&self) -> ContextId {
        self.page.context()
    }

    pub fn frame_ctx(&self) -> ContextId {
        self.frame.context()
    }

    /// Channel living in the page, talking to the frame
    pub fn page_channel(&self, world: &SimWorld) -> SimChannel {
        Channel::new(
            self.page.clone(),
            world.timer.clone(),
            self.frame_ctx(),
            FRAME_ORIGIN,
        )
    }

    /// Channel living in the frame, talking to the page
    pub fn frame_channel(&self, world: &SimWorld) -> SimChannel {
        Channel::new(
            self.frame.clone(),
            world.timer.clone(),
            self.page_ctx(),
            PAGE_ORIGIN,
        )
    }
}

/// A connected page/frame channel pair, handshake not yet delivered
pub struct BridgePair {
    pub world: SimWorld,
    pub contexts: Contexts,
    pub page: SimChannel,
    pub frame: SimChannel,
}

impl BridgePair {
    pub fn new() -> Self {
        Self::in_world(SimWorld::new())
    }

    pub fn in_world(world: SimWorld) -> Self {
        let contexts = Contexts::open(&world);
        let page = contexts.page_channel(&world);
        let frame = contexts.frame_channel(&world);
        Self {
            world,
            contexts,
            page,
            frame,
        }
    }

    /// A pair whose handshake has already completed
    pub fn established() -> Self {
        let pair = Self::new();
        pair.world.settle();
        assert!(pair.page.is_handshaken() && pair.frame.is_handshaken());
        pair
    }
}

impl Default for BridgePair {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects every message a channel's handler sees
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Rc<RefCell<Vec<IncomingEnvelope>>>,
}

impl Recorder {
    /// Installs a recording handler on `channel`
    pub fn attach(channel: &SimChannel) -> Self {
        let recorder = Self::default();
        let seen = recorder.seen.clone();
        channel.set_on_message(move |incoming| seen.borrow_mut().push(incoming));
        recorder
    }

    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }

    pub fn take(&self) -> Vec<IncomingEnvelope> {
        std::mem::take(&mut *self.seen.borrow_mut())
    }

    pub fn ids(&self) -> Vec<MessageId> {
        self.seen.borrow().iter().map(IncomingEnvelope::id).collect()
    }
}

/// Every frame posted by `source`, decoded, in posting order
pub fn frames_posted_by(world: &SimWorld, source: ContextId) -> Vec<Frame> {
    world
        .bus
        .posted_by(source)
        .iter()
        .map(|post| WireEnvelope::decode_lenient(&post.payload).into_frame())
        .collect()
}

/// Ids of the data frames posted by `source`, in posting order
pub fn data_ids_posted_by(world: &SimWorld, source: ContextId) -> Vec<MessageId> {
    frames_posted_by(world, source)
        .into_iter()
        .filter_map(|frame| match frame {
            Frame::Data(data) => Some(data.id),
            _ => None,
        })
        .collect()
}

/// Number of handshake frames of each kind posted by `source`
pub fn handshakes_posted_by(world: &SimWorld, source: ContextId) -> (usize, usize) {
    frames_posted_by(world, source)
        .iter()
        .fold((0, 0), |(requests, confirmations), frame| match frame {
            Frame::HandshakeRequest => (requests + 1, confirmations),
            Frame::HandshakeConfirmation => (requests, confirmations + 1),
            _ => (requests, confirmations),
        })
}
