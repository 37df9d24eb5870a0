//! Simulated cross-context message bus.
//!
//! Models a window-like environment where each context has an origin and
//! any context can post a string to any other. Posts are held in flight
//! until the test delivers them, in FIFO order, which makes interleavings
//! reproducible.
//!
//! Delivery follows the usual cross-window rules: a post is discarded if
//! its target origin is neither `*` nor the target context's origin, and a
//! post to a context nobody is listening on simply vanishes. A handler that
//! answers [`Listening::Stop`] is unregistered after that delivery.

use crate::fault_injection::{FaultInjector, FaultPlan, PostDecision};
use bridge_hal::{InboundHandler, InboundMessage, Listening, Transport};
use bridge_types::{ContextId, WILDCARD_ORIGIN};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{trace, warn};

/// Upper bound on deliveries in one `deliver_all` call
const MAX_DRAIN_STEPS: usize = 100_000;

/// A post as issued by an endpoint, before any fault was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posted {
    pub source: ContextId,
    pub target: ContextId,
    pub target_origin: String,
    pub payload: String,
}

/// Result of delivering one in-flight message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handed to this many handlers (zero if nobody listens yet)
    Delivered { handlers: usize },
    /// Target context does not exist
    UnknownTarget,
    /// Target origin filter did not match the target context
    OriginMismatch,
}

#[derive(Debug, Clone)]
struct InFlight {
    target: ContextId,
    target_origin: String,
    message: InboundMessage,
}

struct ContextEntry {
    origin: String,
    handlers: Vec<InboundHandler>,
}

#[derive(Default)]
struct BusState {
    contexts: HashMap<ContextId, ContextEntry>,
    in_flight: VecDeque<InFlight>,
    posted: Vec<Posted>,
    injector: FaultInjector,
}

/// In-memory bus connecting simulated contexts
///
/// Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct SimBus {
    state: Rc<RefCell<BusState>>,
}

impl SimBus {
    /// Creates an empty bus with no faults
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus that applies `plan` to every post
    pub fn with_fault_plan(plan: FaultPlan) -> Self {
        let bus = Self::new();
        bus.state.borrow_mut().injector = FaultInjector::new(plan);
        bus
    }

    /// Registers a new context with the given origin
    pub fn open_context(&self, origin: impl Into<String>) -> SimEndpoint {
        let context = ContextId::new();
        self.state.borrow_mut().contexts.insert(
            context,
            ContextEntry {
                origin: origin.into(),
                handlers: Vec::new(),
            },
        );
        SimEndpoint {
            bus: self.clone(),
            context,
        }
    }

    /// Queues a raw message for `target`, bypassing endpoints and faults
    ///
    /// Lets tests forge traffic from unknown sources or foreign origins.
    pub fn inject(&self, target: ContextId, message: InboundMessage) {
        self.state.borrow_mut().in_flight.push_back(InFlight {
            target,
            target_origin: WILDCARD_ORIGIN.to_string(),
            message,
        });
    }

    /// Number of messages waiting for delivery
    pub fn in_flight(&self) -> usize {
        self.state.borrow().in_flight.len()
    }

    /// Every post issued through an endpoint, in posting order
    pub fn posted(&self) -> Vec<Posted> {
        self.state.borrow().posted.clone()
    }

    /// Posts issued by `source`, in posting order
    pub fn posted_by(&self, source: ContextId) -> Vec<Posted> {
        self.state
            .borrow()
            .posted
            .iter()
            .filter(|post| post.source == source)
            .cloned()
            .collect()
    }

    /// Delivers the oldest in-flight message
    ///
    /// Returns `None` if nothing is in flight.
    pub fn deliver_next(&self) -> Option<DeliveryOutcome> {
        let (flight, mut handlers) = {
            let mut state = self.state.borrow_mut();
            let flight = state.in_flight.pop_front()?;
            let entry = match state.contexts.get_mut(&flight.target) {
                Some(entry) => entry,
                None => {
                    trace!(target_context = %flight.target, "dropping post to unknown context");
                    return Some(DeliveryOutcome::UnknownTarget);
                }
            };
            if flight.target_origin != WILDCARD_ORIGIN && flight.target_origin != entry.origin {
                trace!(
                    target_context = %flight.target,
                    target_origin = %flight.target_origin,
                    "dropping post with mismatched target origin"
                );
                return Some(DeliveryOutcome::OriginMismatch);
            }
            let handlers = std::mem::take(&mut entry.handlers);
            (flight, handlers)
        };

        // Borrow released: handlers post replies and register handlers.
        let count = handlers.len();
        handlers.retain_mut(|handler| handler(flight.message.clone()) == Listening::Continue);

        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.contexts.get_mut(&flight.target) {
            handlers.append(&mut entry.handlers);
            entry.handlers = handlers;
        }
        Some(DeliveryOutcome::Delivered { handlers: count })
    }

    /// Delivers until nothing is in flight, including replies posted while
    /// draining
    ///
    /// Reordering faults are applied once before draining. Returns the
    /// number of messages taken off the bus.
    pub fn deliver_all(&self) -> usize {
        {
            let mut state = self.state.borrow_mut();
            let BusState {
                injector,
                in_flight,
                ..
            } = &mut *state;
            injector.apply_reordering(in_flight);
        }

        let mut steps = 0;
        while self.deliver_next().is_some() {
            steps += 1;
            if steps >= MAX_DRAIN_STEPS {
                warn!(steps, "bus did not settle, giving up");
                break;
            }
        }
        steps
    }

    fn post_from(
        &self,
        source: ContextId,
        target: ContextId,
        target_origin: &str,
        payload: String,
    ) {
        let mut state = self.state.borrow_mut();
        state.posted.push(Posted {
            source,
            target,
            target_origin: target_origin.to_string(),
            payload: payload.clone(),
        });

        let origin = match state.contexts.get(&source) {
            Some(entry) => entry.origin.clone(),
            None => return,
        };
        let flight = InFlight {
            target,
            target_origin: target_origin.to_string(),
            message: InboundMessage::new(payload, Some(source), origin),
        };

        match state.injector.decide(&flight.message.payload) {
            PostDecision::Deliver => state.in_flight.push_back(flight),
            PostDecision::Duplicate => {
                state.in_flight.push_back(flight.clone());
                state.in_flight.push_back(flight);
            }
            PostDecision::Drop => {
                trace!(
                    source_context = %source,
                    target_context = %target,
                    "fault plan dropped post"
                );
            }
        }
    }

    fn register(&self, context: ContextId, handler: InboundHandler) {
        if let Some(entry) = self.state.borrow_mut().contexts.get_mut(&context) {
            entry.handlers.push(handler);
        }
    }
}

/// One context's view of the bus
#[derive(Clone)]
pub struct SimEndpoint {
    bus: SimBus,
    context: ContextId,
}

impl SimEndpoint {
    /// This endpoint's context id
    pub fn context(&self) -> ContextId {
        self.context
    }
}

impl Transport for SimEndpoint {
    fn post(&self, target: &ContextId, target_origin: &str, payload: String) {
        self.bus.post_from(self.context, *target, target_origin, payload);
    }

    fn on_receive(&self, handler: InboundHandler) {
        self.bus.register(self.context, handler);
    }
}
