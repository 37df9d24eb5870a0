//! Handshake Tests
//!
//! Validates that both sides reach the established state exactly once,
//! whatever order the handshake frames arrive in.

use bridge_hal::InboundMessage;
use bridge_sim::fault_injection::{FaultPlan, MessageFault};
use bridge_sim::SimWorld;
use frame_bridge::{HandshakeState, DEFAULT_PROTOCOL_TAG};
use futures::FutureExt;
use serde_json::json;
use tests_bridge::{
    data_ids_posted_by, handshakes_posted_by, BridgePair, Contexts, Recorder, FRAME_ORIGIN,
};

#[test]
fn test_handshake_establishes_both_sides() {
    let pair = BridgePair::new();
    let page_signal = pair.page.handshake_signal();
    let frame_signal = pair.frame.handshake_signal();

    assert_eq!(pair.page.handshake_state(), HandshakeState::Pending);
    assert_eq!(pair.frame.handshake_state(), HandshakeState::Pending);
    assert!(page_signal.clone().now_or_never().is_none());

    pair.world.settle();

    assert_eq!(pair.page.handshake_state(), HandshakeState::Established);
    assert_eq!(pair.frame.handshake_state(), HandshakeState::Established);
    assert_eq!(page_signal.now_or_never(), Some(Ok(())));
    assert_eq!(frame_signal.now_or_never(), Some(Ok(())));
}

/// Test: the first side's request is lost because the other side is not
/// listening yet; the late side's request completes the handshake anyway
#[test]
fn test_late_listener() {
    let world = SimWorld::new();
    let contexts = Contexts::open(&world);

    let page = contexts.page_channel(&world);
    let _queued = page.send(Some("early"), json!("before the frame exists"));
    world.settle();
    assert!(!page.is_handshaken());
    assert_eq!(page.queued_len(), 1);

    let frame = contexts.frame_channel(&world);
    let recorder = Recorder::attach(&frame);
    world.settle();

    assert!(page.is_handshaken());
    assert!(frame.is_handshaken());
    // The page answered the frame's request and the frame needed no reply.
    assert_eq!(handshakes_posted_by(&world, contexts.page_ctx()), (1, 1));
    assert_eq!(handshakes_posted_by(&world, contexts.frame_ctx()), (1, 0));
    assert_eq!(recorder.len(), 1);
    assert_eq!(recorder.take()[0].namespace(), Some("early"));
}

/// Test: one lost handshake request is recovered by the other side's
#[test]
fn test_lost_request_is_recovered() {
    let world = SimWorld::with_fault_plan(
        FaultPlan::new().with_message_fault(MessageFault::DropNext { count: 1 }),
    );
    let pair = BridgePair::in_world(world);

    pair.world.settle();

    assert!(pair.page.is_handshaken());
    assert!(pair.frame.is_handshaken());
}

/// Test: duplicated handshake requests produce one confirmation per side
#[test]
fn test_duplicate_requests_are_idempotent() {
    let world = SimWorld::with_fault_plan(
        FaultPlan::new().with_message_fault(MessageFault::DuplicateNext { count: 2 }),
    );
    let pair = BridgePair::in_world(world);
    let recorder = Recorder::attach(&pair.frame);

    let _pending = pair.page.send(None, json!(1));
    pair.world.settle();

    assert!(pair.page.is_handshaken());
    assert!(pair.frame.is_handshaken());
    assert_eq!(handshakes_posted_by(&pair.world, pair.contexts.page_ctx()), (1, 1));
    assert_eq!(handshakes_posted_by(&pair.world, pair.contexts.frame_ctx()), (1, 1));
    // The queue was flushed exactly once.
    assert_eq!(
        data_ids_posted_by(&pair.world, pair.contexts.page_ctx()).len(),
        1
    );
    assert_eq!(recorder.len(), 1);
}

#[test]
fn test_handshake_after_established_is_absorbed() {
    let pair = BridgePair::established();
    let before = handshakes_posted_by(&pair.world, pair.contexts.page_ctx());

    for flag in ["handshake", "handshakeConfirmation"] {
        let mut frame = json!({ "type": DEFAULT_PROTOCOL_TAG });
        frame[flag] = json!(true);
        pair.world.bus.inject(
            pair.contexts.page_ctx(),
            InboundMessage::new(
                frame.to_string(),
                Some(pair.contexts.frame_ctx()),
                FRAME_ORIGIN,
            ),
        );
    }
    pair.world.settle();

    assert!(pair.page.is_handshaken());
    assert_eq!(
        handshakes_posted_by(&pair.world, pair.contexts.page_ctx()),
        before
    );
}

#[test]
fn test_signal_clones_taken_after_handshake_resolve() {
    let pair = BridgePair::established();
    assert_eq!(pair.page.handshake_signal().now_or_never(), Some(Ok(())));
}
