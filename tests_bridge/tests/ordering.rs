//! Outbound Ordering Tests
//!
//! Validates the outbound queue: nothing leaves before the handshake, queued
//! sends leave in issue order, later sends leave at once.

use bridge_sim::fault_injection::{FaultPlan, MessageFault};
use bridge_sim::SimWorld;
use bridge_types::MessageId;
use serde_json::json;
use std::collections::HashSet;
use tests_bridge::{data_ids_posted_by, BridgePair, Recorder};

fn ids(raw: &[u64]) -> Vec<MessageId> {
    raw.iter().copied().map(MessageId::new).collect()
}

#[test]
fn test_sends_before_handshake_wait_in_order() {
    let pair = BridgePair::new();
    let recorder = Recorder::attach(&pair.frame);
    let page_ctx = pair.contexts.page_ctx();

    let _futures: Vec<_> = (0..5)
        .map(|n| pair.page.send(Some("seq"), json!(n)))
        .collect();

    assert!(data_ids_posted_by(&pair.world, page_ctx).is_empty());
    assert_eq!(pair.page.queued_ids(), ids(&[1, 2, 3, 4, 5]));

    pair.world.settle();

    assert_eq!(pair.page.queued_len(), 0);
    assert_eq!(data_ids_posted_by(&pair.world, page_ctx), ids(&[1, 2, 3, 4, 5]));
    assert_eq!(recorder.ids(), ids(&[1, 2, 3, 4, 5]));
    let payloads: Vec<_> = recorder.take().into_iter().map(|m| m.into_data()).collect();
    assert_eq!(payloads, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
}

#[test]
fn test_send_after_handshake_transmits_immediately() {
    let pair = BridgePair::established();
    let page_ctx = pair.contexts.page_ctx();

    let future = pair.page.send(Some("now"), json!({"x": 1}));

    // Posted synchronously, before anything is delivered.
    assert_eq!(pair.page.queued_len(), 0);
    assert_eq!(
        data_ids_posted_by(&pair.world, page_ctx),
        vec![future.id().unwrap()]
    );
}

#[test]
fn test_queue_holds_while_handshake_is_lost() {
    let world = SimWorld::with_fault_plan(
        FaultPlan::new().with_message_fault(MessageFault::DropMatching {
            needle: "\"handshake\":true".to_string(),
        }),
    );
    let pair = BridgePair::in_world(world);
    let recorder = Recorder::attach(&pair.frame);
    let _a = pair.page.send(None, json!("a"));
    let _b = pair.page.send(None, json!("b"));

    pair.world.settle();

    assert!(!pair.page.is_handshaken());
    assert!(!pair.frame.is_handshaken());
    assert!(recorder.is_empty());
    assert_eq!(pair.page.queued_len(), 2);
}

#[test]
fn test_ids_are_unique() {
    let pair = BridgePair::established();
    pair.frame.set_on_message(|incoming| {
        let _ = incoming.respond(json!("ack"));
    });
    // Responses draw from the same counter as sends.
    pair.page.set_on_message(|incoming| {
        let _ = incoming.respond(json!("ack"));
    });

    let mut issued = Vec::new();
    for n in 0..20 {
        issued.push(pair.page.send(Some("load"), json!(n)).id().unwrap());
        let _ = pair.frame.send(Some("load"), json!(n));
        if n % 3 == 0 {
            pair.world.settle();
        }
    }
    pair.world.settle();

    let posted = data_ids_posted_by(&pair.world, pair.contexts.page_ctx());
    assert_eq!(posted.len(), 40);
    let unique: HashSet<_> = posted.iter().copied().collect();
    assert_eq!(unique.len(), posted.len());
    assert!(issued.iter().all(|id| unique.contains(id)));
    assert!(issued.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_reordered_handshake_keeps_queue_order() {
    let world = SimWorld::with_fault_plan(
        FaultPlan::new().with_message_fault(MessageFault::ReorderWindow {
            index: 0,
            offset: 1,
        }),
    );
    let pair = BridgePair::in_world(world);
    let recorder = Recorder::attach(&pair.frame);
    let _first = pair.page.send(None, json!(1));
    let _second = pair.page.send(None, json!(2));

    pair.world.settle();

    assert!(pair.page.is_handshaken());
    assert!(pair.frame.is_handshaken());
    assert_eq!(recorder.ids(), ids(&[1, 2]));
}
