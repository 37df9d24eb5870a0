//! Request/Response Correlation Tests
//!
//! Validates that responses resolve the sender's future, that silence ends
//! in a timeout, and that late responses fall through to the handler.

use bridge_sim::SimWorld;
use bridge_types::{Duration, MessageId};
use frame_bridge::{Channel, ChannelConfig, ChannelError};
use futures::future::FusedFuture;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use tests_bridge::{BridgePair, Contexts, Recorder};

/// Test: responding to id k resolves the sender's future for k and never
/// reaches the sender's handler
#[test]
fn test_respond_resolves_original_send() {
    let pair = BridgePair::established();
    let page_handler = Recorder::attach(&pair.page);
    pair.frame.set_on_message(|incoming| {
        let _ = incoming.respond(json!({"got": incoming.data().clone()}));
    });

    let mut future = pair.page.send(Some("ns"), json!({"x": 1}));
    let sent_id = future.id().unwrap();
    pair.world.settle();

    let reply = (&mut future).now_or_never().unwrap().unwrap();
    assert_eq!(reply.response_to_id(), Some(sent_id));
    assert_eq!(reply.namespace(), Some("ns"));
    assert_eq!(reply.data(), &json!({"got": {"x": 1}}));
    assert!(page_handler.is_empty());
    assert_eq!(pair.page.pending_len(), 0);
    // The response is itself a send awaiting an answer that never comes.
    assert_eq!(pair.frame.pending_len(), 1);
}

/// Test: A and B with wildcard origins, A's send resolves only if B answers
#[test]
fn test_end_to_end_with_and_without_response() {
    let world = SimWorld::new();
    let contexts = Contexts::open(&world);
    let a = Channel::new(
        contexts.page.clone(),
        world.timer.clone(),
        contexts.frame_ctx(),
        "*",
    );
    let b = Channel::new(
        contexts.frame.clone(),
        world.timer.clone(),
        contexts.page_ctx(),
        "*",
    );
    world.settle();

    let answer = Rc::new(RefCell::new(true));
    let answering = answer.clone();
    b.set_on_message(move |incoming| {
        if *answering.borrow() {
            let _ = incoming.respond(json!({"ok": true}));
        }
    });

    let mut answered = a.send(Some("ns"), json!({"x": 1}));
    world.settle();
    let reply = (&mut answered).now_or_never().unwrap().unwrap();
    assert_eq!(reply.namespace(), Some("ns"));

    *answer.borrow_mut() = false;
    let mut ignored = a.send(Some("ns"), json!({"x": 1}));
    let ignored_id = ignored.id().unwrap();
    world.settle();
    world.advance(2999);
    assert!((&mut ignored).now_or_never().is_none());
    world.advance(1);
    match ignored.now_or_never() {
        Some(Err(err)) => assert_eq!(
            err,
            ChannelError::Timeout {
                id: ignored_id,
                timeout_ms: 3000,
            }
        ),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[test]
fn test_timeout_then_late_response_reaches_handler() {
    let pair = BridgePair::established();
    let frame_inbox = Recorder::attach(&pair.frame);
    let page_handler = Recorder::attach(&pair.page);
    pair.page.set_timeout(Duration::from_millis(100));

    let mut future = pair.page.send(Some("slow"), json!("question"));
    pair.world.settle();
    pair.world.advance(100);

    match (&mut future).now_or_never() {
        Some(Err(ChannelError::Timeout { id, timeout_ms })) => {
            assert_eq!(Some(id), future.id());
            assert_eq!(timeout_ms, 100);
        }
        other => panic!("expected timeout, got {:?}", other),
    }

    let request = frame_inbox.take().remove(0);
    let _ = request.respond(json!("answer"));
    pair.world.settle();

    let late = page_handler.take();
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].response_to_id(), future.id());
    assert_eq!(late[0].data(), &json!("answer"));
    assert!(future.is_terminated());
    assert_eq!(pair.page.pending_len(), 0);
}

#[test]
fn test_response_to_unknown_id_reaches_handler() {
    let pair = BridgePair::established();
    let page_handler = Recorder::attach(&pair.page);

    let _ = pair
        .frame
        .send_correlated(None, json!("unsolicited"), Some(MessageId::new(999)));
    pair.world.settle();

    assert_eq!(page_handler.len(), 1);
    assert_eq!(
        page_handler.take()[0].response_to_id(),
        Some(MessageId::new(999))
    );
}

#[test]
fn test_unhandled_message_is_dropped() {
    let pair = BridgePair::established();
    let mut future = pair.page.send(None, json!(1));
    pair.world.settle();

    assert!((&mut future).now_or_never().is_none());
    pair.world.advance(3000);
    assert!(matches!(
        future.now_or_never(),
        Some(Err(ChannelError::Timeout { .. }))
    ));
}

/// Test: a response sent synchronously from inside the handler
#[test]
fn test_reentrant_conversation() {
    let pair = BridgePair::established();
    let transcript = Rc::new(RefCell::new(Vec::new()));

    // The frame answers, then asks its own follow-up from inside the handler.
    let frame = pair.frame.clone();
    let log = transcript.clone();
    pair.frame.set_on_message(move |incoming| {
        log.borrow_mut().push(format!("frame got {}", incoming.data()));
        let _ = incoming.respond(json!("pong"));
        let _ = frame.send(Some("follow-up"), json!("and you?"));
    });

    let log = transcript.clone();
    pair.page.set_on_message(move |incoming| {
        log.borrow_mut().push(format!("page got {}", incoming.data()));
        let _ = incoming.respond(json!("fine"));
    });

    let mut future = pair.page.send(Some("chat"), json!("ping"));
    pair.world.settle();

    assert_eq!(
        (&mut future).now_or_never().unwrap().unwrap().data(),
        &json!("pong")
    );
    assert_eq!(
        *transcript.borrow(),
        vec![
            "frame got \"ping\"".to_string(),
            "page got \"and you?\"".to_string(),
        ]
    );
    // Only the two unanswered responses remain outstanding.
    assert_eq!(pair.page.pending_len(), 1);
    assert_eq!(pair.frame.pending_len(), 1);
    pair.world.advance(3000);
    assert_eq!(pair.page.pending_len(), 0);
    assert_eq!(pair.frame.pending_len(), 0);
}

#[test]
fn test_typed_payloads() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Sum {
        total: i64,
    }

    let pair = BridgePair::established();
    pair.frame.set_on_message(|incoming| {
        let numbers: Vec<i64> = incoming.parse_data().unwrap_or_default();
        let _ = incoming.respond(json!({"total": numbers.iter().sum::<i64>()}));
    });

    let mut future = pair.page.send_json(Some("sum"), &[1, 2, 3, 4]);
    pair.world.settle();

    let reply = (&mut future).now_or_never().unwrap().unwrap();
    assert_eq!(reply.parse_data::<Sum>().unwrap(), Sum { total: 10 });
}

#[test]
fn test_dropped_channel_closes_outstanding_futures() {
    let world = SimWorld::new();
    let contexts = Contexts::open(&world);
    let page = Channel::from_config(
        contexts.page.clone(),
        world.timer.clone(),
        ChannelConfig::new(contexts.frame_ctx(), "*").with_timeout_ms(50),
    );
    let signal = page.handshake_signal();
    let future = page.send(None, json!(1));

    drop(page);

    assert!(matches!(
        future.now_or_never(),
        Some(Err(ChannelError::Closed))
    ));
    assert_eq!(signal.now_or_never(), Some(Err(ChannelError::Closed)));
    assert_eq!(world.advance(50), 1);
}
