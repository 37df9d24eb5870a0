//! The channel: handshake, outbound queue, correlation, inbound dispatch

use crate::config::ChannelConfig;
use crate::error::ChannelError;
use crate::handshake::{Handshake, HandshakeState};
use crate::incoming::{EnvelopeSink, IncomingEnvelope};
use crate::pending::{PendingResponse, PendingResponses, ResponseFuture};
use crate::queue::{OutboundQueue, QueuedEnvelope};
use crate::signal::HandshakeSignal;
use bridge_envelope::{
    encode_handshake, DataFrame, Frame, HandshakeKind, OutgoingEnvelope, WireEnvelope,
};
use bridge_hal::{InboundMessage, Listening, TimerFacility, Transport};
use bridge_types::{ContextId, Duration, MessageId, RemoteOrigin};
use futures::channel::oneshot;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// Callback for inbound messages that answer no pending send
pub type MessageHandler = Box<dyn FnMut(IncomingEnvelope)>;

struct ChannelState {
    handshake: Handshake,
    handshake_ready: Option<oneshot::Sender<()>>,
    timeout: Duration,
    next_id: u64,
    queue: OutboundQueue,
    pending: PendingResponses,
    on_message: Option<MessageHandler>,
    /// Bumped whenever the handler is replaced or cleared
    handler_generation: u64,
    flushing: bool,
}

struct ChannelInner<T, S> {
    transport: T,
    timer: S,
    remote_context: Option<ContextId>,
    remote_origin: Option<RemoteOrigin>,
    protocol_tag: String,
    signal: HandshakeSignal,
    state: RefCell<ChannelState>,
}

/// Request/response channel to one remote context
///
/// Construction registers an inbound handler with the transport and posts
/// a handshake request. Sends made before the handshake completes wait in
/// an outbound queue and go out in order once it does.
///
/// `Channel` is a cheap handle; clones share the same state. Dropping the
/// last handle fails every outstanding response future with
/// [`ChannelError::Closed`].
pub struct Channel<T: Transport + 'static, S: TimerFacility + 'static> {
    inner: Rc<ChannelInner<T, S>>,
}

impl<T: Transport + 'static, S: TimerFacility + 'static> Clone for Channel<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport + 'static, S: TimerFacility + 'static> Channel<T, S> {
    /// Opens a channel to `remote_context` with default settings
    pub fn new(
        transport: T,
        timer: S,
        remote_context: ContextId,
        remote_origin: impl Into<String>,
    ) -> Self {
        Self::from_config(
            transport,
            timer,
            ChannelConfig::new(remote_context, remote_origin),
        )
    }

    /// Opens a channel described by `config`
    pub fn from_config(transport: T, timer: S, config: ChannelConfig) -> Self {
        let (handshake_ready, signal) = HandshakeSignal::new();
        let remote_origin = config.origin();
        let inner = Rc::new(ChannelInner {
            transport,
            timer,
            remote_context: config.remote_context,
            remote_origin,
            protocol_tag: config.protocol_tag.clone(),
            signal,
            state: RefCell::new(ChannelState {
                handshake: Handshake::new(),
                handshake_ready: Some(handshake_ready),
                timeout: config.timeout(),
                next_id: 0,
                queue: OutboundQueue::new(),
                pending: PendingResponses::default(),
                on_message: None,
                handler_generation: 0,
                flushing: false,
            }),
        });

        let weak = Rc::downgrade(&inner);
        inner.transport.on_receive(Box::new(move |message| match weak.upgrade() {
            Some(inner) => {
                inner.handle_inbound(message);
                Listening::Continue
            }
            None => Listening::Stop,
        }));

        debug!(
            remote_context = ?inner.remote_context,
            remote_origin = ?inner.remote_origin,
            timeout_ms = config.timeout_ms,
            "channel opened"
        );
        inner.begin_handshake();

        Self { inner }
    }

    /// Sends `data` under `namespace`
    ///
    /// Returns immediately. The future resolves with the remote's response
    /// or fails once the timeout elapses.
    pub fn send(&self, namespace: Option<&str>, data: Value) -> ResponseFuture {
        self.send_correlated(namespace, data, None)
    }

    /// Sends `data`, optionally marked as the answer to `response_to`
    pub fn send_correlated(
        &self,
        namespace: Option<&str>,
        data: Value,
        response_to: Option<MessageId>,
    ) -> ResponseFuture {
        self.inner
            .enqueue(namespace.map(str::to_string), data, response_to)
    }

    /// Serializes `data` and sends it
    ///
    /// A value that cannot be represented as JSON fails the returned future
    /// with [`ChannelError::Encode`] and sends nothing.
    pub fn send_json<D: Serialize + ?Sized>(
        &self,
        namespace: Option<&str>,
        data: &D,
    ) -> ResponseFuture {
        match serde_json::to_value(data) {
            Ok(value) => self.send(namespace, value),
            Err(err) => {
                warn!(error = %err, "refusing to send unserializable data");
                ResponseFuture::failed(None, ChannelError::Encode(err.to_string()))
            }
        }
    }

    /// Installs the handler for inbound messages that answer no pending send
    ///
    /// Replaces any previous handler. The handler may call back into the
    /// channel, including replacing itself.
    pub fn set_on_message<F>(&self, handler: F)
    where
        F: FnMut(IncomingEnvelope) + 'static,
    {
        let mut state = self.inner.state.borrow_mut();
        state.on_message = Some(Box::new(handler));
        state.handler_generation += 1;
    }

    /// Removes the message handler; unmatched messages are then dropped
    pub fn clear_on_message(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.on_message = None;
        state.handler_generation += 1;
    }

    /// Future resolved the first time the handshake completes
    pub fn handshake_signal(&self) -> HandshakeSignal {
        self.inner.signal.clone()
    }

    pub fn is_handshaken(&self) -> bool {
        self.handshake_state().is_established()
    }

    pub fn handshake_state(&self) -> HandshakeState {
        self.inner.state.borrow().handshake.state()
    }

    /// Changes the timeout applied to subsequent sends
    pub fn set_timeout(&self, timeout: Duration) {
        self.inner.state.borrow_mut().timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.inner.state.borrow().timeout
    }

    /// Number of envelopes waiting for the handshake
    pub fn queued_len(&self) -> usize {
        self.inner.state.borrow().queue.len()
    }

    /// Ids of envelopes waiting for the handshake, oldest first
    pub fn queued_ids(&self) -> Vec<MessageId> {
        self.inner.state.borrow().queue.ids()
    }

    /// Number of sends still awaiting a response
    pub fn pending_len(&self) -> usize {
        self.inner.state.borrow().pending.len()
    }

    pub fn remote_context(&self) -> Option<ContextId> {
        self.inner.remote_context
    }

    pub fn remote_origin(&self) -> Option<&RemoteOrigin> {
        self.inner.remote_origin.as_ref()
    }

    pub fn protocol_tag(&self) -> &str {
        &self.inner.protocol_tag
    }
}

impl<T: Transport + 'static, S: TimerFacility + 'static> ChannelInner<T, S> {
    fn sink(self: &Rc<Self>) -> Weak<dyn EnvelopeSink> {
        let sink: Rc<dyn EnvelopeSink> = self.clone();
        Rc::downgrade(&sink)
    }

    fn enqueue(
        self: &Rc<Self>,
        namespace: Option<String>,
        data: Value,
        response_to: Option<MessageId>,
    ) -> ResponseFuture {
        let (id, timeout) = {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            (MessageId::new(state.next_id), state.timeout)
        };

        let mut envelope = OutgoingEnvelope::new(self.protocol_tag.as_str(), id, namespace, data);
        if let Some(request) = response_to {
            envelope = envelope.with_response_to(request);
        }
        let wire = match envelope.encode() {
            Ok(wire) => wire,
            Err(err) => {
                warn!(%id, error = %err, "failed to encode envelope");
                return ResponseFuture::failed(Some(id), ChannelError::Encode(err.to_string()));
            }
        };

        let (resolver, future) = ResponseFuture::pending(id);
        let weak = Rc::downgrade(self);
        let timer = self.timer.schedule(
            timeout,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.expire(id, timeout);
                }
            }),
        );

        {
            let mut state = self.state.borrow_mut();
            state.pending.insert(id, PendingResponse::new(resolver, timer));
            state.queue.push(QueuedEnvelope { envelope, wire });
            trace!(%id, ?response_to, queued = state.queue.len(), "envelope queued");
        }

        self.flush();
        future
    }

    /// Transmits queued envelopes in order, if the handshake is done
    ///
    /// A flush requested while one is running only leaves its envelope in
    /// the queue; the running flush drains it.
    fn flush(&self) {
        {
            let mut state = self.state.borrow_mut();
            if !state.handshake.state().is_established() || state.flushing {
                return;
            }
            state.flushing = true;
        }

        let mut sent = 0usize;
        loop {
            let next = self.state.borrow_mut().queue.pop();
            let Some(entry) = next else {
                break;
            };
            trace!(id = %entry.envelope.id, "transmitting envelope");
            self.post(entry.wire);
            sent += 1;
        }

        let mut state = self.state.borrow_mut();
        state.flushing = false;
        if sent > 0 {
            debug!(sent, drained = state.queue.is_empty(), "flushed outbound queue");
        }
    }

    fn post(&self, payload: String) {
        match (&self.remote_context, &self.remote_origin) {
            (Some(target), Some(origin)) => {
                self.transport.post(target, origin.as_str(), payload);
            }
            _ => debug!("remote not configured, skipping post"),
        }
    }

    fn post_handshake(&self, kind: HandshakeKind) {
        match encode_handshake(&self.protocol_tag, kind) {
            Ok(payload) => self.post(payload),
            Err(err) => warn!(?kind, error = %err, "failed to encode handshake"),
        }
    }

    fn begin_handshake(&self) {
        let begun = self.state.borrow_mut().handshake.begin();
        if begun {
            trace!("sending handshake request");
            self.post_handshake(HandshakeKind::Request);
        }
    }

    fn expire(&self, id: MessageId, timeout: Duration) {
        let entry = self.state.borrow_mut().pending.take(id);
        if let Some(entry) = entry {
            debug!(%id, timeout_ms = timeout.as_millis(), "response timed out");
            entry.settle(Err(ChannelError::Timeout {
                id,
                timeout_ms: timeout.as_millis(),
            }));
        }
    }

    fn handle_inbound(self: &Rc<Self>, message: InboundMessage) {
        let wire = WireEnvelope::decode_lenient(&message.payload);
        if !self.accepts(&message, &wire) {
            return;
        }

        match wire.into_frame() {
            Frame::HandshakeRequest => self.receive_handshake(HandshakeKind::Request),
            Frame::HandshakeConfirmation => self.receive_handshake(HandshakeKind::Confirmation),
            Frame::Data(frame) => self.dispatch(frame),
            Frame::Invalid => debug!(origin = %message.origin, "dropping data frame without id"),
        }
    }

    fn accepts(&self, message: &InboundMessage, wire: &WireEnvelope) -> bool {
        let from_remote = self.remote_context.is_some() && message.source == self.remote_context;
        let origin_ok = self
            .remote_origin
            .as_ref()
            .map_or(false, |origin| origin.matches(&message.origin));
        let tagged = wire.has_protocol(&self.protocol_tag);

        if from_remote && origin_ok && tagged {
            return true;
        }
        trace!(
            source = ?message.source,
            origin = %message.origin,
            from_remote,
            origin_ok,
            tagged,
            "rejecting inbound message"
        );
        false
    }

    fn receive_handshake(&self, kind: HandshakeKind) {
        let (step, ready) = {
            let mut state = self.state.borrow_mut();
            let step = state.handshake.receive(kind);
            let ready = if step.established {
                state.handshake_ready.take()
            } else {
                None
            };
            (step, ready)
        };

        if !step.established {
            trace!(?kind, "handshake already established");
            return;
        }

        debug!(?kind, "handshake established");
        if let Some(ready) = ready {
            let _ = ready.send(());
        }
        if step.reply_confirmation {
            self.post_handshake(HandshakeKind::Confirmation);
        }
        self.flush();
    }

    fn dispatch(self: &Rc<Self>, frame: DataFrame) {
        let incoming = IncomingEnvelope::from_frame(frame, self.sink());

        let resolver = incoming
            .response_to_id()
            .and_then(|request| self.state.borrow_mut().pending.take(request));
        if let Some(entry) = resolver {
            self.timer.cancel(entry.timer());
            trace!(
                id = %incoming.id(),
                response_to = ?incoming.response_to_id(),
                "response matched"
            );
            entry.settle(Ok(incoming));
            return;
        }

        self.deliver_to_handler(incoming);
    }

    fn deliver_to_handler(&self, incoming: IncomingEnvelope) {
        let (handler, generation) = {
            let mut state = self.state.borrow_mut();
            (state.on_message.take(), state.handler_generation)
        };

        let Some(mut handler) = handler else {
            trace!(id = %incoming.id(), "no message handler, dropping");
            return;
        };

        // Borrow released: the handler may send, respond, or swap itself out.
        handler(incoming);

        let mut state = self.state.borrow_mut();
        if state.handler_generation == generation {
            state.on_message = Some(handler);
        }
    }
}

impl<T: Transport + 'static, S: TimerFacility + 'static> EnvelopeSink for ChannelInner<T, S> {
    fn send_envelope(
        self: Rc<Self>,
        namespace: Option<String>,
        data: Value,
        response_to: Option<MessageId>,
    ) -> ResponseFuture {
        self.enqueue(namespace, data, response_to)
    }
}
