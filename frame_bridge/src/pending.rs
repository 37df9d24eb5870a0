//! Response correlation
//!
//! Each send registers a resolver under its id. The resolver leaves the
//! table exactly once: on the matching response or when its timeout fires,
//! whichever comes first. Whoever removes it settles the future; the loser
//! finds nothing and does nothing.

use crate::error::ChannelError;
use crate::incoming::IncomingEnvelope;
use bridge_hal::TimerId;
use bridge_types::MessageId;
use futures::channel::oneshot;
use futures::future::FusedFuture;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pub(crate) type ResponseResult = Result<IncomingEnvelope, ChannelError>;

pub(crate) struct PendingResponse {
    resolver: oneshot::Sender<ResponseResult>,
    timer: TimerId,
}

impl PendingResponse {
    pub(crate) fn new(resolver: oneshot::Sender<ResponseResult>, timer: TimerId) -> Self {
        Self { resolver, timer }
    }

    pub(crate) fn timer(&self) -> TimerId {
        self.timer
    }

    /// Settles the waiting future
    ///
    /// A caller that dropped its future is not an error.
    pub(crate) fn settle(self, result: ResponseResult) {
        let _ = self.resolver.send(result);
    }
}

#[derive(Default)]
pub(crate) struct PendingResponses {
    entries: HashMap<MessageId, PendingResponse>,
}

impl PendingResponses {
    pub(crate) fn insert(&mut self, id: MessageId, entry: PendingResponse) {
        self.entries.insert(id, entry);
    }

    pub(crate) fn take(&mut self, id: MessageId) -> Option<PendingResponse> {
        self.entries.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The eventual response to a send
///
/// Resolves with the matching [`IncomingEnvelope`], or fails with
/// [`ChannelError::Timeout`] if none arrives in time. Dropping the future
/// does not cancel the send.
///
/// The future yields its result once. Check
/// [`is_terminated`](FusedFuture::is_terminated) before polling again;
/// a repeated poll reports [`ChannelError::Closed`].
#[must_use = "a response future does nothing unless polled"]
pub struct ResponseFuture {
    id: Option<MessageId>,
    receiver: oneshot::Receiver<ResponseResult>,
    terminated: bool,
}

impl ResponseFuture {
    pub(crate) fn pending(id: MessageId) -> (oneshot::Sender<ResponseResult>, Self) {
        let (resolver, receiver) = oneshot::channel();
        (
            resolver,
            Self {
                id: Some(id),
                receiver,
                terminated: false,
            },
        )
    }

    /// A future that has already failed
    pub(crate) fn failed(id: Option<MessageId>, error: ChannelError) -> Self {
        let (resolver, receiver) = oneshot::channel();
        let _ = resolver.send(Err(error));
        Self {
            id,
            receiver,
            terminated: false,
        }
    }

    /// Id assigned to the outgoing envelope, if one was built
    pub fn id(&self) -> Option<MessageId> {
        self.id
    }
}

impl Future for ResponseFuture {
    type Output = ResponseResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let result = match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => result,
            Poll::Ready(Err(oneshot::Canceled)) => Err(ChannelError::Closed),
            Poll::Pending => return Poll::Pending,
        };
        this.terminated = true;
        Poll::Ready(result)
    }
}

impl FusedFuture for ResponseFuture {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl std::fmt::Debug for ResponseFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFuture").field("id", &self.id).finish()
    }
}
