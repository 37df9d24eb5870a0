//! Handshake readiness signal

use crate::error::ChannelError;
use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Resolves once, the first time the channel's handshake completes
///
/// Clones share the same resolution. If the channel is dropped before the
/// handshake completes, every clone fails with [`ChannelError::Closed`].
#[derive(Clone)]
#[must_use = "a handshake signal does nothing unless polled"]
pub struct HandshakeSignal {
    inner: Shared<oneshot::Receiver<()>>,
}

impl HandshakeSignal {
    pub(crate) fn new() -> (oneshot::Sender<()>, Self) {
        let (ready, receiver) = oneshot::channel();
        (
            ready,
            Self {
                inner: receiver.shared(),
            },
        )
    }
}

impl Future for HandshakeSignal {
    type Output = Result<(), ChannelError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.get_mut().inner.poll_unpin(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(ChannelError::Closed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for HandshakeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeSignal").finish_non_exhaustive()
    }
}
