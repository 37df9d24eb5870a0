//! Inbound data envelopes

use crate::error::ChannelError;
use crate::pending::ResponseFuture;
use bridge_envelope::DataFrame;
use bridge_types::MessageId;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::rc::{Rc, Weak};

/// Anything that can send a data envelope on behalf of an inbound one
pub(crate) trait EnvelopeSink {
    fn send_envelope(
        self: Rc<Self>,
        namespace: Option<String>,
        data: Value,
        response_to: Option<MessageId>,
    ) -> ResponseFuture;
}

/// A data message accepted from the remote context
///
/// Keeps a weak link to the channel that received it so it can be
/// answered with [`respond`](IncomingEnvelope::respond).
#[derive(Clone)]
pub struct IncomingEnvelope {
    id: MessageId,
    response_to_id: Option<MessageId>,
    namespace: Option<String>,
    data: Value,
    sink: Weak<dyn EnvelopeSink>,
}

impl IncomingEnvelope {
    pub(crate) fn from_frame(frame: DataFrame, sink: Weak<dyn EnvelopeSink>) -> Self {
        Self {
            id: frame.id,
            response_to_id: frame.response_to_id,
            namespace: frame.namespace,
            data: frame.data,
            sink,
        }
    }

    /// Id assigned by the remote channel
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Id of our envelope that this one answers
    pub fn response_to_id(&self) -> Option<MessageId> {
        self.response_to_id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Consumes the envelope, returning its payload
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Decodes the payload into a typed value
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    /// Answers this envelope
    ///
    /// Sends `data` back through the owning channel under this envelope's
    /// namespace, with `responseToId` set to this envelope's id. The returned
    /// future behaves like any other send's: it resolves only if the remote
    /// answers the answer.
    pub fn respond(&self, data: Value) -> ResponseFuture {
        match self.sink.upgrade() {
            Some(sink) => sink.send_envelope(self.namespace.clone(), data, Some(self.id)),
            None => ResponseFuture::failed(None, ChannelError::Closed),
        }
    }
}

impl fmt::Debug for IncomingEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingEnvelope")
            .field("id", &self.id)
            .field("response_to_id", &self.response_to_id)
            .field("namespace", &self.namespace)
            .field("data", &self.data)
            .finish()
    }
}
