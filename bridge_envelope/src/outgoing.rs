//! Outbound data envelopes

use bridge_types::MessageId;
use serde::Serialize;
use serde_json::Value;

/// A data message on its way out
///
/// The id is assigned by the owning channel when the envelope is built and
/// is never reassigned. `responseToId` and `namespace` are always written,
/// as `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingEnvelope {
    /// Protocol tag
    #[serde(rename = "type")]
    pub protocol: String,
    /// Channel-scoped id of this envelope
    pub id: MessageId,
    /// Id of the inbound envelope this one answers
    pub response_to_id: Option<MessageId>,
    /// Application namespace
    pub namespace: Option<String>,
    /// Application payload
    pub data: Value,
}

impl OutgoingEnvelope {
    /// Creates a new outgoing envelope
    pub fn new(
        protocol: impl Into<String>,
        id: MessageId,
        namespace: Option<String>,
        data: Value,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            id,
            response_to_id: None,
            namespace,
            data,
        }
    }

    /// Marks this envelope as the answer to `request`
    pub fn with_response_to(mut self, request: MessageId) -> Self {
        self.response_to_id = Some(request);
        self
    }

    /// Serializes the envelope for the transport
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Frame, WireEnvelope};
    use serde_json::json;

    #[test]
    fn test_encode_writes_nulls() {
        let envelope = OutgoingEnvelope::new("tag", MessageId::new(1), None, json!(true));
        let value: Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "tag",
                "id": 1,
                "responseToId": null,
                "namespace": null,
                "data": true
            })
        );
    }

    #[test]
    fn test_response_envelope() {
        let envelope = OutgoingEnvelope::new("tag", MessageId::new(8), None, json!("ok"))
            .with_response_to(MessageId::new(3));

        assert_eq!(envelope.response_to_id, Some(MessageId::new(3)));
    }

    #[test]
    fn test_encoded_envelope_classifies_as_data() {
        let envelope = OutgoingEnvelope::new(
            "tag",
            MessageId::new(2),
            Some("ns".to_string()),
            json!({"x": 1}),
        );
        let wire = WireEnvelope::decode_lenient(&envelope.encode().unwrap());

        assert!(wire.has_protocol("tag"));
        match wire.into_frame() {
            Frame::Data(frame) => {
                assert_eq!(frame.id, envelope.id);
                assert_eq!(frame.namespace, envelope.namespace);
                assert_eq!(frame.data, envelope.data);
            }
            other => panic!("expected data frame, got {:?}", other),
        }
    }
}
