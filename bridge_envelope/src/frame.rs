//! Inbound frame decoding and handshake frame encoding

use bridge_types::MessageId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loosely typed view of any frame on the wire
///
/// Every field is optional so that decoding can succeed on partial input.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    /// Protocol tag
    #[serde(rename = "type", default)]
    pub protocol: Option<String>,
    /// Set on handshake requests
    #[serde(default)]
    pub handshake: Option<bool>,
    /// Set on handshake confirmations
    #[serde(default)]
    pub handshake_confirmation: Option<bool>,
    /// Id of a data message
    #[serde(default)]
    pub id: Option<MessageId>,
    /// Id of the message this one answers
    #[serde(default)]
    pub response_to_id: Option<MessageId>,
    /// Application namespace
    #[serde(default)]
    pub namespace: Option<String>,
    /// Application payload
    #[serde(default)]
    pub data: Value,
}

impl WireEnvelope {
    /// Decodes a raw payload
    ///
    /// Anything that is not a well-formed frame object decodes to the empty
    /// envelope, which carries no protocol tag and is therefore rejected by
    /// every channel.
    pub fn decode_lenient(payload: &str) -> Self {
        serde_json::from_str(payload).unwrap_or_default()
    }

    /// Checks whether this frame carries the given protocol tag
    pub fn has_protocol(&self, tag: &str) -> bool {
        self.protocol.as_deref() == Some(tag)
    }

    /// Classifies the frame
    pub fn into_frame(self) -> Frame {
        if self.handshake == Some(true) {
            return Frame::HandshakeRequest;
        }
        if self.handshake_confirmation == Some(true) {
            return Frame::HandshakeConfirmation;
        }
        match self.id {
            Some(id) => Frame::Data(DataFrame {
                id,
                response_to_id: self.response_to_id,
                namespace: self.namespace,
                data: self.data,
            }),
            None => Frame::Invalid,
        }
    }
}

/// A classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Remote is listening and asks to be confirmed
    HandshakeRequest,
    /// Remote answered our handshake request
    HandshakeConfirmation,
    /// Application data
    Data(DataFrame),
    /// Tagged correctly but neither a handshake nor a data frame with an id
    Invalid,
}

/// Fields of an inbound data frame
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    pub id: MessageId,
    pub response_to_id: Option<MessageId>,
    pub namespace: Option<String>,
    pub data: Value,
}

/// The two handshake frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeKind {
    Request,
    Confirmation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HandshakeFrame<'a> {
    #[serde(rename = "type")]
    protocol: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    handshake: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    handshake_confirmation: Option<bool>,
}

/// Serializes a handshake frame
pub fn encode_handshake(protocol: &str, kind: HandshakeKind) -> Result<String, serde_json::Error> {
    let frame = match kind {
        HandshakeKind::Request => HandshakeFrame {
            protocol,
            handshake: Some(true),
            handshake_confirmation: None,
        },
        HandshakeKind::Confirmation => HandshakeFrame {
            protocol,
            handshake: None,
            handshake_confirmation: Some(true),
        },
    };
    serde_json::to_string(&frame)
}
