//! The frame triple and its JSON codec.

use serde::de::{Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ProtocolError, Result};
use crate::ids::CorrelationId;
use crate::topics::Topic;

/// One unit of transport traffic: `(correlationId, topic, payload)`.
///
/// Encoded as the JSON array `[correlationId, topic, payload]` and sent as one
/// discrete text message. The id position is `null` for frames that neither
/// expect nor are a reply (some peers omit it on pushes); frames produced by
/// the router always carry an id.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Correlation id, or `None` when the peer sent `null`.
    pub id: Option<CorrelationId>,
    /// Routing key.
    pub topic: Topic,
    /// Topic-dependent payload.
    pub payload: Value,
}

impl Frame {
    /// Build a frame.
    pub fn new(id: Option<CorrelationId>, topic: Topic, payload: Value) -> Self {
        Self { id, topic, payload }
    }

    /// Encode into the wire text (`[id, topic, payload]`).
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Decode from wire text.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Malformed`] if the text is not valid JSON or not a
    /// 3-element array of `(null-or-string, string, value)`.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.id, &self.topic, &self.payload).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Frame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (id, topic, payload): (Option<CorrelationId>, Option<Topic>, Value) =
            Deserialize::deserialize(deserializer)?;
        let topic = topic.ok_or_else(|| D::Error::custom("topic must not be null"))?;
        Ok(Self { id, topic, payload })
    }
}
