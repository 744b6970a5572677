//! Typed payloads for the control topic vocabulary.
//!
//! Control payloads are positional JSON arrays on the wire (the shapes in the
//! table in `SPEC_FULL.md` §6), so these types carry hand-written serde impls
//! that encode to and decode from tuples rather than field maps. Store values,
//! RPC arguments, and RPC results stay [`serde_json::Value`]: the protocol
//! core never interprets application data.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::errors::{ProtocolError, Result};
use crate::ids::ComponentId;

fn bad_payload(topic: &str, err: &serde_json::Error) -> ProtocolError {
    ProtocolError::BadPayload { topic: topic.to_owned(), reason: err.to_string() }
}

/// Payload of [`crate::topics::ADD_COMPONENT`]: `[id, parentId, kind, args]`.
///
/// Announces a locally created instance so the peer materializes its mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct AddComponent {
    /// Id of the new instance.
    pub id: ComponentId,
    /// Owning instance, or the root sentinel.
    pub parent_id: ComponentId,
    /// Remote type name.
    pub kind: String,
    /// Constructor arguments, opaque to the protocol core.
    pub args: Value,
}

impl AddComponent {
    /// Encode into the wire payload value.
    pub fn into_payload(self) -> Value {
        Value::Array(vec![
            Value::String(self.id.into_inner()),
            Value::String(self.parent_id.into_inner()),
            Value::String(self.kind),
            self.args,
        ])
    }

    /// Decode from a wire payload value.
    pub fn from_payload(payload: Value) -> Result<Self> {
        serde_json::from_value(payload).map_err(|e| bad_payload(crate::topics::ADD_COMPONENT, &e))
    }
}

impl Serialize for AddComponent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.id, &self.parent_id, &self.kind, &self.args).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AddComponent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (id, parent_id, kind, args) = Deserialize::deserialize(deserializer)?;
        Ok(Self { id, parent_id, kind, args })
    }
}

/// Payload of [`crate::topics::DESTROY_COMPONENT`]: `[id]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyComponent {
    /// Id of the destroyed instance.
    pub id: ComponentId,
}

impl DestroyComponent {
    /// Encode into the wire payload value.
    pub fn into_payload(self) -> Value {
        Value::Array(vec![Value::String(self.id.into_inner())])
    }

    /// Decode from a wire payload value.
    pub fn from_payload(payload: Value) -> Result<Self> {
        serde_json::from_value(payload)
            .map_err(|e| bad_payload(crate::topics::DESTROY_COMPONENT, &e))
    }
}

impl Serialize for DestroyComponent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.id,).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DestroyComponent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (id,) = Deserialize::deserialize(deserializer)?;
        Ok(Self { id })
    }
}

/// Payload of [`crate::topics::EXEC_RPC`]: `[id, rpcName, args]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecRpc {
    /// Target instance.
    pub id: ComponentId,
    /// Name of the remote operation.
    pub rpc: String,
    /// Positional arguments.
    pub args: Vec<Value>,
}

impl ExecRpc {
    /// Encode into the wire payload value.
    pub fn into_payload(self) -> Value {
        Value::Array(vec![
            Value::String(self.id.into_inner()),
            Value::String(self.rpc),
            Value::Array(self.args),
        ])
    }

    /// Decode from a wire payload value.
    pub fn from_payload(payload: Value) -> Result<Self> {
        serde_json::from_value(payload).map_err(|e| bad_payload(crate::topics::EXEC_RPC, &e))
    }
}

impl Serialize for ExecRpc {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.id, &self.rpc, &self.args).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExecRpc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (id, rpc, args) = Deserialize::deserialize(deserializer)?;
        Ok(Self { id, rpc, args })
    }
}

/// Payload of [`crate::topics::STORE_SET`]: `[id, storeName, value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSet {
    /// Owning instance.
    pub id: ComponentId,
    /// Store whose value changed.
    pub store: String,
    /// The new value.
    pub value: Value,
}

impl StoreSet {
    /// Encode into the wire payload value.
    pub fn into_payload(self) -> Value {
        Value::Array(vec![
            Value::String(self.id.into_inner()),
            Value::String(self.store),
            self.value,
        ])
    }

    /// Decode from a wire payload value.
    pub fn from_payload(payload: Value) -> Result<Self> {
        serde_json::from_value(payload).map_err(|e| bad_payload(crate::topics::STORE_SET, &e))
    }
}

impl Serialize for StoreSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.id, &self.store, &self.value).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StoreSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (id, store, value) = Deserialize::deserialize(deserializer)?;
        Ok(Self { id, store, value })
    }
}

/// Remote failure carried inside an RPC reply envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteError {
    /// Remote error class (e.g. the peer's exception type name).
    pub kind: String,
    /// Human-readable description.
    pub message: String,
}

/// Interpreted payload of an RPC reply.
///
/// A failure is the tagged object `{"error": {"kind": ..., "message": ...}}`
/// — exactly one key, both fields strings, nothing else. Any other payload is
/// a success whose content is returned verbatim, which keeps bare scalar
/// replies valid. Success values are deliberately untagged; a server that
/// needs to return a value of exactly the envelope shape must wrap it itself.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    /// The remote operation succeeded with this result.
    Ok(Value),
    /// The remote operation failed.
    Err(RemoteError),
}

impl RpcReply {
    /// Interpret a reply payload.
    pub fn from_payload(payload: Value) -> Self {
        if let Value::Object(map) = &payload {
            if map.len() == 1 {
                if let Some(inner) = map.get("error") {
                    if let Ok(err) = serde_json::from_value::<RemoteError>(inner.clone()) {
                        return Self::Err(err);
                    }
                }
            }
        }
        Self::Ok(payload)
    }

    /// Encode into the wire payload value.
    pub fn into_payload(self) -> Value {
        match self {
            Self::Ok(value) => value,
            Self::Err(err) => json!({"error": {"kind": err.kind, "message": err.message}}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_component_wire_shape() {
        let payload = AddComponent {
            id: ComponentId::new("c1"),
            parent_id: ComponentId::root(),
            kind: "Counter".to_owned(),
            args: json!({"start": 0}),
        }
        .into_payload();
        assert_eq!(payload, json!(["c1", "root", "Counter", {"start": 0}]));

        let decoded = AddComponent::from_payload(payload).unwrap();
        assert_eq!(decoded.id, ComponentId::new("c1"));
        assert_eq!(decoded.kind, "Counter");
    }

    #[test]
    fn destroy_component_is_single_element_array() {
        let payload = DestroyComponent { id: ComponentId::new("c1") }.into_payload();
        assert_eq!(payload, json!(["c1"]));
    }

    #[test]
    fn exec_rpc_round_trip() {
        let payload = json!(["c1", "inc", [2, "by"]]);
        let decoded = ExecRpc::from_payload(payload.clone()).unwrap();
        assert_eq!(decoded.rpc, "inc");
        assert_eq!(decoded.args, vec![json!(2), json!("by")]);
        assert_eq!(decoded.into_payload(), payload);
    }

    #[test]
    fn exec_rpc_rejects_non_array_args() {
        assert!(matches!(
            ExecRpc::from_payload(json!(["c1", "inc", 3])),
            Err(ProtocolError::BadPayload { .. })
        ));
    }

    #[test]
    fn store_set_round_trip() {
        let payload = json!(["c1", "count", 5]);
        let decoded = StoreSet::from_payload(payload.clone()).unwrap();
        assert_eq!(decoded.store, "count");
        assert_eq!(decoded.value, json!(5));
        assert_eq!(decoded.into_payload(), payload);
    }

    #[test]
    fn bare_value_is_success() {
        assert_eq!(RpcReply::from_payload(json!(1)), RpcReply::Ok(json!(1)));
        assert_eq!(RpcReply::from_payload(json!(null)), RpcReply::Ok(json!(null)));
    }

    #[test]
    fn error_envelope_is_failure() {
        let reply =
            RpcReply::from_payload(json!({"error": {"kind": "AttributeError", "message": "no such rpc"}}));
        assert_eq!(
            reply,
            RpcReply::Err(RemoteError {
                kind: "AttributeError".to_owned(),
                message: "no such rpc".to_owned(),
            })
        );
    }

    #[test]
    fn near_miss_envelopes_are_success() {
        // Extra sibling key.
        let v = json!({"error": {"kind": "E", "message": "m"}, "extra": 1});
        assert_eq!(RpcReply::from_payload(v.clone()), RpcReply::Ok(v));

        // Extra field inside the envelope.
        let v = json!({"error": {"kind": "E", "message": "m", "code": 1}});
        assert_eq!(RpcReply::from_payload(v.clone()), RpcReply::Ok(v));

        // Wrong inner shape.
        let v = json!({"error": "boom"});
        assert_eq!(RpcReply::from_payload(v.clone()), RpcReply::Ok(v));
    }

    #[test]
    fn envelope_round_trip() {
        let err = RpcReply::Err(RemoteError { kind: "E".to_owned(), message: "m".to_owned() });
        let payload = err.clone().into_payload();
        assert_eq!(RpcReply::from_payload(payload), err);
    }
}
