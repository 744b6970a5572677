//! Topic strings: the fixed control vocabulary and namespaced store topics.
//!
//! A topic is either one of the control names below or a structurally
//! namespaced string built from an entity id, e.g.
//! `store-value>c1>count`. The handler registry maps each exact topic string
//! to a single handler, so fan-out is achieved by giving each logical
//! subscriber a distinct topic suffix rather than by multi-subscriber
//! dispatch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::ComponentId;

/// Announce creation of a mirrored component instance.
pub const ADD_COMPONENT: &str = "add-component";

/// Announce destruction of a component instance.
pub const DESTROY_COMPONENT: &str = "destroy-component";

/// Invoke a remote operation; the reply correlates via the call's id.
pub const EXEC_RPC: &str = "exec-rpc";

/// Push a local store value change to the peer.
pub const STORE_SET: &str = "store-set";

/// Prefix for per-store value delivery topics (`store-value>{id}>{store}`).
pub const STORE_VALUE: &str = "store-value";

/// Initial/restored application state handshake, sent once per connection.
pub const APP_STATE: &str = "app-state";

/// Conventional reply topic for `exec-rpc` results. Callers correlate by id
/// and do not depend on this string.
pub const RPC_RESULT: &str = "rpc-result";

/// Separator used to build namespaced topics.
pub const TOPIC_SEPARATOR: char = '>';

/// Routing key of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Wrap an existing topic string.
    pub fn new(topic: impl Into<String>) -> Self {
        Self(topic.into())
    }

    /// Build the value-delivery topic for one store of one component.
    pub fn store_value(component: &ComponentId, store: &str) -> Self {
        Self(format!(
            "{STORE_VALUE}{TOPIC_SEPARATOR}{component}{TOPIC_SEPARATOR}{store}"
        ))
    }

    /// Parse this topic as a store value-delivery topic, yielding
    /// `(component id, store name)` if it is one.
    pub fn as_store_value(&self) -> Option<(&str, &str)> {
        let mut parts = self.0.splitn(3, TOPIC_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(STORE_VALUE), Some(component), Some(store))
                if !component.is_empty() && !store.is_empty() =>
            {
                Some((component, store))
            }
            _ => None,
        }
    }

    /// The topic as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(topic: &str) -> Self {
        Self(topic.to_owned())
    }
}

impl From<String> for Topic {
    fn from(topic: String) -> Self {
        Self(topic)
    }
}
