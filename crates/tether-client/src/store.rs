//! Reactive value cells with bidirectional push/pull sync.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tether_proto::{ComponentId, StoreSet, Topic, topics};

use crate::router::Router;

type Subscriber = Arc<dyn Fn(&Value) + Send + Sync>;

struct StoreState {
    value: Value,
    subscribers: Vec<Subscriber>,
}

struct StoreInner {
    component_id: ComponentId,
    name: String,
    topic: Topic,
    router: Router,
    state: Mutex<StoreState>,
}

impl StoreInner {
    /// Apply a peer-pushed value and notify subscribers.
    ///
    /// Does not re-emit `store-set`: peer pushes reconcile the cell, they
    /// never echo back, so no feedback loop is possible.
    fn apply_remote(&self, value: Value) {
        let subscribers = {
            let mut state = self.state.lock();
            state.value = value.clone();
            state.subscribers.clone()
        };
        for subscriber in subscribers {
            (*subscriber)(&value);
        }
    }
}

/// A named reactive value cell scoped to one component instance.
///
/// The owning [`crate::Component`] holds the store; the router's handler
/// table holds only a weak reference, so an instance that goes away cannot
/// be kept alive by its own topic handler. Clones share the same cell.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    pub(crate) fn new(
        router: Router,
        component_id: ComponentId,
        name: &str,
        initial: Value,
    ) -> Self {
        let topic = Topic::store_value(&component_id, name);
        let inner = Arc::new(StoreInner {
            component_id,
            name: name.to_owned(),
            topic: topic.clone(),
            router: router.clone(),
            state: Mutex::new(StoreState { value: initial, subscribers: Vec::new() }),
        });

        let weak: Weak<StoreInner> = Arc::downgrade(&inner);
        router.register_handler(topic, move |payload| {
            if let Some(store) = weak.upgrade() {
                store.apply_remote(payload);
            }
        });

        Self { inner }
    }

    /// Name of this store within its component.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Topic on which the peer delivers values for this cell.
    pub fn topic(&self) -> &Topic {
        &self.inner.topic
    }

    /// Current value of the cell.
    pub fn get(&self) -> Value {
        self.inner.state.lock().value.clone()
    }

    /// Set the cell locally and push the change to the peer.
    ///
    /// Updates `currentValue` synchronously and emits exactly one
    /// `store-set` frame. Local subscribers are not notified — notification
    /// is the inbound path's job. Setting before any peer push has arrived
    /// is permitted: the cell simply diverges from the peer until its next
    /// push reconciles it.
    pub fn set(&self, value: Value) {
        self.inner.state.lock().value = value.clone();
        self.inner.router.send(
            Topic::from(topics::STORE_SET),
            StoreSet {
                id: self.inner.component_id.clone(),
                store: self.inner.name.clone(),
                value,
            }
            .into_payload(),
        );
    }

    /// Register a callback invoked with each peer-pushed value.
    pub fn subscribe(&self, subscriber: impl Fn(&Value) + Send + Sync + 'static) {
        self.inner.state.lock().subscribers.push(Arc::new(subscriber));
    }
}
