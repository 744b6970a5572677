//! One node of the synchronized component hierarchy.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tether_proto::{ComponentId, Topic};

use crate::router::Router;
use crate::rpc::RpcProxy;
use crate::store::Store;

struct ComponentInner {
    id: ComponentId,
    parent_id: ComponentId,
    kind: String,
    args: Value,
    router: Router,
    stores: Mutex<HashMap<String, Store>>,
    rpcs: Mutex<HashMap<String, RpcProxy>>,
}

/// A live remote-bound object instance.
///
/// Owns its stores and RPC proxies; both are created through the factories
/// below and torn down by [`crate::ComponentRegistry::destroy`]. Clones
/// share the same instance.
#[derive(Clone)]
pub struct Component {
    inner: Arc<ComponentInner>,
}

impl Component {
    pub(crate) fn new(
        router: Router,
        id: ComponentId,
        parent_id: ComponentId,
        kind: String,
        args: Value,
    ) -> Self {
        Self {
            inner: Arc::new(ComponentInner {
                id,
                parent_id,
                kind,
                args,
                router,
                stores: Mutex::new(HashMap::new()),
                rpcs: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Session-unique instance id.
    pub fn id(&self) -> &ComponentId {
        &self.inner.id
    }

    /// Id of the owning instance, or the root sentinel.
    pub fn parent_id(&self) -> &ComponentId {
        &self.inner.parent_id
    }

    /// Remote type name.
    pub fn kind(&self) -> &str {
        &self.inner.kind
    }

    /// Constructor arguments this instance was announced with.
    pub fn args(&self) -> &Value {
        &self.inner.args
    }

    /// Create (or re-create) the named reactive store.
    ///
    /// Registers the inbound handler for
    /// `store-value>{id}>{name}`; creating a store under an existing name
    /// replaces the previous handler rather than stacking a second one, so
    /// at most one handler exists per `(component, store)` pair.
    pub fn store(&self, name: &str, initial: Value) -> Store {
        let store = Store::new(self.inner.router.clone(), self.inner.id.clone(), name, initial);
        self.inner.stores.lock().insert(name.to_owned(), store.clone());
        store
    }

    /// Bind the named remote operation as a local async callable.
    pub fn rpc(&self, name: &str) -> RpcProxy {
        let proxy = RpcProxy::new(self.inner.router.clone(), self.inner.id.clone(), name);
        self.inner.rpcs.lock().insert(name.to_owned(), proxy.clone());
        proxy
    }

    /// Names of the stores created on this instance.
    pub fn store_names(&self) -> Vec<String> {
        self.inner.stores.lock().keys().cloned().collect()
    }

    /// Inbound topics owned by this instance's stores.
    pub(crate) fn store_topics(&self) -> Vec<Topic> {
        self.inner
            .stores
            .lock()
            .keys()
            .map(|name| Topic::store_value(&self.inner.id, name))
            .collect()
    }
}
