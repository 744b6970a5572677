//! Live component instances and their lifecycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tether_proto::{AddComponent, ComponentId, DestroyComponent, Topic, topics};

use crate::component::Component;
use crate::error::{ClientError, Result};
use crate::router::Router;

/// How a component instance came into being.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Created on this side; creation is announced so the peer materializes
    /// its mirror.
    Local,
    /// Mirror of a peer-initiated instance; no announcement is sent.
    Peer,
}

#[derive(Default)]
struct RegistryState {
    live: HashMap<ComponentId, Component>,
    retired: HashSet<ComponentId>,
}

/// Tracker of every live component instance in the session.
///
/// Invariant: the live map's keys are exactly the ids for which neither
/// local nor peer-initiated destruction has completed, and a destroyed id is
/// never accepted again. Clones share the same registry.
#[derive(Clone)]
pub struct ComponentRegistry {
    router: Router,
    state: Arc<Mutex<RegistryState>>,
}

impl ComponentRegistry {
    /// Registry bound to one router lifecycle.
    ///
    /// After a disconnect, a fresh registry is created against the new
    /// router; instances from the old connection are not carried over.
    pub fn new(router: Router) -> Self {
        Self { router, state: Arc::new(Mutex::new(RegistryState::default())) }
    }

    /// Construct a component instance.
    ///
    /// With [`Origin::Local`] the creation is announced to the peer via
    /// `add-component`.
    ///
    /// # Errors
    ///
    /// [`ClientError::DuplicateComponent`] if the id is live,
    /// [`ClientError::RetiredComponent`] if it belonged to a destroyed
    /// instance.
    pub fn create(
        &self,
        id: ComponentId,
        parent_id: ComponentId,
        kind: impl Into<String>,
        args: Value,
        origin: Origin,
    ) -> Result<Component> {
        let kind = kind.into();
        let mut state = self.state.lock();
        if state.live.contains_key(&id) {
            return Err(ClientError::DuplicateComponent(id));
        }
        if state.retired.contains(&id) {
            return Err(ClientError::RetiredComponent(id));
        }

        let component = Component::new(
            self.router.clone(),
            id.clone(),
            parent_id.clone(),
            kind.clone(),
            args.clone(),
        );
        if origin == Origin::Local {
            self.router.send(
                Topic::from(topics::ADD_COMPONENT),
                AddComponent { id: id.clone(), parent_id, kind, args }.into_payload(),
            );
        }
        state.live.insert(id, component.clone());
        tracing::debug!(component = %component.id(), origin = ?origin, "created component");
        Ok(component)
    }

    /// Destroy a live instance.
    ///
    /// Removes every topic handler owned by the instance's stores, announces
    /// `destroy-component`, and retires the id for the rest of the session.
    ///
    /// # Errors
    ///
    /// [`ClientError::UnknownComponent`] if no live instance has this id.
    pub fn destroy(&self, id: &ComponentId) -> Result<()> {
        let component = {
            let mut state = self.state.lock();
            let component = state
                .live
                .remove(id)
                .ok_or_else(|| ClientError::UnknownComponent(id.clone()))?;
            state.retired.insert(id.clone());
            component
        };

        for topic in component.store_topics() {
            self.router.remove_handler(&topic);
        }
        self.router.send(
            Topic::from(topics::DESTROY_COMPONENT),
            DestroyComponent { id: id.clone() }.into_payload(),
        );
        tracing::debug!(component = %id, "destroyed component");
        Ok(())
    }

    /// Look up a live instance.
    pub fn get(&self, id: &ComponentId) -> Option<Component> {
        self.state.lock().live.get(id).cloned()
    }

    /// Whether the id belongs to a live instance.
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.state.lock().live.contains_key(id)
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Whether no instances are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The router this registry announces through.
    pub fn router(&self) -> &Router {
        &self.router
    }
}
