//! Scripted peer speaking the server's observable framing contract.
//!
//! [`SimServer`] mirrors the behavior the real server exposes on the wire:
//! it greets a new connection with `app-state`, materializes mirrors for
//! `add-component`, applies `store-set` to mirror state without echoing a
//! `store-value` back, executes registered handlers for `exec-rpc` and
//! replies on `rpc-result` with the caller's correlation id, and can push
//! `store-value` frames at any time via its handle.

use std::collections::HashMap;

use serde_json::Value;
use tether_proto::{
    AddComponent, ComponentId, CorrelationId, DestroyComponent, ExecRpc, Frame, RemoteError,
    RpcReply, StoreSet, Topic, topics,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

use crate::memory::PeerEndpoint;

/// Handler for one named remote operation.
pub type RpcHandler = Box<dyn FnMut(&ComponentId, Vec<Value>) -> RpcReply + Send>;

/// Mirror of one client-announced component instance.
#[derive(Debug, Clone)]
pub struct MirrorComponent {
    /// Owning instance id.
    pub parent_id: ComponentId,
    /// Remote type name.
    pub kind: String,
    /// Constructor arguments.
    pub args: Value,
    /// Last client-pushed value per store.
    pub stores: HashMap<String, Value>,
}

enum Command {
    PushStore { component: ComponentId, store: String, value: Value },
    SendFrame(Frame),
    Snapshot(oneshot::Sender<HashMap<ComponentId, MirrorComponent>>),
    Close,
}

/// Scripted server peer for one connection.
pub struct SimServer {
    endpoint: PeerEndpoint,
    app_state: Value,
    components: HashMap<ComponentId, MirrorComponent>,
    rpc_handlers: HashMap<String, RpcHandler>,
    commands: UnboundedReceiver<Command>,
}

/// Handle for steering a running [`SimServer`].
#[derive(Clone)]
pub struct SimServerHandle {
    commands: UnboundedSender<Command>,
}

impl SimServer {
    /// Peer over `endpoint` that will greet the client with `app_state`.
    pub fn new(endpoint: PeerEndpoint, app_state: Value) -> (Self, SimServerHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                endpoint,
                app_state,
                components: HashMap::new(),
                rpc_handlers: HashMap::new(),
                commands: receiver,
            },
            SimServerHandle { commands: sender },
        )
    }

    /// Register the handler for one rpc name (any target component).
    pub fn on_rpc(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&ComponentId, Vec<Value>) -> RpcReply + Send + 'static,
    ) {
        self.rpc_handlers.insert(name.into(), Box::new(handler));
    }

    /// Run the peer until the client goes away or the handle closes it.
    pub async fn run(mut self) {
        let greeting = Frame::new(None, Topic::from(topics::APP_STATE), self.app_state.clone());
        if !self.endpoint.send_frame(&greeting) {
            return;
        }
        loop {
            tokio::select! {
                frame = self.endpoint.recv_frame() => {
                    match frame {
                        Some(frame) => self.handle_frame(frame),
                        None => break,
                    }
                }
                command = self.commands.recv() => {
                    match command {
                        Some(Command::PushStore { component, store, value }) => {
                            let topic = Topic::store_value(&component, &store);
                            let _ = self.endpoint.send_frame(&Frame::new(None, topic, value));
                        }
                        Some(Command::SendFrame(frame)) => {
                            let _ = self.endpoint.send_frame(&frame);
                        }
                        Some(Command::Snapshot(reply)) => {
                            let _ = reply.send(self.components.clone());
                        }
                        Some(Command::Close) | None => break,
                    }
                }
            }
        }
    }

    fn handle_frame(&mut self, frame: Frame) {
        let Frame { id, topic, payload } = frame;
        match topic.as_str() {
            topics::ADD_COMPONENT => match AddComponent::from_payload(payload) {
                Ok(add) => {
                    self.components.insert(
                        add.id,
                        MirrorComponent {
                            parent_id: add.parent_id,
                            kind: add.kind,
                            args: add.args,
                            stores: HashMap::new(),
                        },
                    );
                }
                Err(error) => tracing::warn!(%error, "peer dropping bad add-component"),
            },
            topics::DESTROY_COMPONENT => match DestroyComponent::from_payload(payload) {
                Ok(destroy) => {
                    self.components.remove(&destroy.id);
                }
                Err(error) => tracing::warn!(%error, "peer dropping bad destroy-component"),
            },
            topics::STORE_SET => match StoreSet::from_payload(payload) {
                Ok(set) => match self.components.get_mut(&set.id) {
                    // Shadow write: the mirror is updated without echoing a
                    // store-value back.
                    Some(mirror) => {
                        mirror.stores.insert(set.store, set.value);
                    }
                    None => {
                        tracing::warn!(component = %set.id, "store-set for unknown component");
                    }
                },
                Err(error) => tracing::warn!(%error, "peer dropping bad store-set"),
            },
            topics::EXEC_RPC => self.handle_rpc(id, payload),
            other => tracing::debug!(topic = other, "peer ignoring frame"),
        }
    }

    fn handle_rpc(&mut self, id: Option<CorrelationId>, payload: Value) {
        let call = match ExecRpc::from_payload(payload) {
            Ok(call) => call,
            Err(error) => {
                tracing::warn!(%error, "peer dropping bad exec-rpc");
                return;
            }
        };
        let reply = match self.rpc_handlers.get_mut(&call.rpc) {
            Some(handler) => handler(&call.id, call.args),
            None => RpcReply::Err(RemoteError {
                kind: "AttributeError".to_owned(),
                message: format!("no rpc named {:?}", call.rpc),
            }),
        };
        let frame = Frame::new(id, Topic::from(topics::RPC_RESULT), reply.into_payload());
        let _ = self.endpoint.send_frame(&frame);
    }
}

impl SimServerHandle {
    /// Push a store value to the client.
    pub fn push_store(&self, component: &ComponentId, store: &str, value: Value) {
        let _ = self.commands.send(Command::PushStore {
            component: component.clone(),
            store: store.to_owned(),
            value,
        });
    }

    /// Send an arbitrary frame to the client.
    pub fn send_frame(&self, frame: Frame) {
        let _ = self.commands.send(Command::SendFrame(frame));
    }

    /// Snapshot of the peer's component mirrors.
    pub async fn snapshot(&self) -> HashMap<ComponentId, MirrorComponent> {
        let (sender, receiver) = oneshot::channel();
        if self.commands.send(Command::Snapshot(sender)).is_err() {
            return HashMap::new();
        }
        receiver.await.unwrap_or_default()
    }

    /// Stop the peer, closing the connection from the server side.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}
