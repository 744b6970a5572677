//! Remote operations as local async calls.

use serde_json::Value;
use tether_proto::{ComponentId, ExecRpc, RpcReply, Topic, topics};

use crate::error::{ClientError, Result};
use crate::router::Router;

/// A local callable bound to one remote operation of one component.
///
/// Each invocation sends `exec-rpc(id, name, args)` and suspends on the
/// correlated reply. Clones share the same binding and may call
/// concurrently; every call gets its own correlation id.
#[derive(Clone)]
pub struct RpcProxy {
    router: Router,
    component_id: ComponentId,
    name: String,
}

impl RpcProxy {
    pub(crate) fn new(router: Router, component_id: ComponentId, name: &str) -> Self {
        Self { router, component_id, name: name.to_owned() }
    }

    /// Name of the remote operation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the remote operation.
    ///
    /// Resolves to the reply payload's content. A reply carrying the error
    /// envelope surfaces as [`ClientError::RemoteOperation`]; transport loss
    /// mid-call surfaces as [`ClientError::ConnectionClosed`].
    pub async fn call(&self, args: Vec<Value>) -> Result<Value> {
        let payload = ExecRpc {
            id: self.component_id.clone(),
            rpc: self.name.clone(),
            args,
        }
        .into_payload();
        let pending = self.router.request(Topic::from(topics::EXEC_RPC), payload);
        tracing::debug!(
            component = %self.component_id,
            rpc = %self.name,
            id = %pending.correlation_id(),
            "exec-rpc"
        );

        let (_topic, reply) = pending.await_reply().await?;
        match RpcReply::from_payload(reply) {
            RpcReply::Ok(value) => Ok(value),
            RpcReply::Err(err) => {
                Err(ClientError::RemoteOperation { kind: err.kind, message: err.message })
            }
        }
    }
}
