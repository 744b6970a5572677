//! Scripted peer contract tests.
//!
//! Verifies the harness peer against the server's observable framing
//! contract: greeting, mirror bookkeeping, shadow store writes, and RPC
//! reply shapes.

use serde_json::json;
use tether_client::{ComponentRegistry, Origin, Router, RouterConfig};
use tether_harness::{SimServer, memory_pair};
use tether_proto::{ComponentId, RpcReply};

#[tokio::test]
async fn greeting_is_the_first_frame() {
    let (transport, peer) = memory_pair();
    let (server, handle) = SimServer::new(peer, json!({"restored": false}));
    tokio::spawn(server.run());

    let (_router, state) = Router::connect(transport, RouterConfig::default())
        .await
        .unwrap();
    assert_eq!(state, json!({"restored": false}));
    handle.close();
}

#[tokio::test]
async fn mirrors_follow_announcements_and_shadow_writes() {
    let (transport, peer) = memory_pair();
    let (mut server, handle) = SimServer::new(peer, json!(null));
    server.on_rpc("noop", |_, _| RpcReply::Ok(json!(null)));
    tokio::spawn(server.run());

    let (router, _state) = Router::connect(transport, RouterConfig::default())
        .await
        .unwrap();
    let registry = ComponentRegistry::new(router);
    let component = registry
        .create(
            ComponentId::new("c1"),
            ComponentId::root(),
            "Counter",
            json!({"start": 0}),
            Origin::Local,
        )
        .unwrap();
    let store = component.store("count", json!(0));
    store.set(json!(42));

    // An RPC round-trip is the ordering barrier: every earlier frame on the
    // stream has been processed once the reply is in.
    component.rpc("noop").call(vec![]).await.unwrap();

    let mirrors = handle.snapshot().await;
    let mirror = mirrors.get(&ComponentId::new("c1")).unwrap();
    assert_eq!(mirror.kind, "Counter");
    assert_eq!(mirror.parent_id, ComponentId::root());
    assert_eq!(mirror.args, json!({"start": 0}));
    assert_eq!(mirror.stores.get("count"), Some(&json!(42)));

    registry.destroy(&ComponentId::new("c1")).unwrap();
    // Barrier again: destroy-component precedes this call on the stream.
    let probe = registry
        .create(
            ComponentId::new("c2"),
            ComponentId::root(),
            "Counter",
            json!({}),
            Origin::Local,
        )
        .unwrap();
    probe.rpc("noop").call(vec![]).await.unwrap();

    let mirrors = handle.snapshot().await;
    assert!(!mirrors.contains_key(&ComponentId::new("c1")));
    assert!(mirrors.contains_key(&ComponentId::new("c2")));
    handle.close();
}

#[tokio::test]
async fn rpc_handler_sees_target_and_arguments() {
    let (transport, peer) = memory_pair();
    let (mut server, handle) = SimServer::new(peer, json!(null));
    server.on_rpc("add", |component, args| {
        let total: i64 = args.iter().filter_map(serde_json::Value::as_i64).sum();
        RpcReply::Ok(json!({"target": component.as_str(), "total": total}))
    });
    tokio::spawn(server.run());

    let (router, _state) = Router::connect(transport, RouterConfig::default())
        .await
        .unwrap();
    let registry = ComponentRegistry::new(router);
    let component = registry
        .create(
            ComponentId::new("c1"),
            ComponentId::root(),
            "Counter",
            json!({}),
            Origin::Local,
        )
        .unwrap();

    let result = component.rpc("add").call(vec![json!(2), json!(3)]).await.unwrap();
    assert_eq!(result, json!({"target": "c1", "total": 5}));
    handle.close();
}

#[tokio::test]
async fn server_side_close_disconnects_the_client() {
    let (transport, peer) = memory_pair();
    let (server, handle) = SimServer::new(peer, json!(null));
    tokio::spawn(server.run());

    let (router, _state) = Router::connect(transport, RouterConfig::default())
        .await
        .unwrap();
    assert!(router.is_connected());

    handle.close();
    while router.is_connected() {
        tokio::task::yield_now().await;
    }
}
