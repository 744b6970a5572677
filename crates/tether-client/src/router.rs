//! Message router: transport owner and inbound-frame demultiplexer.
//!
//! The router is the only component that touches the transport. Its surface
//! is deliberately small: fire-and-forget [`Router::send`], correlated
//! [`Router::request`], and the handler registry
//! ([`Router::register_handler`] / [`Router::remove_handler`]). Stores, RPC
//! proxies, and the component registry are all built on these.
//!
//! # Inbound algorithm
//!
//! For each arriving frame, strictly in arrival order:
//!
//! 1. append it to the diagnostics buffer (malformed text is recorded as a
//!    malformed entry, then dropped);
//! 2. if a handler is registered for the frame's topic, invoke it with the
//!    payload;
//! 3. independently, if the frame's correlation id has a pending entry,
//!    resolve it with `(topic, payload)` and delete the entry.
//!
//! Steps 2 and 3 are independent: a single frame may both satisfy a topic
//! subscriber and complete a pending call. A frame matching neither is
//! ignored — transient races between handler registration and peer pushes
//! are expected and benign.
//!
//! # Handler registry
//!
//! One handler per exact topic string; registering over an existing topic
//! replaces the previous handler silently. Fan-out is achieved by giving
//! each logical subscriber a distinct topic suffix, not by multi-subscriber
//! dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng as _;
use rand::distributions::Alphanumeric;
use serde_json::Value;
use tether_proto::{CorrelationId, Frame, Topic, topics};
use tokio::sync::{Notify, oneshot};

use crate::diagnostics::{DiagnosticsBuffer, DiagnosticsConfig, Direction, FrameRecord, LogEntry};
use crate::error::{ClientError, Result};
use crate::queue::AsyncQueue;
use crate::transport::{Transport, TransportReceiver, TransportSender};

const CORRELATION_ID_LEN: usize = 12;

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// How long [`Router::connect`] waits for the `app-state` handshake
    /// frame after the transport opens.
    pub handshake_timeout: Duration,

    /// Optional deadline for correlated replies. `None` (the default)
    /// matches the base protocol: a pending call whose peer never replies
    /// waits forever.
    pub rpc_timeout: Option<Duration>,

    /// Diagnostics buffer bounds.
    pub diagnostics: DiagnosticsConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(30),
            rpc_timeout: None,
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

type Handler = Arc<dyn Fn(Value) + Send + Sync>;

struct RouterState {
    handlers: HashMap<Topic, Handler>,
    pending: HashMap<CorrelationId, oneshot::Sender<(Topic, Value)>>,
    diagnostics: DiagnosticsBuffer,
    connected: bool,
}

/// Owner of the transport connection.
///
/// Cheap to clone; every clone shares the same connection, handler registry,
/// pending-call table, and diagnostics buffer.
#[derive(Clone)]
pub struct Router {
    state: Arc<Mutex<RouterState>>,
    pub(crate) outbound: AsyncQueue<Frame>,
    shutdown: Arc<Notify>,
    config: Arc<RouterConfig>,
}

impl Router {
    /// Open `transport`, start the connection tasks, and complete the
    /// `app-state` handshake.
    ///
    /// Suspends until the transport opens and the one-shot `app-state` frame
    /// arrives, then yields the router and the application-state snapshot
    /// (which encodes whether the session is fresh or restored). Frames
    /// arriving before `app-state` are dispatched normally.
    ///
    /// # Errors
    ///
    /// [`ClientError::Transport`] if the transport fails to open,
    /// [`ClientError::ConnectionClosed`] if it closes during the handshake,
    /// [`ClientError::HandshakeTimeout`] if `app-state` never arrives.
    pub async fn connect<T: Transport>(transport: T, config: RouterConfig) -> Result<(Self, Value)> {
        let (sender, receiver) = transport.open().await?;
        let router = Self::detached(config);

        let (ready_sender, ready) = oneshot::channel();
        let slot = Mutex::new(Some(ready_sender));
        router.register_handler(Topic::from(topics::APP_STATE), move |payload| {
            if let Some(ready_sender) = slot.lock().take() {
                let _ = ready_sender.send(payload);
            }
        });

        router.spawn_writer(sender);
        router.spawn_reader(receiver);

        let limit = router.config.handshake_timeout;
        let app_state = match tokio::time::timeout(limit, ready).await {
            Ok(Ok(payload)) => payload,
            Ok(Err(_)) => return Err(ClientError::ConnectionClosed),
            Err(_) => return Err(ClientError::HandshakeTimeout(limit)),
        };

        // The handshake fires at most once per connection.
        router.remove_handler(&Topic::from(topics::APP_STATE));
        tracing::info!("connection established");
        Ok((router, app_state))
    }

    /// Router with live registries but no transport behind it. `connect`
    /// attaches the tasks; unit tests drive `dispatch_text` directly.
    pub(crate) fn detached(config: RouterConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(RouterState {
                handlers: HashMap::new(),
                pending: HashMap::new(),
                diagnostics: DiagnosticsBuffer::new(config.diagnostics.clone()),
                connected: true,
            })),
            outbound: AsyncQueue::new(),
            shutdown: Arc::new(Notify::new()),
            config: Arc::new(config),
        }
    }

    /// Send a frame, fire-and-forget. Returns the generated correlation id.
    ///
    /// Synchronous: the frame is recorded and enqueued immediately; a writer
    /// task drains the queue to the transport in order. Delivery
    /// confirmation, if any, is an application-level reply, not a transport
    /// ack.
    pub fn send(&self, topic: Topic, payload: Value) -> CorrelationId {
        let id = self.fresh_id();
        self.enqueue(Frame::new(Some(id.clone()), topic, payload));
        id
    }

    /// Send a frame that expects a correlated reply.
    ///
    /// The pending entry is created before the frame can reach the wire, so
    /// the reply cannot race the registration. Await the returned
    /// [`PendingReply`] for the `(topic, payload)` of the first frame
    /// bearing the same correlation id.
    pub fn request(&self, topic: Topic, payload: Value) -> PendingReply {
        let id = self.fresh_id();
        let (resolver, receiver) = oneshot::channel();
        self.state.lock().pending.insert(id.clone(), resolver);
        self.enqueue(Frame::new(Some(id.clone()), topic, payload));
        PendingReply { id, receiver, router: self.clone() }
    }

    /// Register `handler` for an exact topic string, replacing any existing
    /// handler for that topic.
    pub fn register_handler(&self, topic: Topic, handler: impl Fn(Value) + Send + Sync + 'static) {
        let mut state = self.state.lock();
        if state.handlers.insert(topic.clone(), Arc::new(handler)).is_some() {
            tracing::debug!(topic = %topic, "replaced existing topic handler");
        }
    }

    /// Remove the handler for `topic`, if any.
    pub fn remove_handler(&self, topic: &Topic) {
        self.state.lock().handlers.remove(topic);
    }

    /// Whether the transport is still up.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Snapshot of the diagnostics buffer, oldest entry first.
    pub fn diagnostics(&self) -> Vec<LogEntry> {
        self.state.lock().diagnostics.snapshot()
    }

    fn fresh_id(&self) -> CorrelationId {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(CORRELATION_ID_LEN)
            .map(char::from)
            .collect();
        CorrelationId::new(id)
    }

    fn enqueue(&self, frame: Frame) {
        {
            let mut state = self.state.lock();
            if !state.connected {
                tracing::warn!(topic = %frame.topic, "send on a disconnected router");
            }
            state.diagnostics.record(
                Direction::Sent,
                FrameRecord::Frame(frame.clone()),
                Instant::now(),
            );
        }
        self.outbound.put(frame);
    }

    /// Decode and dispatch one inbound message.
    pub(crate) fn dispatch_text(&self, text: &str) {
        let now = Instant::now();
        match Frame::decode(text) {
            Ok(frame) => self.dispatch(frame, now),
            Err(error) => {
                tracing::warn!(%error, "dropping malformed frame");
                self.state.lock().diagnostics.record(
                    Direction::Received,
                    FrameRecord::Malformed { raw: text.to_owned(), error: error.to_string() },
                    now,
                );
            }
        }
    }

    fn dispatch(&self, frame: Frame, now: Instant) {
        let Frame { id, topic, payload } = frame;
        let (handler, resolver) = {
            let mut state = self.state.lock();
            state.diagnostics.record(
                Direction::Received,
                FrameRecord::Frame(Frame::new(id.clone(), topic.clone(), payload.clone())),
                now,
            );
            let handler = state.handlers.get(&topic).cloned();
            let resolver = id.as_ref().and_then(|id| state.pending.remove(id));
            (handler, resolver)
        };

        // Handlers and resolvers run outside the lock so they may call back
        // into the router.
        match (handler, resolver) {
            (Some(handler), Some(resolver)) => {
                (*handler)(payload.clone());
                let _ = resolver.send((topic, payload));
            }
            (Some(handler), None) => (*handler)(payload),
            (None, Some(resolver)) => {
                let _ = resolver.send((topic, payload));
            }
            (None, None) => {
                tracing::trace!(topic = %topic, "no handler or pending call for frame");
            }
        }
    }

    fn spawn_writer(&self, mut sender: impl TransportSender) {
        let router = self.clone();
        tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    frame = router.outbound.get() => frame,
                    () = router.shutdown.notified() => break,
                };
                let text = match frame.encode() {
                    Ok(text) => text,
                    Err(error) => {
                        tracing::error!(%error, "dropping unencodable outbound frame");
                        continue;
                    }
                };
                if let Err(error) = sender.send(text).await {
                    tracing::warn!(%error, "transport write failed");
                    router.mark_disconnected();
                    break;
                }
            }
        });
    }

    fn spawn_reader(&self, mut receiver: impl TransportReceiver) {
        let router = self.clone();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(Some(text)) => router.dispatch_text(&text),
                    Ok(None) => {
                        tracing::info!("peer closed the connection");
                        break;
                    }
                    Err(error) => {
                        tracing::warn!(%error, "transport read failed");
                        break;
                    }
                }
            }
            router.mark_disconnected();
        });
    }

    fn mark_disconnected(&self) {
        let (handlers, pending) = {
            let mut state = self.state.lock();
            if !state.connected {
                return;
            }
            state.connected = false;
            (
                std::mem::take(&mut state.handlers),
                std::mem::take(&mut state.pending),
            )
        };
        // Dropping the resolvers fails every in-flight await with
        // ConnectionClosed; handlers from this connection are invalid and
        // must be re-established against a new router.
        drop(handlers);
        drop(pending);
        self.shutdown.notify_one();
        tracing::info!("router disconnected");
    }

    pub(crate) fn evict_pending(&self, id: &CorrelationId) {
        self.state.lock().pending.remove(id);
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }
}

/// An in-flight correlated call.
///
/// Dropping it abandons the call; the pending entry then lingers until the
/// reply arrives (and is discarded) or the connection closes.
pub struct PendingReply {
    id: CorrelationId,
    receiver: oneshot::Receiver<(Topic, Value)>,
    router: Router,
}

impl PendingReply {
    /// The correlation id carried by the sent frame.
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.id
    }

    /// Suspend until the correlated reply arrives.
    ///
    /// # Errors
    ///
    /// [`ClientError::ConnectionClosed`] if the transport closes first;
    /// [`ClientError::RpcTimeout`] if a reply deadline is configured and
    /// passes, in which case the pending entry is evicted and a later reply
    /// for this id is ignored as a dangling correlation.
    pub async fn await_reply(self) -> Result<(Topic, Value)> {
        let Self { id, receiver, router } = self;
        match router.config.rpc_timeout {
            None => receiver.await.map_err(|_| ClientError::ConnectionClosed),
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(Ok(reply)) => Ok(reply),
                Ok(Err(_)) => Err(ClientError::ConnectionClosed),
                Err(_) => {
                    router.evict_pending(&id);
                    Err(ClientError::RpcTimeout(limit))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn reply_text(id: &CorrelationId, topic: &str, payload: &Value) -> String {
        Frame::new(Some(id.clone()), Topic::from(topic), payload.clone())
            .encode()
            .unwrap()
    }

    #[test]
    fn send_uses_a_fresh_id_per_frame() {
        let router = Router::detached(RouterConfig::default());
        let first = router.send(Topic::from("t"), json!(1));
        let second = router.send(Topic::from("t"), json!(2));
        assert_ne!(first, second);

        let frame = router.outbound.try_get().unwrap();
        assert_eq!(frame.id, Some(first));
        let frame = router.outbound.try_get().unwrap();
        assert_eq!(frame.id, Some(second));
    }

    #[test]
    fn handler_receives_payload() {
        let router = Router::detached(RouterConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        router.register_handler(Topic::from("greet"), move |payload| {
            sink.lock().push(payload);
        });

        router.dispatch_text(r#"[null, "greet", "hi"]"#);
        assert_eq!(seen.lock().clone(), vec![json!("hi")]);
    }

    #[test]
    fn second_registration_replaces_the_first() {
        let router = Router::detached(RouterConfig::default());
        let first_hits = Arc::new(AtomicUsize::new(0));
        let second_hits = Arc::new(AtomicUsize::new(0));

        let hits = Arc::clone(&first_hits);
        router.register_handler(Topic::from("t"), move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        let hits = Arc::clone(&second_hits);
        router.register_handler(Topic::from("t"), move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        router.dispatch_text(r#"[null, "t", 1]"#);
        assert_eq!(first_hits.load(Ordering::SeqCst), 0);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removed_handler_no_longer_fires() {
        let router = Router::detached(RouterConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        router.register_handler(Topic::from("t"), move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        router.remove_handler(&Topic::from("t"));

        router.dispatch_text(r#"[null, "t", 1]"#);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reply_resolves_pending_call_exactly_once() {
        let router = Router::detached(RouterConfig::default());
        let pending = router.request(Topic::from("exec-rpc"), json!(["c1", "inc", []]));
        let id = pending.correlation_id().clone();
        assert_eq!(router.pending_len(), 1);

        // The sent frame carries the same id the reply will resolve.
        let sent = router.outbound.try_get().unwrap();
        assert_eq!(sent.id.as_ref(), Some(&id));

        router.dispatch_text(&reply_text(&id, "rpc-result", &json!(1)));
        assert_eq!(router.pending_len(), 0);

        let (topic, payload) = pending.await_reply().await.unwrap();
        assert_eq!(topic.as_str(), "rpc-result");
        assert_eq!(payload, json!(1));

        // A second frame with the same id is a dangling correlation: ignored.
        router.dispatch_text(&reply_text(&id, "rpc-result", &json!(2)));
        assert_eq!(router.pending_len(), 0);
    }

    #[tokio::test]
    async fn one_frame_can_satisfy_handler_and_pending_call() {
        let router = Router::detached(RouterConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        router.register_handler(Topic::from("status"), move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        let pending = router.request(Topic::from("status"), json!(null));
        let id = pending.correlation_id().clone();
        router.dispatch_text(&reply_text(&id, "status", &json!("ready")));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        let (_, payload) = pending.await_reply().await.unwrap();
        assert_eq!(payload, json!("ready"));
    }

    #[test]
    fn malformed_frames_are_recorded_then_dropped() {
        let router = Router::detached(RouterConfig::default());
        router.dispatch_text("not json");
        router.dispatch_text(r#"["only-two", "elements"]"#);
        // Processing continues for subsequent frames.
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        router.register_handler(Topic::from("t"), move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        router.dispatch_text(r#"[null, "t", 1]"#);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        let log = router.diagnostics();
        assert_eq!(log.len(), 3);
        assert!(matches!(log[0].record, FrameRecord::Malformed { .. }));
        assert!(matches!(log[1].record, FrameRecord::Malformed { .. }));
        assert!(matches!(log[2].record, FrameRecord::Frame(_)));
    }

    #[test]
    fn unroutable_frames_are_ignored() {
        let router = Router::detached(RouterConfig::default());
        // No handler, no pending call: must not crash, must still be logged.
        router.dispatch_text(r#"["x", "store-value>gone>count", 5]"#);
        assert_eq!(router.diagnostics().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rpc_timeout_evicts_the_pending_entry() {
        let config =
            RouterConfig { rpc_timeout: Some(Duration::from_millis(50)), ..RouterConfig::default() };
        let router = Router::detached(config);
        let pending = router.request(Topic::from("exec-rpc"), json!(["c1", "slow", []]));
        let id = pending.correlation_id().clone();

        let result = pending.await_reply().await;
        assert!(matches!(result, Err(ClientError::RpcTimeout(_))));
        assert_eq!(router.pending_len(), 0);

        // The late reply is a dangling correlation: ignored without effect.
        router.dispatch_text(&reply_text(&id, "rpc-result", &json!(1)));
        assert_eq!(router.pending_len(), 0);
    }
}
