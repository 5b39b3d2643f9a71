//! Typed request/response bridge over a [`ChannelEnd`].
//!
//! ```text
//!   call(EP, input)                                   implement(EP, handler)
//!        │                                                     ▲
//!        ▼                                                     │
//!   pending[id] ◄── reader ◄── "EP_OUT" {id} ◄── server ── handler(input)
//!        │                                        ▲
//!        └────────────► "EP_IN" {id, input} ──────┘
//! ```
//!
//! Each context constructs one `Bridge` at startup and clones it to
//! whatever needs to issue or serve calls. Requests carry a correlation
//! id and replies are matched by id, so concurrent calls never
//! cross-resolve. Inbound requests are served one at a time, in arrival
//! order. Every call is bounded by a timeout and may be cancelled.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};
use uuid::Uuid;

use crate::channel::{ChannelEnd, ChannelError};
use crate::endpoint::Endpoint;
use crate::protocol::{decode_payload, encode_payload, Envelope, MessageKind, ProtocolError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Channel closed")]
    ChannelClosed,
    #[error("No response from '{endpoint}' within {timeout:?}")]
    Timeout {
        endpoint: &'static str,
        timeout: Duration,
    },
    #[error("Call to '{0}' was cancelled")]
    Cancelled(&'static str),
    #[error("A call to '{0}' is already in flight")]
    CallInFlight(&'static str),
    #[error("No handler implements '{0}'")]
    NotImplemented(String),
    #[error("Handler for '{endpoint}' failed: {message}")]
    Remote { endpoint: String, message: String },
    #[error("Reply for '{expected}' arrived on '{actual}'")]
    TopicMismatch {
        expected: &'static str,
        actual: String,
    },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<ChannelError> for BridgeError {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::Closed => BridgeError::ChannelClosed,
            ChannelError::Protocol(p) => BridgeError::Protocol(p),
        }
    }
}

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Context name used in log lines
    pub label: String,
    /// Timeout applied by [`Bridge::call`]; `None` waits forever
    pub default_timeout: Option<Duration>,
    /// Inbound requests buffered ahead of the handler loop
    pub request_queue: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            label: "bridge".to_string(),
            default_timeout: Some(Duration::from_secs(30)),
            request_queue: 64,
        }
    }
}

impl BridgeConfig {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Short timeouts for tests.
    pub fn for_testing(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            default_timeout: Some(Duration::from_secs(2)),
            request_queue: 16,
        }
    }
}

/// Bridge counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub requests_sent: u64,
    pub replies_received: u64,
    pub requests_served: u64,
    pub faults_sent: u64,
    pub unhandled: u64,
    pub timeouts: u64,
    pub orphaned_replies: u64,
}

#[derive(Default)]
struct AtomicBridgeStats {
    requests_sent: AtomicU64,
    replies_received: AtomicU64,
    requests_served: AtomicU64,
    faults_sent: AtomicU64,
    unhandled: AtomicU64,
    timeouts: AtomicU64,
    orphaned_replies: AtomicU64,
}

impl AtomicBridgeStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            replies_received: self.replies_received.load(Ordering::Relaxed),
            requests_served: self.requests_served.load(Ordering::Relaxed),
            faults_sent: self.faults_sent.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            orphaned_replies: self.orphaned_replies.load(Ordering::Relaxed),
        }
    }
}

/// Fault message sent when a request arrives while the request queue is full.
pub const BUSY_MESSAGE: &str = "bridge busy";

type BoxedHandler = Arc<dyn Fn(Vec<u8>) -> BoxFuture<'static, Result<Vec<u8>, String>> + Send + Sync>;

enum Reply {
    Payload(Vec<u8>),
    Fault(String),
    Unhandled,
}

struct PendingCall {
    endpoint: &'static str,
    tx: oneshot::Sender<Result<Reply, BridgeError>>,
}

struct Shared {
    config: BridgeConfig,
    outgoing: mpsc::Sender<Vec<u8>>,
    handlers: RwLock<HashMap<String, BoxedHandler>>,
    pending: Mutex<HashMap<Uuid, PendingCall>>,
    in_flight: Mutex<HashSet<&'static str>>,
    stats: AtomicBridgeStats,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    async fn send(&self, envelope: &Envelope) -> Result<(), BridgeError> {
        let frame = envelope.encode()?;
        self.outgoing
            .send(frame)
            .await
            .map_err(|_| BridgeError::ChannelClosed)
    }

    /// Route a reply to the call waiting on its correlation id.
    fn complete(&self, envelope: Envelope) {
        let Some(call) = lock(&self.pending).remove(&envelope.correlation_id) else {
            AtomicBridgeStats::bump(&self.stats.orphaned_replies);
            log::debug!(
                "[{}] Dropping reply {} on '{}' with no waiting call",
                self.config.label,
                envelope.correlation_id,
                envelope.topic
            );
            return;
        };

        AtomicBridgeStats::bump(&self.stats.replies_received);
        let reply = if envelope.endpoint() != call.endpoint {
            Err(BridgeError::TopicMismatch {
                expected: call.endpoint,
                actual: envelope.topic,
            })
        } else {
            match envelope.kind {
                MessageKind::Response => Ok(Reply::Payload(envelope.payload)),
                MessageKind::Fault => Ok(Reply::Fault(envelope.fault_message())),
                MessageKind::Unhandled => Ok(Reply::Unhandled),
                MessageKind::Request => Err(BridgeError::TopicMismatch {
                    expected: call.endpoint,
                    actual: envelope.topic,
                }),
            }
        };
        // The caller may have given up already.
        let _ = call.tx.send(reply);
    }

    /// Answer a request that found the request queue full. The reader
    /// never waits on the queue, so replies keep flowing while a slow
    /// handler runs.
    fn reject_busy(&self, request: &Envelope) {
        AtomicBridgeStats::bump(&self.stats.faults_sent);
        log::warn!(
            "[{}] Request queue full, rejecting '{}' ({})",
            self.config.label,
            request.topic,
            request.correlation_id
        );
        let fault = Envelope::fault(request.endpoint(), request.correlation_id, BUSY_MESSAGE);
        let sent = fault
            .encode()
            .map_err(BridgeError::from)
            .and_then(|frame| {
                self.outgoing
                    .try_send(frame)
                    .map_err(|_| BridgeError::ChannelClosed)
            });
        if let Err(e) = sent {
            log::error!("[{}] Could not reject '{}': {e}", self.config.label, request.topic);
        }
    }

    async fn handler(&self, endpoint: &str) -> Option<BoxedHandler> {
        self.handlers.read().await.get(endpoint).cloned()
    }
}

/// Removes the pending entry when a call finishes, times out, or is dropped.
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: Uuid,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(&self.shared.pending).remove(&self.id);
    }
}

/// Single-flight slot of an exclusive endpoint.
struct InFlightSlot<'a> {
    shared: &'a Shared,
    endpoint: &'static str,
}

impl<'a> InFlightSlot<'a> {
    fn acquire(shared: &'a Shared, endpoint: &'static str) -> Result<Self, BridgeError> {
        if !lock(&shared.in_flight).insert(endpoint) {
            return Err(BridgeError::CallInFlight(endpoint));
        }
        Ok(Self { shared, endpoint })
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        lock(&self.shared.in_flight).remove(self.endpoint);
    }
}

/// One context's end of the RPC bridge. Cheap to clone.
#[derive(Clone)]
pub struct Bridge {
    shared: Arc<Shared>,
}

impl Bridge {
    /// Attach a bridge to a channel end and start its reader and server
    /// tasks. Must be called from within a Tokio runtime.
    pub fn start(end: ChannelEnd, config: BridgeConfig) -> Self {
        let (outgoing, incoming) = end.into_parts();
        let (request_tx, request_rx) = mpsc::channel(config.request_queue.max(1));

        let shared = Arc::new(Shared {
            config,
            outgoing,
            handlers: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            stats: AtomicBridgeStats::default(),
        });

        tokio::spawn(read_loop(Arc::downgrade(&shared), incoming, request_tx));
        tokio::spawn(serve_loop(Arc::downgrade(&shared), request_rx));

        log::debug!("[{}] Bridge started", shared.config.label);
        Self { shared }
    }

    pub fn label(&self) -> &str {
        &self.shared.config.label
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// Register `handler` as the responder for `endpoint`, replacing any
    /// previous handler. An `Err` from the handler reaches the caller as
    /// [`BridgeError::Remote`].
    pub async fn implement<I, O, F, Fut, E>(&self, endpoint: &Endpoint<I, O>, handler: F)
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let name = endpoint.name();
        let handler = Arc::new(handler);
        let boxed: BoxedHandler = Arc::new(move |payload: Vec<u8>| {
            let handler = handler.clone();
            async move {
                let input: I = decode_payload(&payload).map_err(|e| e.to_string())?;
                let output = handler(input).await.map_err(|e| e.to_string())?;
                encode_payload(&output).map_err(|e| e.to_string())
            }
            .boxed()
        });

        let replaced = self
            .shared
            .handlers
            .write()
            .await
            .insert(name.to_string(), boxed)
            .is_some();
        if replaced {
            log::warn!("[{}] Handler for '{name}' replaced", self.label());
        } else {
            log::debug!("[{}] Handler for '{name}' registered", self.label());
        }
    }

    /// Call `endpoint` with the configured default timeout.
    pub async fn call<I, O>(&self, endpoint: &Endpoint<I, O>, input: &I) -> Result<O, BridgeError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        self.call_inner(
            endpoint,
            input,
            self.shared.config.default_timeout,
            std::future::pending(),
        )
        .await
    }

    /// Call `endpoint` with an explicit timeout (`None` waits forever).
    pub async fn call_with_timeout<I, O>(
        &self,
        endpoint: &Endpoint<I, O>,
        input: &I,
        timeout: Option<Duration>,
    ) -> Result<O, BridgeError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        self.call_inner(endpoint, input, timeout, std::future::pending())
            .await
    }

    /// Call `endpoint`, giving up with [`BridgeError::Cancelled`] as soon
    /// as `cancel` completes. A late reply is discarded.
    pub async fn call_until<I, O, C>(
        &self,
        endpoint: &Endpoint<I, O>,
        input: &I,
        cancel: C,
    ) -> Result<O, BridgeError>
    where
        I: Serialize,
        O: DeserializeOwned,
        C: Future<Output = ()>,
    {
        self.call_inner(endpoint, input, self.shared.config.default_timeout, cancel)
            .await
    }

    async fn call_inner<I, O, C>(
        &self,
        endpoint: &Endpoint<I, O>,
        input: &I,
        timeout: Option<Duration>,
        cancel: C,
    ) -> Result<O, BridgeError>
    where
        I: Serialize,
        O: DeserializeOwned,
        C: Future<Output = ()>,
    {
        let shared = &*self.shared;
        let name = endpoint.name();
        let _slot = if endpoint.is_exclusive() {
            Some(InFlightSlot::acquire(shared, name)?)
        } else {
            None
        };

        let payload = encode_payload(input)?;
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        lock(&shared.pending).insert(id, PendingCall { endpoint: name, tx });
        let _pending = PendingGuard { shared, id };

        // One deadline covers both the send and the reply.
        let exchange = async {
            shared.send(&Envelope::request(name, id, payload)).await?;
            AtomicBridgeStats::bump(&shared.stats.requests_sent);
            log::debug!("[{}] -> {name} ({id})", shared.config.label);
            let reply = rx.await.map_err(|_| BridgeError::ChannelClosed)??;
            Ok::<_, BridgeError>(reply)
        };

        let response = async {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, exchange).await {
                    Ok(reply) => reply,
                    Err(_) => {
                        AtomicBridgeStats::bump(&shared.stats.timeouts);
                        log::warn!(
                            "[{}] No response from '{name}' within {limit:?}",
                            shared.config.label
                        );
                        Err(BridgeError::Timeout {
                            endpoint: name,
                            timeout: limit,
                        })
                    }
                },
                None => exchange.await,
            }
        };

        let reply = tokio::select! {
            biased;
            reply = response => reply?,
            _ = cancel => {
                log::debug!("[{}] Call to '{name}' cancelled", shared.config.label);
                return Err(BridgeError::Cancelled(name));
            }
        };

        match reply {
            Reply::Payload(bytes) => Ok(decode_payload(&bytes)?),
            Reply::Fault(message) => Err(BridgeError::Remote {
                endpoint: name.to_string(),
                message,
            }),
            Reply::Unhandled => Err(BridgeError::NotImplemented(name.to_string())),
        }
    }

    /// Number of calls waiting for a reply.
    pub fn pending_calls(&self) -> usize {
        lock(&self.shared.pending).len()
    }

    pub fn stats(&self) -> BridgeStats {
        self.shared.stats.snapshot()
    }
}

/// Decode inbound frames: requests go to the server loop, replies resolve
/// pending calls. On channel close every pending call fails.
async fn read_loop(
    shared: Weak<Shared>,
    mut incoming: mpsc::Receiver<Vec<u8>>,
    requests: mpsc::Sender<Envelope>,
) {
    while let Some(frame) = incoming.recv().await {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let envelope = match Envelope::decode(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("[{}] Dropping undecodable frame: {e}", shared.config.label);
                continue;
            }
        };
        match envelope.kind {
            MessageKind::Request => match requests.try_send(envelope) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(request)) => shared.reject_busy(&request),
                Err(mpsc::error::TrySendError::Closed(_)) => return,
            },
            _ => shared.complete(envelope),
        }
    }

    if let Some(shared) = shared.upgrade() {
        let pending: Vec<_> = lock(&shared.pending).drain().collect();
        log::info!(
            "[{}] Channel closed, failing {} pending call(s)",
            shared.config.label,
            pending.len()
        );
        for (_, call) in pending {
            let _ = call.tx.send(Err(BridgeError::ChannelClosed));
        }
    }
}

/// Serve inbound requests strictly one after another.
async fn serve_loop(shared: Weak<Shared>, mut requests: mpsc::Receiver<Envelope>) {
    while let Some(request) = requests.recv().await {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let endpoint = request.endpoint().to_string();
        let id = request.correlation_id;

        let reply = match shared.handler(&endpoint).await {
            Some(handler) => match tokio::spawn(handler(request.payload)).await {
                Ok(Ok(payload)) => {
                    AtomicBridgeStats::bump(&shared.stats.requests_served);
                    Envelope::response(&endpoint, id, payload)
                }
                Ok(Err(message)) => {
                    AtomicBridgeStats::bump(&shared.stats.faults_sent);
                    log::warn!("[{}] Handler '{endpoint}' failed: {message}", shared.config.label);
                    Envelope::fault(&endpoint, id, &message)
                }
                Err(join_error) => {
                    AtomicBridgeStats::bump(&shared.stats.faults_sent);
                    log::error!("[{}] Handler '{endpoint}' panicked: {join_error}", shared.config.label);
                    Envelope::fault(&endpoint, id, "handler panicked")
                }
            },
            None => {
                AtomicBridgeStats::bump(&shared.stats.unhandled);
                log::warn!("[{}] No handler for '{endpoint}'", shared.config.label);
                Envelope::unhandled(&endpoint, id)
            }
        };

        if let Err(e) = shared.send(&reply).await {
            log::error!("[{}] Failed to reply on '{endpoint}': {e}", shared.config.label);
        }
    }
}
