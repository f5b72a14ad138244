//! # Event Bus
//!
//! In-process fan-out pub/sub. One listener table serves both the dynamic
//! (string name + JSON value) and the typed (serde-checked) entry points, so
//! delivery-order guarantees hold no matter which API registered a handler.
//!
//! ## Concurrency
//!
//! The listener table lives behind a `parking_lot::RwLock`. Emission
//! snapshots the handler list and releases the lock before invoking anything,
//! so handlers may freely re-enter the bus (subscribe, unsubscribe, emit)
//! without deadlocking. `once` handlers carry an atomic fired flag, which
//! keeps the at-most-once guarantee even under reentrant emission.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, trace};

/// Errors from bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus was disconnected; reconnect before use.
    #[error("Event bus disconnected")]
    Disconnected,

    /// A typed payload could not be serialized for the wire.
    #[error("Payload serialization failed: {0}")]
    Serialize(String),
}

/// Errors a handler reports back to the bus.
///
/// Handler failures are isolated per handler: the bus logs them and keeps
/// delivering to the remaining subscribers. They never reach the emitter.
#[derive(Debug, Error, Clone)]
pub enum HandlerError {
    /// The handler's own processing failed.
    #[error("{0}")]
    Failed(String),

    /// The payload did not match the handler's expected shape.
    #[error("Payload decode failed: {0}")]
    Decode(String),
}

/// Identifier for one registered handler.
///
/// Closures have no identity in Rust, so subscriptions are keyed by the id
/// handed out at registration; `off` removes by id. Every registration is a
/// distinct entry by construction, which is how the "no duplicate delivery
/// for one registration" invariant is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type HandlerFuture = BoxFuture<'static, Result<(), HandlerError>>;

/// A subscriber callback.
///
/// Wraps both synchronous and asynchronous handlers behind one callable;
/// synchronous work runs inline during `emit`, asynchronous completions are
/// what `emit_async` waits on.
#[derive(Clone)]
pub struct EventHandler {
    func: Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>,
}

impl EventHandler {
    /// Wrap a synchronous handler.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(move |value| {
                let result = f(value);
                Box::pin(async move { result })
            }),
        }
    }

    /// Wrap an asynchronous handler.
    pub fn new_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self {
            func: Arc::new(move |value| Box::pin(f(value))),
        }
    }

    fn call(&self, value: Value) -> HandlerFuture {
        (self.func)(value)
    }
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventHandler")
    }
}

/// One row of the listener table.
#[derive(Clone)]
struct HandlerEntry {
    id: HandlerId,
    handler: EventHandler,
    once: bool,
    /// Set on first delivery for `once` entries; checked before every
    /// delivery so reentrant emission cannot fire the handler twice.
    fired: Arc<AtomicBool>,
}

/// The bus contract services are wired against.
///
/// `emit` is fire-and-forget: it never awaits handler completions.
/// `emit_async` returns only once every handler's completion has settled.
/// Callers pick `emit` precisely when they want no backpressure; both entry
/// points must stay distinct.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Register a handler. Returns the id used to remove it.
    fn on(&self, event: &str, handler: EventHandler) -> Result<HandlerId, BusError>;

    /// Register a handler that is removed after its first delivery.
    fn once(&self, event: &str, handler: EventHandler) -> Result<HandlerId, BusError>;

    /// Remove one handler. Returns whether anything was removed.
    fn off(&self, event: &str, id: HandlerId) -> bool;

    /// Synchronous best-effort fan-out in registration order.
    ///
    /// Returns the number of handlers the event was delivered to. Zero
    /// subscribers is a silent no-op. A failing handler is logged and does
    /// not stop delivery to the rest. Must be called from within a Tokio
    /// runtime (asynchronous completions are spawned).
    fn emit(&self, event: &str, data: Value) -> Result<usize, BusError>;

    /// Fan-out that awaits every handler's completion before returning.
    ///
    /// Handler failures are still isolated and logged; they do not fail the
    /// overall call.
    async fn emit_async(&self, event: &str, data: Value) -> Result<usize, BusError>;

    /// Clear one event's handlers, or all of them.
    fn remove_all_listeners(&self, event: Option<&str>);

    /// Number of handlers currently registered for an event.
    fn listener_count(&self, event: &str) -> usize;

    /// Names that currently have at least one handler.
    fn event_names(&self) -> Vec<String>;

    /// Mark the bus usable.
    async fn connect(&self);

    /// Clear all listeners and mark the bus unusable until `connect`.
    async fn disconnect(&self);

    fn is_connected(&self) -> bool;
}

/// In-memory implementation of the event bus.
///
/// Suitable for single-process operation; distributed deployments would use
/// a different implementation behind the same trait (e.g., Redis, NATS).
pub struct InProcessEventBus {
    /// Listener table: event name → handlers in registration order.
    listeners: RwLock<HashMap<String, Vec<HandlerEntry>>>,

    /// Lifecycle flag; a fresh bus starts connected.
    connected: AtomicBool,

    /// Source for handler ids, unique per bus.
    next_id: AtomicU64,
}

impl InProcessEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
        }
    }

    fn ensure_connected(&self) -> Result<(), BusError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BusError::Disconnected)
        }
    }

    fn register(&self, event: &str, handler: EventHandler, once: bool) -> Result<HandlerId, BusError> {
        self.ensure_connected()?;
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = HandlerEntry {
            id,
            handler,
            once,
            fired: Arc::new(AtomicBool::new(false)),
        };
        self.listeners
            .write()
            .entry(event.to_string())
            .or_default()
            .push(entry);
        trace!(event = %event, once = once, "Handler registered");
        Ok(id)
    }

    /// Snapshot the handler list so invocation happens without the lock held.
    fn snapshot(&self, event: &str) -> Vec<HandlerEntry> {
        self.listeners
            .read()
            .get(event)
            .map(|entries| entries.to_vec())
            .unwrap_or_default()
    }

    /// Drop `once` entries that have fired; removes the key when emptied.
    fn prune_fired(&self, event: &str) {
        let mut table = self.listeners.write();
        if let Some(entries) = table.get_mut(event) {
            entries.retain(|e| !(e.once && e.fired.load(Ordering::SeqCst)));
            if entries.is_empty() {
                table.remove(event);
            }
        }
    }

    /// Claim deliverable entries from a snapshot, consuming `once` slots.
    fn claim(snapshot: &[HandlerEntry]) -> Vec<HandlerEntry> {
        snapshot
            .iter()
            .filter(|entry| !entry.once || !entry.fired.swap(true, Ordering::SeqCst))
            .cloned()
            .collect()
    }
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InProcessEventBus {
    fn on(&self, event: &str, handler: EventHandler) -> Result<HandlerId, BusError> {
        self.register(event, handler, false)
    }

    fn once(&self, event: &str, handler: EventHandler) -> Result<HandlerId, BusError> {
        self.register(event, handler, true)
    }

    fn off(&self, event: &str, id: HandlerId) -> bool {
        let mut table = self.listeners.write();
        let Some(entries) = table.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            table.remove(event);
        }
        removed
    }

    fn emit(&self, event: &str, data: Value) -> Result<usize, BusError> {
        self.ensure_connected()?;
        let claimed = Self::claim(&self.snapshot(event));
        if claimed.is_empty() {
            trace!(event = %event, "Event emitted with no subscribers");
            return Ok(0);
        }

        let had_once = claimed.iter().any(|e| e.once);
        for entry in &claimed {
            // Synchronous handler work runs here; async completions are
            // detached so emit never awaits.
            let completion = entry.handler.call(data.clone());
            let event_name = event.to_string();
            tokio::spawn(async move {
                if let Err(e) = completion.await {
                    error!(event = %event_name, error = %e, "Event handler failed");
                }
            });
        }
        if had_once {
            self.prune_fired(event);
        }

        debug!(event = %event, delivered = claimed.len(), "Event emitted");
        Ok(claimed.len())
    }

    async fn emit_async(&self, event: &str, data: Value) -> Result<usize, BusError> {
        self.ensure_connected()?;
        let claimed = Self::claim(&self.snapshot(event));
        if claimed.is_empty() {
            trace!(event = %event, "Event emitted with no subscribers");
            return Ok(0);
        }

        let had_once = claimed.iter().any(|e| e.once);
        let completions: Vec<_> = claimed
            .iter()
            .map(|entry| {
                let completion = entry.handler.call(data.clone());
                let event_name = event.to_string();
                async move {
                    if let Err(e) = completion.await {
                        error!(event = %event_name, error = %e, "Event handler failed");
                    }
                }
            })
            .collect();
        join_all(completions).await;

        if had_once {
            self.prune_fired(event);
        }

        debug!(event = %event, delivered = claimed.len(), "Event emitted (awaited)");
        Ok(claimed.len())
    }

    fn remove_all_listeners(&self, event: Option<&str>) {
        let mut table = self.listeners.write();
        match event {
            Some(name) => {
                table.remove(name);
            }
            None => table.clear(),
        }
    }

    fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    fn event_names(&self) -> Vec<String> {
        self.listeners.read().keys().cloned().collect()
    }

    async fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.listeners.write().clear();
        debug!("Event bus disconnected, listener table cleared");
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Typed entry points over any [`EventBus`].
///
/// Both paths funnel into the same listener table, so typed and dynamic
/// subscribers of one event share a single delivery order.
pub trait TypedBus: EventBus {
    /// Emit a serde-serializable payload.
    fn emit_typed<T: serde::Serialize>(&self, event: &str, data: &T) -> Result<usize, BusError> {
        let value = serde_json::to_value(data).map_err(|e| BusError::Serialize(e.to_string()))?;
        self.emit(event, value)
    }

    /// Register a handler that receives a decoded payload.
    ///
    /// A payload that fails to decode is reported as a handler failure and
    /// isolated like any other.
    fn on_typed<T, F>(&self, event: &str, f: F) -> Result<HandlerId, BusError>
    where
        T: serde::de::DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.on(event, typed_handler(f))
    }

    /// `on_typed`, removed after the first delivery.
    fn once_typed<T, F>(&self, event: &str, f: F) -> Result<HandlerId, BusError>
    where
        T: serde::de::DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.once(event, typed_handler(f))
    }
}

impl<B: EventBus + ?Sized> TypedBus for B {}

fn typed_handler<T, F>(f: F) -> EventHandler
where
    T: serde::de::DeserializeOwned + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    EventHandler::new(move |value| {
        let decoded: T =
            serde_json::from_value(value).map_err(|e| HandlerError::Decode(e.to_string()))?;
        f(decoded);
        Ok(())
    })
}

/// Bus double that records every emission, for wiring environments that
/// swap the real bus out (`all-mock` configurations) and for assertions in
/// tests. Delegates delivery to an inner [`InProcessEventBus`], so attached
/// handlers still fire.
pub struct RecordingEventBus {
    inner: InProcessEventBus,
    emitted: RwLock<Vec<(String, Value)>>,
}

impl RecordingEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: InProcessEventBus::new(),
            emitted: RwLock::new(Vec::new()),
        }
    }

    /// All recorded `(event, payload)` pairs, in emission order.
    #[must_use]
    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.emitted.read().clone()
    }

    /// Recorded payloads for one event name.
    #[must_use]
    pub fn emitted_named(&self, event: &str) -> Vec<Value> {
        self.emitted
            .read()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub fn clear_recorded(&self) {
        self.emitted.write().clear();
    }

    fn record(&self, event: &str, data: &Value) {
        self.emitted.write().push((event.to_string(), data.clone()));
    }
}

impl Default for RecordingEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    fn on(&self, event: &str, handler: EventHandler) -> Result<HandlerId, BusError> {
        self.inner.on(event, handler)
    }

    fn once(&self, event: &str, handler: EventHandler) -> Result<HandlerId, BusError> {
        self.inner.once(event, handler)
    }

    fn off(&self, event: &str, id: HandlerId) -> bool {
        self.inner.off(event, id)
    }

    fn emit(&self, event: &str, data: Value) -> Result<usize, BusError> {
        self.record(event, &data);
        self.inner.emit(event, data)
    }

    async fn emit_async(&self, event: &str, data: Value) -> Result<usize, BusError> {
        self.record(event, &data);
        self.inner.emit_async(event, data).await
    }

    fn remove_all_listeners(&self, event: Option<&str>) {
        self.inner.remove_all_listeners(event);
    }

    fn listener_count(&self, event: &str) -> usize {
        self.inner.listener_count(event)
    }

    fn event_names(&self) -> Vec<String> {
        self.inner.event_names()
    }

    async fn connect(&self) {
        self.inner.connect().await;
    }

    async fn disconnect(&self) {
        self.inner.disconnect().await;
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}
