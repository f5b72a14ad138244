//! # EventRPC - Request/Response over the Event Bus
//!
//! Gives one service a call/response illusion over the fundamentally
//! asynchronous, many-subscriber bus: the caller "asks" another service for
//! a result and gets back a value, a typed error, or a timeout, without
//! either side holding a reference to the other's interface.
//!
//! ## Protocol
//!
//! 1. Generate a fresh correlation id (UUID v4).
//! 2. Subscribe `once` to `"{success_event}_{request_id}"`.
//! 3. Subscribe `once` to `"{failure_event}_{request_id}"`.
//! 4. Emit `request_event` with the payload object plus a `requestId` field.
//!
//! The responder listens on `request_event`, processes, and answers on the
//! suffixed success event with the result, or the suffixed failure event
//! with `{ "error": ... }`. Whichever of success, failure, or the timeout
//! fires first resolves the call exactly once; the losing subscriptions are
//! removed in every path, so abandoned requests cannot leak listeners.
//!
//! Concurrent outstanding requests on the same base names never cross-talk:
//! resolution is keyed by the correlation id, not the event name alone.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use netmon_types::events::{correlated, REQUEST_ID_FIELD};
use netmon_types::Logger;

use crate::bus::{BusError, EventBus, EventHandler};

/// Default window a request waits for its response.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Request outcomes the caller must handle.
///
/// `Timeout` and `Remote` are ordinary recoverable results; the caller
/// decides whether to retry, surface, or fail the surrounding operation.
#[derive(Debug, Error)]
pub enum RpcError {
    /// No response arrived within the window.
    #[error("Request timeout: {event} ({elapsed:?})")]
    Timeout { event: String, elapsed: Duration },

    /// The responder answered on the failure event.
    #[error("{message}")]
    Remote { message: String },

    /// The request payload is not a JSON object, so no correlation id could
    /// be attached.
    #[error("Request payload must be a JSON object: {0}")]
    InvalidPayload(String),

    /// The success payload did not match the expected response type.
    #[error("Response decode failed: {0}")]
    Decode(String),

    /// Both response subscriptions were torn down before resolution
    /// (bus disconnected mid-request).
    #[error("Request interrupted: response channel closed")]
    Interrupted,

    /// The underlying bus refused the operation.
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Request/response correlation over an [`EventBus`].
#[derive(Clone)]
pub struct EventRpc {
    bus: Arc<dyn EventBus>,
    logger: Arc<dyn Logger>,
}

impl EventRpc {
    pub fn new(bus: Arc<dyn EventBus>, logger: Arc<dyn Logger>) -> Self {
        Self { bus, logger }
    }

    /// Issue a request and wait for the correlated response.
    ///
    /// `timeout` falls back to [`DEFAULT_RPC_TIMEOUT`]. Exactly one of the
    /// three outcomes (success value, [`RpcError::Remote`],
    /// [`RpcError::Timeout`]) is ever produced per request id.
    pub async fn request<TReq, TResp>(
        &self,
        request_event: &str,
        success_event: &str,
        failure_event: &str,
        data: &TReq,
        timeout: Option<Duration>,
    ) -> Result<TResp, RpcError>
    where
        TReq: Serialize,
        TResp: DeserializeOwned,
    {
        let timeout = timeout.unwrap_or(DEFAULT_RPC_TIMEOUT);
        let request_id = Uuid::new_v4().to_string();

        let mut payload =
            serde_json::to_value(data).map_err(|e| RpcError::InvalidPayload(e.to_string()))?;
        let Value::Object(fields) = &mut payload else {
            return Err(RpcError::InvalidPayload(format!(
                "got {}",
                value_kind(&payload)
            )));
        };
        fields.insert(REQUEST_ID_FIELD.into(), Value::String(request_id.clone()));

        let success_key = correlated(success_event, &request_id);
        let failure_key = correlated(failure_event, &request_id);

        // One sender shared by both response handlers; whoever takes it
        // first resolves the request, the other delivery is ignored.
        let (result_tx, result_rx) = oneshot::channel::<Result<Value, RpcError>>();
        let slot = Arc::new(Mutex::new(Some(result_tx)));

        let success_slot = Arc::clone(&slot);
        let success_id = self.bus.once(
            &success_key,
            EventHandler::new(move |value| {
                if let Some(tx) = success_slot.lock().take() {
                    let _ = tx.send(Ok(value));
                }
                Ok(())
            }),
        )?;

        let failure_slot = Arc::clone(&slot);
        let failure_id = self.bus.once(
            &failure_key,
            EventHandler::new(move |value| {
                let message = value
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string();
                if let Some(tx) = failure_slot.lock().take() {
                    let _ = tx.send(Err(RpcError::Remote { message }));
                }
                Ok(())
            }),
        )?;

        self.logger.debug(
            "EventRPC: sending request",
            Some(json!({ "requestEvent": request_event, "requestId": request_id })),
        );

        if let Err(e) = self.bus.emit(request_event, payload) {
            self.bus.off(&success_key, success_id);
            self.bus.off(&failure_key, failure_id);
            return Err(e.into());
        }

        match tokio::time::timeout(timeout, result_rx).await {
            Ok(Ok(Ok(value))) => {
                self.bus.off(&failure_key, failure_id);
                self.logger.debug(
                    "EventRPC: success response received",
                    Some(json!({ "requestEvent": request_event, "requestId": request_id })),
                );
                serde_json::from_value(value).map_err(|e| RpcError::Decode(e.to_string()))
            }
            Ok(Ok(Err(remote))) => {
                self.bus.off(&success_key, success_id);
                self.logger.error(
                    "EventRPC: failure response received",
                    Some(json!({
                        "requestEvent": request_event,
                        "requestId": request_id,
                        "error": remote.to_string(),
                    })),
                );
                Err(remote)
            }
            Ok(Err(_closed)) => {
                self.bus.off(&success_key, success_id);
                self.bus.off(&failure_key, failure_id);
                Err(RpcError::Interrupted)
            }
            Err(_elapsed) => {
                self.bus.off(&success_key, success_id);
                self.bus.off(&failure_key, failure_id);
                self.logger.error(
                    "EventRPC: request timeout",
                    Some(json!({
                        "requestEvent": request_event,
                        "requestId": request_id,
                        "timeoutMs": timeout.as_millis(),
                    })),
                );
                Err(RpcError::Timeout {
                    event: request_event.to_string(),
                    elapsed: timeout,
                })
            }
        }
    }

    /// Bind the three event names (and a default timeout) into a callable,
    /// so call sites read as ordinary function calls.
    pub fn typed_request<TReq, TResp>(
        &self,
        request_event: &str,
        success_event: &str,
        failure_event: &str,
        default_timeout: Option<Duration>,
    ) -> TypedRequest<TReq, TResp>
    where
        TReq: Serialize,
        TResp: DeserializeOwned,
    {
        TypedRequest {
            rpc: self.clone(),
            request_event: request_event.to_string(),
            success_event: success_event.to_string(),
            failure_event: failure_event.to_string(),
            default_timeout: default_timeout.unwrap_or(DEFAULT_RPC_TIMEOUT),
            _marker: PhantomData,
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A bound request operation produced by [`EventRpc::typed_request`].
pub struct TypedRequest<TReq, TResp> {
    rpc: EventRpc,
    request_event: String,
    success_event: String,
    failure_event: String,
    default_timeout: Duration,
    _marker: PhantomData<fn(TReq) -> TResp>,
}

impl<TReq, TResp> TypedRequest<TReq, TResp>
where
    TReq: Serialize,
    TResp: DeserializeOwned,
{
    pub async fn call(&self, data: &TReq) -> Result<TResp, RpcError> {
        self.call_with_timeout(data, self.default_timeout).await
    }

    pub async fn call_with_timeout(
        &self,
        data: &TReq,
        timeout: Duration,
    ) -> Result<TResp, RpcError> {
        self.rpc
            .request(
                &self.request_event,
                &self.success_event,
                &self.failure_event,
                data,
                Some(timeout),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InProcessEventBus;
    use serde::Deserialize;

    /// Logger that swallows everything; RPC logging is not under test here.
    struct NullLogger;

    impl Logger for NullLogger {
        fn debug(&self, _message: &str, _context: Option<Value>) {}
        fn info(&self, _message: &str, _context: Option<Value>) {}
        fn warn(&self, _message: &str, _context: Option<Value>) {}
        fn error(&self, _message: &str, _context: Option<Value>) {}
    }

    fn rpc_over(bus: &Arc<InProcessEventBus>) -> EventRpc {
        let dyn_bus: Arc<dyn EventBus> = Arc::clone(bus) as Arc<dyn EventBus>;
        EventRpc::new(dyn_bus, Arc::new(NullLogger))
    }

    /// Attach a responder that echoes the given field back on success.
    fn echo_responder(bus: &Arc<InProcessEventBus>, request_event: &str, success_event: &str) {
        let responder_bus = Arc::clone(bus);
        let success_event = success_event.to_string();
        bus.on(
            request_event,
            EventHandler::new(move |payload| {
                let request_id = payload
                    .get(REQUEST_ID_FIELD)
                    .and_then(Value::as_str)
                    .expect("request id")
                    .to_string();
                let reply = json!({ "echo": payload.get("value").cloned().unwrap_or(Value::Null) });
                responder_bus
                    .emit(&correlated(&success_event, &request_id), reply)
                    .unwrap();
                Ok(())
            }),
        )
        .unwrap();
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Echo {
        echo: u32,
    }

    #[tokio::test]
    async fn test_request_resolves_on_success() {
        let bus = Arc::new(InProcessEventBus::new());
        echo_responder(&bus, "ECHO_REQUESTED", "ECHO_DONE");
        let rpc = rpc_over(&bus);

        let response: Echo = rpc
            .request(
                "ECHO_REQUESTED",
                "ECHO_DONE",
                "ECHO_FAILED",
                &json!({"value": 42}),
                None,
            )
            .await
            .unwrap();

        assert_eq!(response, Echo { echo: 42 });
    }

    #[tokio::test]
    async fn test_success_removes_failure_listener() {
        let bus = Arc::new(InProcessEventBus::new());
        echo_responder(&bus, "ECHO_REQUESTED", "ECHO_DONE");
        let rpc = rpc_over(&bus);

        let _: Echo = rpc
            .request(
                "ECHO_REQUESTED",
                "ECHO_DONE",
                "ECHO_FAILED",
                &json!({"value": 1}),
                None,
            )
            .await
            .unwrap();

        // Neither suffixed subscription may survive the resolved request.
        for name in bus.event_names() {
            assert!(
                !name.starts_with("ECHO_DONE_") && !name.starts_with("ECHO_FAILED_"),
                "leaked listener: {name}"
            );
        }
    }

    #[tokio::test]
    async fn test_request_rejects_on_failure_event() {
        let bus = Arc::new(InProcessEventBus::new());
        let responder_bus = Arc::clone(&bus);
        bus.on(
            "ECHO_REQUESTED",
            EventHandler::new(move |payload| {
                let request_id = payload
                    .get(REQUEST_ID_FIELD)
                    .and_then(Value::as_str)
                    .unwrap()
                    .to_string();
                responder_bus
                    .emit(
                        &correlated("ECHO_FAILED", &request_id),
                        json!({"error": "target unreachable"}),
                    )
                    .unwrap();
                Ok(())
            }),
        )
        .unwrap();
        let rpc = rpc_over(&bus);

        let result: Result<Echo, _> = rpc
            .request(
                "ECHO_REQUESTED",
                "ECHO_DONE",
                "ECHO_FAILED",
                &json!({"value": 1}),
                None,
            )
            .await;

        match result {
            Err(RpcError::Remote { message }) => assert_eq!(message, "target unreachable"),
            other => panic!("expected remote failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_times_out_and_cleans_up() {
        let bus = Arc::new(InProcessEventBus::new());
        let rpc = rpc_over(&bus);

        let result: Result<Echo, _> = rpc
            .request(
                "ECHO_REQUESTED",
                "ECHO_DONE",
                "ECHO_FAILED",
                &json!({"value": 1}),
                Some(Duration::from_millis(20)),
            )
            .await;

        match result {
            Err(RpcError::Timeout { event, elapsed }) => {
                assert_eq!(event, "ECHO_REQUESTED");
                assert_eq!(elapsed, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }

        // Timeout must leave no suffixed listeners behind.
        assert!(bus.event_names().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_requests_do_not_cross_talk() {
        let bus = Arc::new(InProcessEventBus::new());

        // Responder that answers out of order: second request first.
        let pending: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
        let responder_bus = Arc::clone(&bus);
        let responder_pending = Arc::clone(&pending);
        bus.on(
            "ECHO_REQUESTED",
            EventHandler::new(move |payload| {
                let request_id = payload
                    .get(REQUEST_ID_FIELD)
                    .and_then(Value::as_str)
                    .unwrap()
                    .to_string();
                let value = payload.get("value").cloned().unwrap_or(Value::Null);
                let mut queue = responder_pending.lock();
                queue.push((request_id, value));
                if queue.len() == 2 {
                    for (id, value) in queue.drain(..).rev() {
                        responder_bus
                            .emit(&correlated("ECHO_DONE", &id), json!({ "echo": value }))
                            .unwrap();
                    }
                }
                Ok(())
            }),
        )
        .unwrap();

        let rpc = rpc_over(&bus);
        let payload_one = json!({"value": 1});
        let payload_two = json!({"value": 2});
        let (first, second) = tokio::join!(
            rpc.request::<_, Echo>(
                "ECHO_REQUESTED",
                "ECHO_DONE",
                "ECHO_FAILED",
                &payload_one,
                Some(Duration::from_secs(1)),
            ),
            rpc.request::<_, Echo>(
                "ECHO_REQUESTED",
                "ECHO_DONE",
                "ECHO_FAILED",
                &payload_two,
                Some(Duration::from_secs(1)),
            ),
        );

        assert_eq!(first.unwrap(), Echo { echo: 1 });
        assert_eq!(second.unwrap(), Echo { echo: 2 });
    }

    #[tokio::test]
    async fn test_non_object_payload_is_rejected() {
        let bus = Arc::new(InProcessEventBus::new());
        let rpc = rpc_over(&bus);

        let result: Result<Echo, _> = rpc
            .request("ECHO_REQUESTED", "ECHO_DONE", "ECHO_FAILED", &42_u32, None)
            .await;

        assert!(matches!(result, Err(RpcError::InvalidPayload(_))));
        // Rejected before any subscription was made.
        assert!(bus.event_names().is_empty());
    }

    #[tokio::test]
    async fn test_typed_request_binds_event_names() {
        let bus = Arc::new(InProcessEventBus::new());
        echo_responder(&bus, "ECHO_REQUESTED", "ECHO_DONE");
        let rpc = rpc_over(&bus);

        let echo = rpc.typed_request::<Value, Echo>(
            "ECHO_REQUESTED",
            "ECHO_DONE",
            "ECHO_FAILED",
            Some(Duration::from_secs(1)),
        );

        let response = echo.call(&json!({"value": 5})).await.unwrap();
        assert_eq!(response, Echo { echo: 5 });
    }
}
