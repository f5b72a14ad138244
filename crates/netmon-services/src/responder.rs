//! Shared responder plumbing for the EventRPC contract.
//!
//! Every `*_REQUESTED` handler follows the same shape: pull the correlation
//! id off the payload, run the operation, and answer on the suffixed success
//! or failure event. Only the operation differs per handler.

use std::sync::Arc;

use serde_json::{json, Value};

use netmon_bus::EventBus;
use netmon_types::events::{correlated, FailurePayload, REQUEST_ID_FIELD};
use netmon_types::{Logger, ServiceError};

/// Correlation id carried by a request payload, if any.
pub(crate) fn request_id_of(payload: &Value) -> Option<String> {
    payload
        .get(REQUEST_ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Answer one correlated request on the suffixed success or failure event.
pub(crate) fn respond(
    bus: &Arc<dyn EventBus>,
    logger: &Arc<dyn Logger>,
    request_id: &str,
    success_event: &str,
    failure_event: &str,
    outcome: Result<Value, ServiceError>,
) {
    let (event, payload) = match outcome {
        Ok(value) => (correlated(success_event, request_id), value),
        Err(e) => (
            correlated(failure_event, request_id),
            json!(FailurePayload {
                error: e.to_string(),
            }),
        ),
    };
    if let Err(e) = bus.emit(&event, payload) {
        logger.warn(
            "Failed to emit response event",
            Some(json!({ "event": event, "error": e.to_string() })),
        );
    }
}

/// Serialize an operation result for the success payload.
pub(crate) fn to_payload<T: serde::Serialize>(value: T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::Invalid(e.to_string()))
}
