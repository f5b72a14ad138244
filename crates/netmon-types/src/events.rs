//! # Event Contracts
//!
//! Event names and payloads that flow through the event bus. Services never
//! call each other directly; these names are the whole inter-service surface.
//!
//! ## Request/response convention
//!
//! A requester emits `<NAME>_REQUESTED` carrying its payload plus a
//! `requestId` correlation field. The responder answers on
//! `<SUCCESS>_<requestId>` or `<FAILURE>_<requestId>` (see [`correlated`]);
//! plain (un-suffixed) success names are also broadcast for passive
//! observers such as the alerting service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::SpeedTestResult;

// =============================================================================
// TARGET CRUD
// =============================================================================

pub const TARGET_CREATE_REQUESTED: &str = "TARGET_CREATE_REQUESTED";
pub const TARGET_CREATED: &str = "TARGET_CREATED";
pub const TARGET_CREATE_FAILED: &str = "TARGET_CREATE_FAILED";

pub const TARGET_UPDATE_REQUESTED: &str = "TARGET_UPDATE_REQUESTED";
pub const TARGET_UPDATED: &str = "TARGET_UPDATED";
pub const TARGET_UPDATE_FAILED: &str = "TARGET_UPDATE_FAILED";

pub const TARGET_DELETE_REQUESTED: &str = "TARGET_DELETE_REQUESTED";
pub const TARGET_DELETED: &str = "TARGET_DELETED";
pub const TARGET_DELETE_FAILED: &str = "TARGET_DELETE_FAILED";

pub const TARGETS_LIST_REQUESTED: &str = "TARGETS_LIST_REQUESTED";
pub const TARGETS_LISTED: &str = "TARGETS_LISTED";
pub const TARGETS_LIST_FAILED: &str = "TARGETS_LIST_FAILED";

// =============================================================================
// SPEED TESTS
// =============================================================================

pub const SPEED_TEST_REQUESTED: &str = "SPEED_TEST_REQUESTED";
pub const SPEED_TEST_COMPLETED: &str = "SPEED_TEST_COMPLETED";
pub const SPEED_TEST_FAILED: &str = "SPEED_TEST_FAILED";

// =============================================================================
// ALERT RULES & INCIDENTS
// =============================================================================

pub const ALERT_RULE_CREATE_REQUESTED: &str = "ALERT_RULE_CREATE_REQUESTED";
pub const ALERT_RULE_CREATED: &str = "ALERT_RULE_CREATED";
pub const ALERT_RULE_CREATE_FAILED: &str = "ALERT_RULE_CREATE_FAILED";

pub const ALERT_RULES_LIST_REQUESTED: &str = "ALERT_RULES_LIST_REQUESTED";
pub const ALERT_RULES_LISTED: &str = "ALERT_RULES_LISTED";
pub const ALERT_RULES_LIST_FAILED: &str = "ALERT_RULES_LIST_FAILED";

pub const INCIDENT_CREATED: &str = "INCIDENT_CREATED";

pub const INCIDENTS_LIST_REQUESTED: &str = "INCIDENTS_LIST_REQUESTED";
pub const INCIDENTS_LISTED: &str = "INCIDENTS_LISTED";
pub const INCIDENTS_LIST_FAILED: &str = "INCIDENTS_LIST_FAILED";

// =============================================================================
// NOTIFICATIONS
// =============================================================================

pub const NOTIFICATION_CREATE_REQUESTED: &str = "NOTIFICATION_CREATE_REQUESTED";
pub const NOTIFICATION_CREATED: &str = "NOTIFICATION_CREATED";
pub const NOTIFICATION_CREATE_FAILED: &str = "NOTIFICATION_CREATE_FAILED";

pub const PUSH_SUBSCRIBE_REQUESTED: &str = "PUSH_SUBSCRIBE_REQUESTED";
pub const PUSH_SUBSCRIBED: &str = "PUSH_SUBSCRIBED";
pub const PUSH_SUBSCRIBE_FAILED: &str = "PUSH_SUBSCRIBE_FAILED";

/// Field name carrying the correlation id in request payloads.
pub const REQUEST_ID_FIELD: &str = "requestId";

/// Build the response event name for one correlated request.
///
/// The separator and suffix position are part of the wire convention; both
/// requester and responder must derive names through this function.
#[must_use]
pub fn correlated(base: &str, request_id: &str) -> String {
    format!("{base}_{request_id}")
}

// =============================================================================
// REQUEST PAYLOADS
// =============================================================================

/// Payload for `TARGET_UPDATE_REQUESTED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetUpdateRequest {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Payload for `TARGET_DELETE_REQUESTED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDeleteRequest {
    pub id: Uuid,
}

/// Payload for `SPEED_TEST_REQUESTED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedTestRequest {
    pub target_id: Uuid,
}

/// Payload broadcast on `SPEED_TEST_COMPLETED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedTestCompleted {
    pub target_id: Uuid,
    pub result: SpeedTestResult,
}

/// Payload for `INCIDENTS_LIST_REQUESTED` and `ALERT_RULES_LIST_REQUESTED`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListByTargetRequest {
    /// Restrict the listing to one target; `None` lists everything.
    #[serde(default)]
    pub target_id: Option<Uuid>,
}

/// Payload for `NOTIFICATION_CREATE_REQUESTED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationCreateRequest {
    pub message: String,
}

/// Payload for `PUSH_SUBSCRIBE_REQUESTED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscribeRequest {
    pub endpoint: String,
}

/// Payload carried by every `*_FAILED` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailurePayload {
    pub error: String,
}
