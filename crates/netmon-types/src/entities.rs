//! # Core Domain Entities
//!
//! Entities persisted by the repositories and exchanged between services.
//!
//! ## Clusters
//!
//! - **Monitoring**: `MonitoringTarget`, `SpeedTestResult`
//! - **Alerting**: `AlertRule`, `IncidentEvent`
//! - **Notifications**: `Notification`, `PushSubscription`
//! - **Accounts**: `User`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// CLUSTER A: MONITORING
// =============================================================================

/// A host or URL being monitored for connectivity and throughput.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringTarget {
    /// Stable identifier.
    pub id: Uuid,
    /// Human-readable display name.
    pub name: String,
    /// Address to probe (URL or host).
    pub address: String,
    /// Owning user, if the target is not shared.
    pub owner_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a single speed-test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTestStatus {
    /// The probe completed and produced measurements.
    Success,
    /// The probe failed; `error` carries the reason.
    Failure,
}

/// One measurement sample for a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedTestResult {
    /// Stable identifier.
    pub id: Uuid,
    /// The target this sample belongs to.
    pub target_id: Uuid,
    /// Round-trip latency in milliseconds.
    pub ping_ms: f64,
    /// Download throughput in Mbit/s.
    pub download_mbps: f64,
    /// Upload throughput in Mbit/s.
    pub upload_mbps: f64,
    /// Whether the probe succeeded.
    pub status: SpeedTestStatus,
    /// Failure reason when `status` is `Failure`.
    pub error: Option<String>,
    /// Measurement timestamp.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER B: ALERTING
// =============================================================================

/// Metric an alert rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMetric {
    Ping,
    Download,
    Upload,
}

/// Comparison applied to the watched metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCondition {
    /// Fires when the metric rises above the threshold.
    GreaterThan,
    /// Fires when the metric drops below the threshold.
    LessThan,
}

/// A user-configured alert rule attached to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: Uuid,
    pub target_id: Uuid,
    pub name: String,
    pub metric: AlertMetric,
    pub condition: AlertCondition,
    pub threshold: f64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// A recorded incident for a target (rule breach or probe failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentEvent {
    pub id: Uuid,
    pub target_id: Uuid,
    /// Rule that triggered the incident, if any.
    pub rule_id: Option<Uuid>,
    pub description: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER C: NOTIFICATIONS
// =============================================================================

/// A message delivered to the dashboard's notification feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// A browser push-subscription endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub id: Uuid,
    pub endpoint: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER D: ACCOUNTS
// =============================================================================

/// A dashboard user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Fields required to create a monitoring target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetInput {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

/// Partial update for a monitoring target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTargetInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Fields required to create an alert rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRuleInput {
    pub target_id: Uuid,
    pub name: String,
    pub metric: AlertMetric,
    pub condition: AlertCondition,
    pub threshold: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}
