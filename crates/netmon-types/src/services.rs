//! # Collaborator & Service Contracts
//!
//! The method-level contracts the composition runtime consumes. The runtime
//! never depends on a concrete logging backend or database engine, only on
//! [`Logger`] and [`Database`]; entry points see domain services only
//! through the traits below.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{
    AlertRule, CreateAlertRuleInput, CreateTargetInput, IncidentEvent, MonitoringTarget,
    Notification, PushSubscription, SpeedTestResult, UpdateTargetInput,
};
use crate::errors::ServiceError;

/// Leveled logging facade.
///
/// `context` carries optional structured fields; implementations decide how
/// to render them.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str, context: Option<Value>);
    fn info(&self, message: &str, context: Option<Value>);
    fn warn(&self, message: &str, context: Option<Value>);
    fn error(&self, message: &str, context: Option<Value>);
}

/// Database handle contract.
///
/// Connection management only; query surfaces belong to the repositories.
#[async_trait]
pub trait Database: Send + Sync {
    async fn connect(&self) -> Result<(), ServiceError>;
    async fn disconnect(&self) -> Result<(), ServiceError>;
    fn is_connected(&self) -> bool;
}

/// Target CRUD and speed-test execution.
#[async_trait]
pub trait MonitorService: Send + Sync {
    async fn create_target(&self, input: CreateTargetInput)
        -> Result<MonitoringTarget, ServiceError>;
    async fn get_target(&self, id: Uuid) -> Result<MonitoringTarget, ServiceError>;
    async fn list_targets(&self) -> Result<Vec<MonitoringTarget>, ServiceError>;
    async fn update_target(
        &self,
        id: Uuid,
        input: UpdateTargetInput,
    ) -> Result<MonitoringTarget, ServiceError>;
    async fn delete_target(&self, id: Uuid) -> Result<(), ServiceError>;

    /// Run one speed-test probe against a target and persist the sample.
    async fn run_speed_test(&self, target_id: Uuid) -> Result<SpeedTestResult, ServiceError>;
}

/// Alert-rule administration and incident history.
#[async_trait]
pub trait AlertingService: Send + Sync {
    async fn create_rule(&self, input: CreateAlertRuleInput) -> Result<AlertRule, ServiceError>;
    async fn list_rules(&self, target_id: Option<Uuid>) -> Result<Vec<AlertRule>, ServiceError>;
    async fn record_incident(
        &self,
        target_id: Uuid,
        rule_id: Option<Uuid>,
        description: String,
    ) -> Result<IncidentEvent, ServiceError>;
    async fn list_incidents(
        &self,
        target_id: Option<Uuid>,
    ) -> Result<Vec<IncidentEvent>, ServiceError>;
}

/// Notification feed and push-subscription management.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_notification(&self, message: String) -> Result<Notification, ServiceError>;
    async fn list_notifications(&self) -> Result<Vec<Notification>, ServiceError>;
    async fn subscribe_push(&self, endpoint: String) -> Result<PushSubscription, ServiceError>;
    async fn list_push_subscriptions(&self) -> Result<Vec<PushSubscription>, ServiceError>;
}
