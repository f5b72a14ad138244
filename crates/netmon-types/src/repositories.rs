//! # Repository Contracts
//!
//! Narrow persistence interfaces the container wires behind the domain
//! services. Implementations are simple field mappers over whatever store
//! backs them; no query logic leaks through these traits.

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{
    AlertRule, CreateAlertRuleInput, CreateTargetInput, IncidentEvent, MonitoringTarget,
    Notification, PushSubscription, SpeedTestResult, UpdateTargetInput, User,
};
use crate::errors::RepositoryError;

#[async_trait]
pub trait TargetRepository: Send + Sync {
    async fn create(&self, input: CreateTargetInput) -> Result<MonitoringTarget, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<MonitoringTarget>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<MonitoringTarget>, RepositoryError>;
    async fn update(
        &self,
        id: Uuid,
        input: UpdateTargetInput,
    ) -> Result<MonitoringTarget, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SpeedTestResultRepository: Send + Sync {
    async fn insert(&self, result: SpeedTestResult) -> Result<SpeedTestResult, RepositoryError>;
    async fn find_by_target(
        &self,
        target_id: Uuid,
        limit: usize,
    ) -> Result<Vec<SpeedTestResult>, RepositoryError>;
    async fn latest(&self, target_id: Uuid) -> Result<Option<SpeedTestResult>, RepositoryError>;
}

#[async_trait]
pub trait AlertRuleRepository: Send + Sync {
    async fn create(&self, input: CreateAlertRuleInput) -> Result<AlertRule, RepositoryError>;
    async fn find_by_target(&self, target_id: Uuid) -> Result<Vec<AlertRule>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<AlertRule>, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait IncidentEventRepository: Send + Sync {
    async fn create(&self, incident: IncidentEvent) -> Result<IncidentEvent, RepositoryError>;
    async fn find_by_target(&self, target_id: Uuid)
        -> Result<Vec<IncidentEvent>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<IncidentEvent>, RepositoryError>;
    async fn resolve(&self, id: Uuid) -> Result<IncidentEvent, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, message: String) -> Result<Notification, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Notification>, RepositoryError>;
    async fn mark_read(&self, id: Uuid) -> Result<Notification, RepositoryError>;
}

#[async_trait]
pub trait PushSubscriptionRepository: Send + Sync {
    async fn create(&self, endpoint: String) -> Result<PushSubscription, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<PushSubscription>, RepositoryError>;
    async fn delete_by_endpoint(&self, endpoint: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, email: String, name: String) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}
