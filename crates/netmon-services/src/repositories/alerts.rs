//! Alert-rule and incident persistence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use netmon_types::{
    AlertCondition, AlertMetric, AlertRule, AlertRuleRepository, CreateAlertRuleInput, Database,
    IncidentEvent, IncidentEventRepository, Logger, RepositoryError,
};

use super::ensure_connected;

pub struct InMemoryAlertRuleRepository {
    database: Option<Arc<dyn Database>>,
    #[allow(dead_code)]
    logger: Arc<dyn Logger>,
    rows: RwLock<Vec<AlertRule>>,
}

impl InMemoryAlertRuleRepository {
    pub fn new(database: Arc<dyn Database>, logger: Arc<dyn Logger>) -> Self {
        Self {
            database: Some(database),
            logger,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Mock constructor with one canned latency rule.
    pub fn seeded(logger: Arc<dyn Logger>) -> Self {
        let rows = vec![AlertRule {
            id: Uuid::new_v4(),
            target_id: Uuid::new_v4(),
            name: "High latency".into(),
            metric: AlertMetric::Ping,
            condition: AlertCondition::GreaterThan,
            threshold: 150.0,
            enabled: true,
            created_at: Utc::now(),
        }];
        Self {
            database: None,
            logger,
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl AlertRuleRepository for InMemoryAlertRuleRepository {
    async fn create(&self, input: CreateAlertRuleInput) -> Result<AlertRule, RepositoryError> {
        ensure_connected(&self.database)?;
        let rule = AlertRule {
            id: Uuid::new_v4(),
            target_id: input.target_id,
            name: input.name,
            metric: input.metric,
            condition: input.condition,
            threshold: input.threshold,
            enabled: input.enabled,
            created_at: Utc::now(),
        };
        self.rows.write().push(rule.clone());
        Ok(rule)
    }

    async fn find_by_target(&self, target_id: Uuid) -> Result<Vec<AlertRule>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|r| r.target_id == target_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<AlertRule>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self.rows.read().clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        ensure_connected(&self.database)?;
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(RepositoryError::NotFound {
                entity: "AlertRule",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

pub struct InMemoryIncidentEventRepository {
    database: Option<Arc<dyn Database>>,
    #[allow(dead_code)]
    logger: Arc<dyn Logger>,
    rows: RwLock<Vec<IncidentEvent>>,
}

impl InMemoryIncidentEventRepository {
    pub fn new(database: Arc<dyn Database>, logger: Arc<dyn Logger>) -> Self {
        Self {
            database: Some(database),
            logger,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn seeded(logger: Arc<dyn Logger>) -> Self {
        Self {
            database: None,
            logger,
            rows: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl IncidentEventRepository for InMemoryIncidentEventRepository {
    async fn create(&self, incident: IncidentEvent) -> Result<IncidentEvent, RepositoryError> {
        ensure_connected(&self.database)?;
        self.rows.write().push(incident.clone());
        Ok(incident)
    }

    async fn find_by_target(
        &self,
        target_id: Uuid,
    ) -> Result<Vec<IncidentEvent>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|i| i.target_id == target_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<IncidentEvent>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self.rows.read().clone())
    }

    async fn resolve(&self, id: Uuid) -> Result<IncidentEvent, RepositoryError> {
        ensure_connected(&self.database)?;
        let mut rows = self.rows.write();
        let incident = rows
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(RepositoryError::NotFound {
                entity: "IncidentEvent",
                id: id.to_string(),
            })?;
        incident.resolved = true;
        Ok(incident.clone())
    }
}
