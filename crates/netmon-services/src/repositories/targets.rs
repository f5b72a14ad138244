//! Monitoring-target persistence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::json;
use uuid::Uuid;

use netmon_types::{
    CreateTargetInput, Database, Logger, MonitoringTarget, RepositoryError, TargetRepository,
    UpdateTargetInput,
};

use super::ensure_connected;

pub struct InMemoryTargetRepository {
    database: Option<Arc<dyn Database>>,
    logger: Arc<dyn Logger>,
    rows: RwLock<Vec<MonitoringTarget>>,
}

impl InMemoryTargetRepository {
    /// Concrete constructor; operations are gated on the database handle.
    pub fn new(database: Arc<dyn Database>, logger: Arc<dyn Logger>) -> Self {
        Self {
            database: Some(database),
            logger,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Mock constructor: no database gate, pre-populated sample rows.
    pub fn seeded(logger: Arc<dyn Logger>) -> Self {
        let now = Utc::now();
        let rows = vec![
            MonitoringTarget {
                id: Uuid::new_v4(),
                name: "Example".into(),
                address: "https://example.com".into(),
                owner_id: None,
                created_at: now,
                updated_at: now,
            },
            MonitoringTarget {
                id: Uuid::new_v4(),
                name: "Gateway".into(),
                address: "https://192.168.1.1".into(),
                owner_id: None,
                created_at: now,
                updated_at: now,
            },
        ];
        Self {
            database: None,
            logger,
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl TargetRepository for InMemoryTargetRepository {
    async fn create(&self, input: CreateTargetInput) -> Result<MonitoringTarget, RepositoryError> {
        ensure_connected(&self.database)?;
        let now = Utc::now();
        let target = MonitoringTarget {
            id: Uuid::new_v4(),
            name: input.name,
            address: input.address,
            owner_id: input.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().push(target.clone());
        self.logger.debug(
            "Target created",
            Some(json!({ "id": target.id, "name": target.name })),
        );
        Ok(target)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MonitoringTarget>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self.rows.read().iter().find(|t| t.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<MonitoringTarget>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self.rows.read().clone())
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateTargetInput,
    ) -> Result<MonitoringTarget, RepositoryError> {
        ensure_connected(&self.database)?;
        let mut rows = self.rows.write();
        let target = rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RepositoryError::NotFound {
                entity: "MonitoringTarget",
                id: id.to_string(),
            })?;
        if let Some(name) = input.name {
            target.name = name;
        }
        if let Some(address) = input.address {
            target.address = address;
        }
        target.updated_at = Utc::now();
        Ok(target.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        ensure_connected(&self.database)?;
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|t| t.id != id);
        if rows.len() == before {
            return Err(RepositoryError::NotFound {
                entity: "MonitoringTarget",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
