//! Notification-feed and push-subscription persistence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use netmon_types::{
    Database, Logger, Notification, NotificationRepository, PushSubscription,
    PushSubscriptionRepository, RepositoryError,
};

use super::ensure_connected;

pub struct InMemoryNotificationRepository {
    database: Option<Arc<dyn Database>>,
    #[allow(dead_code)]
    logger: Arc<dyn Logger>,
    rows: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationRepository {
    pub fn new(database: Arc<dyn Database>, logger: Arc<dyn Logger>) -> Self {
        Self {
            database: Some(database),
            logger,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn seeded(logger: Arc<dyn Logger>) -> Self {
        let rows = vec![Notification {
            id: Uuid::new_v4(),
            message: "Welcome to the network monitor".into(),
            read: false,
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
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, message: String) -> Result<Notification, RepositoryError> {
        ensure_connected(&self.database)?;
        let notification = Notification {
            id: Uuid::new_v4(),
            message,
            read: false,
            created_at: Utc::now(),
        };
        self.rows.write().push(notification.clone());
        Ok(notification)
    }

    async fn find_all(&self) -> Result<Vec<Notification>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self.rows.read().clone())
    }

    async fn mark_read(&self, id: Uuid) -> Result<Notification, RepositoryError> {
        ensure_connected(&self.database)?;
        let mut rows = self.rows.write();
        let notification = rows
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(RepositoryError::NotFound {
                entity: "Notification",
                id: id.to_string(),
            })?;
        notification.read = true;
        Ok(notification.clone())
    }
}

pub struct InMemoryPushSubscriptionRepository {
    database: Option<Arc<dyn Database>>,
    #[allow(dead_code)]
    logger: Arc<dyn Logger>,
    rows: RwLock<Vec<PushSubscription>>,
}

impl InMemoryPushSubscriptionRepository {
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
impl PushSubscriptionRepository for InMemoryPushSubscriptionRepository {
    async fn create(&self, endpoint: String) -> Result<PushSubscription, RepositoryError> {
        ensure_connected(&self.database)?;
        let mut rows = self.rows.write();
        if rows.iter().any(|s| s.endpoint == endpoint) {
            return Err(RepositoryError::Conflict(format!(
                "endpoint already subscribed: {endpoint}"
            )));
        }
        let subscription = PushSubscription {
            id: Uuid::new_v4(),
            endpoint,
            created_at: Utc::now(),
        };
        rows.push(subscription.clone());
        Ok(subscription)
    }

    async fn find_all(&self) -> Result<Vec<PushSubscription>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self.rows.read().clone())
    }

    async fn delete_by_endpoint(&self, endpoint: &str) -> Result<(), RepositoryError> {
        ensure_connected(&self.database)?;
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|s| s.endpoint != endpoint);
        if rows.len() == before {
            return Err(RepositoryError::NotFound {
                entity: "PushSubscription",
                id: endpoint.to_string(),
            });
        }
        Ok(())
    }
}
