//! User-account persistence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use netmon_types::{Database, Logger, RepositoryError, User, UserRepository};

use super::ensure_connected;

pub struct InMemoryUserRepository {
    database: Option<Arc<dyn Database>>,
    #[allow(dead_code)]
    logger: Arc<dyn Logger>,
    rows: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new(database: Arc<dyn Database>, logger: Arc<dyn Logger>) -> Self {
        Self {
            database: Some(database),
            logger,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn seeded(logger: Arc<dyn Logger>) -> Self {
        let rows = vec![User {
            id: Uuid::new_v4(),
            email: "operator@example.com".into(),
            name: "Operator".into(),
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
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, email: String, name: String) -> Result<User, RepositoryError> {
        ensure_connected(&self.database)?;
        let mut rows = self.rows.write();
        if rows.iter().any(|u| u.email == email) {
            return Err(RepositoryError::Conflict(format!(
                "email already registered: {email}"
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            email,
            name,
            created_at: Utc::now(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self.rows.read().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        ensure_connected(&self.database)?;
        Ok(self.rows.read().iter().find(|u| u.email == email).cloned())
    }
}
