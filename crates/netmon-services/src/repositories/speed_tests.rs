//! Speed-test sample persistence.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use netmon_types::{
    Database, Logger, RepositoryError, SpeedTestResult, SpeedTestResultRepository,
};

use super::ensure_connected;

pub struct InMemorySpeedTestResultRepository {
    database: Option<Arc<dyn Database>>,
    #[allow(dead_code)]
    logger: Arc<dyn Logger>,
    rows: RwLock<Vec<SpeedTestResult>>,
}

impl InMemorySpeedTestResultRepository {
    pub fn new(database: Arc<dyn Database>, logger: Arc<dyn Logger>) -> Self {
        Self {
            database: Some(database),
            logger,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Mock constructor: empty store with no database gate. Samples are
    /// meaningless without a target to attach to, so no seed rows.
    pub fn seeded(logger: Arc<dyn Logger>) -> Self {
        Self {
            database: None,
            logger,
            rows: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpeedTestResultRepository for InMemorySpeedTestResultRepository {
    async fn insert(&self, result: SpeedTestResult) -> Result<SpeedTestResult, RepositoryError> {
        ensure_connected(&self.database)?;
        self.rows.write().push(result.clone());
        Ok(result)
    }

    async fn find_by_target(
        &self,
        target_id: Uuid,
        limit: usize,
    ) -> Result<Vec<SpeedTestResult>, RepositoryError> {
        ensure_connected(&self.database)?;
        // Newest first.
        let mut rows: Vec<_> = self
            .rows
            .read()
            .iter()
            .filter(|r| r.target_id == target_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn latest(&self, target_id: Uuid) -> Result<Option<SpeedTestResult>, RepositoryError> {
        Ok(self.find_by_target(target_id, 1).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MockLogger;
    use chrono::{Duration, Utc};
    use netmon_types::SpeedTestStatus;

    fn sample(target_id: Uuid, minutes_ago: i64) -> SpeedTestResult {
        SpeedTestResult {
            id: Uuid::new_v4(),
            target_id,
            ping_ms: 12.0,
            download_mbps: 300.0,
            upload_mbps: 40.0,
            status: SpeedTestStatus::Success,
            error: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_latest_returns_newest_sample() {
        let repo = InMemorySpeedTestResultRepository::seeded(Arc::new(MockLogger::new()));
        let target = Uuid::new_v4();

        let old = sample(target, 10);
        let new = sample(target, 1);
        repo.insert(old).await.unwrap();
        repo.insert(new.clone()).await.unwrap();
        repo.insert(sample(Uuid::new_v4(), 0)).await.unwrap();

        let latest = repo.latest(target).await.unwrap().unwrap();
        assert_eq!(latest.id, new.id);
        assert_eq!(repo.find_by_target(target, 10).await.unwrap().len(), 2);
    }
}
