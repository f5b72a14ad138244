//! # Monitor Service
//!
//! Target CRUD and speed-test execution. The concrete service is also the
//! responder for the target and speed-test request events: entry points
//! attach it once and every `*_REQUESTED` emission gets a correlated
//! response, whether the requester sits in the same process or behind a
//! distributed bus implementation.
//!
//! The probe itself is a stand-in: measurements are drawn from `rand`, the
//! way the reference system mocks them, and real execution stays out of
//! scope.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rand::Rng;
use serde_json::{json, Value};
use uuid::Uuid;

use netmon_bus::{BusError, EventBus, EventHandler, HandlerError, TypedBus};
use netmon_types::events::{self, SpeedTestCompleted, SpeedTestRequest, TargetDeleteRequest,
    TargetUpdateRequest};
use netmon_types::{
    CreateTargetInput, Logger, MonitorService, MonitoringTarget, ServiceError, SpeedTestResult,
    SpeedTestResultRepository, SpeedTestStatus, TargetRepository, UpdateTargetInput,
};

use crate::responder::{request_id_of, respond, to_payload};

/// Concrete monitor service.
pub struct DefaultMonitorService {
    targets: Arc<dyn TargetRepository>,
    results: Arc<dyn SpeedTestResultRepository>,
    bus: Arc<dyn EventBus>,
    logger: Arc<dyn Logger>,
}

impl DefaultMonitorService {
    pub fn new(
        targets: Arc<dyn TargetRepository>,
        results: Arc<dyn SpeedTestResultRepository>,
        bus: Arc<dyn EventBus>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            targets,
            results,
            bus,
            logger,
        }
    }

    /// Subscribe the responder side of the target and speed-test protocol.
    pub fn attach_handlers(this: &Arc<Self>) -> Result<(), BusError> {
        Self::route(this, events::TARGET_CREATE_REQUESTED, |svc, payload| async move {
            svc.handle_create(payload).await
        })?;
        Self::route(this, events::TARGET_UPDATE_REQUESTED, |svc, payload| async move {
            svc.handle_update(payload).await
        })?;
        Self::route(this, events::TARGET_DELETE_REQUESTED, |svc, payload| async move {
            svc.handle_delete(payload).await
        })?;
        Self::route(this, events::TARGETS_LIST_REQUESTED, |svc, payload| async move {
            svc.handle_list(payload).await
        })?;
        Self::route(this, events::SPEED_TEST_REQUESTED, |svc, payload| async move {
            svc.handle_speed_test(payload).await
        })?;
        this.logger.info("Monitor service handlers attached", None);
        Ok(())
    }

    fn route<F, Fut>(this: &Arc<Self>, event: &str, f: F) -> Result<(), BusError>
    where
        F: Fn(Arc<Self>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let svc = Arc::clone(this);
        this.bus
            .on(event, EventHandler::new_async(move |payload| {
                f(Arc::clone(&svc), payload)
            }))
            .map(|_| ())
    }

    async fn handle_create(&self, payload: Value) -> Result<(), HandlerError> {
        let request_id = request_id_of(&payload)
            .ok_or_else(|| HandlerError::Decode("request without requestId".into()))?;
        let outcome = match serde_json::from_value::<CreateTargetInput>(payload) {
            Ok(input) => self.create_target(input).await.and_then(to_payload),
            Err(e) => Err(ServiceError::Invalid(e.to_string())),
        };
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::TARGET_CREATED,
            events::TARGET_CREATE_FAILED,
            outcome,
        );
        Ok(())
    }

    async fn handle_update(&self, payload: Value) -> Result<(), HandlerError> {
        let request_id = request_id_of(&payload)
            .ok_or_else(|| HandlerError::Decode("request without requestId".into()))?;
        let outcome = match serde_json::from_value::<TargetUpdateRequest>(payload) {
            Ok(req) => {
                let input = UpdateTargetInput {
                    name: req.name,
                    address: req.address,
                };
                self.update_target(req.id, input).await.and_then(to_payload)
            }
            Err(e) => Err(ServiceError::Invalid(e.to_string())),
        };
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::TARGET_UPDATED,
            events::TARGET_UPDATE_FAILED,
            outcome,
        );
        Ok(())
    }

    async fn handle_delete(&self, payload: Value) -> Result<(), HandlerError> {
        let request_id = request_id_of(&payload)
            .ok_or_else(|| HandlerError::Decode("request without requestId".into()))?;
        let outcome = match serde_json::from_value::<TargetDeleteRequest>(payload) {
            Ok(req) => self
                .delete_target(req.id)
                .await
                .map(|()| json!({ "deleted": req.id })),
            Err(e) => Err(ServiceError::Invalid(e.to_string())),
        };
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::TARGET_DELETED,
            events::TARGET_DELETE_FAILED,
            outcome,
        );
        Ok(())
    }

    async fn handle_list(&self, payload: Value) -> Result<(), HandlerError> {
        let request_id = request_id_of(&payload)
            .ok_or_else(|| HandlerError::Decode("request without requestId".into()))?;
        let outcome = self.list_targets().await.and_then(to_payload);
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::TARGETS_LISTED,
            events::TARGETS_LIST_FAILED,
            outcome,
        );
        Ok(())
    }

    async fn handle_speed_test(&self, payload: Value) -> Result<(), HandlerError> {
        let request_id = request_id_of(&payload)
            .ok_or_else(|| HandlerError::Decode("request without requestId".into()))?;
        let outcome = match serde_json::from_value::<SpeedTestRequest>(payload) {
            Ok(req) => self
                .run_speed_test(req.target_id)
                .await
                .and_then(to_payload),
            Err(e) => Err(ServiceError::Invalid(e.to_string())),
        };
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::SPEED_TEST_COMPLETED,
            events::SPEED_TEST_FAILED,
            outcome,
        );
        Ok(())
    }
}

#[async_trait]
impl MonitorService for DefaultMonitorService {
    async fn create_target(
        &self,
        input: CreateTargetInput,
    ) -> Result<MonitoringTarget, ServiceError> {
        if input.name.trim().is_empty() || input.address.trim().is_empty() {
            return Err(ServiceError::Invalid(
                "target name and address must be non-empty".into(),
            ));
        }
        Ok(self.targets.create(input).await?)
    }

    async fn get_target(&self, id: Uuid) -> Result<MonitoringTarget, ServiceError> {
        self.targets
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::Invalid(format!("unknown target: {id}")))
    }

    async fn list_targets(&self) -> Result<Vec<MonitoringTarget>, ServiceError> {
        Ok(self.targets.find_all().await?)
    }

    async fn update_target(
        &self,
        id: Uuid,
        input: UpdateTargetInput,
    ) -> Result<MonitoringTarget, ServiceError> {
        Ok(self.targets.update(id, input).await?)
    }

    async fn delete_target(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.targets.delete(id).await?)
    }

    async fn run_speed_test(&self, target_id: Uuid) -> Result<SpeedTestResult, ServiceError> {
        let target = self.get_target(target_id).await?;

        // Simulated probe; see module docs.
        let (ping_ms, download_mbps, upload_mbps) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(3.0..120.0),
                rng.gen_range(50.0..950.0),
                rng.gen_range(10.0..450.0),
            )
        };
        let result = SpeedTestResult {
            id: Uuid::new_v4(),
            target_id,
            ping_ms,
            download_mbps,
            upload_mbps,
            status: SpeedTestStatus::Success,
            error: None,
            created_at: Utc::now(),
        };
        let result = self.results.insert(result).await?;

        self.logger.debug(
            "Speed test completed",
            Some(json!({
                "target": target.name,
                "pingMs": result.ping_ms,
                "downloadMbps": result.download_mbps,
            })),
        );

        // Broadcast for passive observers (alerting); the correlated
        // response to the requester is separate.
        let broadcast = SpeedTestCompleted {
            target_id,
            result: result.clone(),
        };
        if let Err(e) = self.bus.emit_typed(events::SPEED_TEST_COMPLETED, &broadcast) {
            self.logger.warn(
                "Failed to broadcast speed-test completion",
                Some(json!({ "error": e.to_string() })),
            );
        }

        Ok(result)
    }
}

/// Monitor double for mock wiring environments: canned targets, fixed
/// measurements, no bus traffic.
pub struct MockMonitorService {
    targets: RwLock<Vec<MonitoringTarget>>,
}

impl MockMonitorService {
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            targets: RwLock::new(vec![MonitoringTarget {
                id: Uuid::new_v4(),
                name: "Mock target".into(),
                address: "https://mock.test".into(),
                owner_id: None,
                created_at: now,
                updated_at: now,
            }]),
        }
    }
}

impl Default for MockMonitorService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MonitorService for MockMonitorService {
    async fn create_target(
        &self,
        input: CreateTargetInput,
    ) -> Result<MonitoringTarget, ServiceError> {
        let now = Utc::now();
        let target = MonitoringTarget {
            id: Uuid::new_v4(),
            name: input.name,
            address: input.address,
            owner_id: input.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.targets.write().push(target.clone());
        Ok(target)
    }

    async fn get_target(&self, id: Uuid) -> Result<MonitoringTarget, ServiceError> {
        self.targets
            .read()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::Invalid(format!("unknown target: {id}")))
    }

    async fn list_targets(&self) -> Result<Vec<MonitoringTarget>, ServiceError> {
        Ok(self.targets.read().clone())
    }

    async fn update_target(
        &self,
        id: Uuid,
        input: UpdateTargetInput,
    ) -> Result<MonitoringTarget, ServiceError> {
        let mut targets = self.targets.write();
        let target = targets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ServiceError::Invalid(format!("unknown target: {id}")))?;
        if let Some(name) = input.name {
            target.name = name;
        }
        if let Some(address) = input.address {
            target.address = address;
        }
        target.updated_at = Utc::now();
        Ok(target.clone())
    }

    async fn delete_target(&self, id: Uuid) -> Result<(), ServiceError> {
        self.targets.write().retain(|t| t.id != id);
        Ok(())
    }

    async fn run_speed_test(&self, target_id: Uuid) -> Result<SpeedTestResult, ServiceError> {
        Ok(SpeedTestResult {
            id: Uuid::new_v4(),
            target_id,
            ping_ms: 10.0,
            download_mbps: 500.0,
            upload_mbps: 100.0,
            status: SpeedTestStatus::Success,
            error: None,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MockLogger;
    use crate::repositories::{InMemorySpeedTestResultRepository, InMemoryTargetRepository};
    use netmon_bus::InProcessEventBus;

    fn service_over(bus: Arc<dyn EventBus>) -> Arc<DefaultMonitorService> {
        let logger: Arc<dyn Logger> = Arc::new(MockLogger::new());
        Arc::new(DefaultMonitorService::new(
            Arc::new(InMemoryTargetRepository::seeded(Arc::clone(&logger))),
            Arc::new(InMemorySpeedTestResultRepository::seeded(Arc::clone(
                &logger,
            ))),
            bus,
            logger,
        ))
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let svc = service_over(bus);

        let result = svc
            .create_target(CreateTargetInput {
                name: "  ".into(),
                address: "https://x.test".into(),
                owner_id: None,
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_speed_test_broadcasts_completion() {
        let recording = Arc::new(netmon_bus::RecordingEventBus::new());
        let bus: Arc<dyn EventBus> = Arc::clone(&recording) as Arc<dyn EventBus>;
        let svc = service_over(bus);

        let target = svc.list_targets().await.unwrap().remove(0);
        let result = svc.run_speed_test(target.id).await.unwrap();
        assert_eq!(result.status, SpeedTestStatus::Success);

        let broadcasts = recording.emitted_named(events::SPEED_TEST_COMPLETED);
        assert_eq!(broadcasts.len(), 1);
        let completed: SpeedTestCompleted =
            serde_json::from_value(broadcasts[0].clone()).unwrap();
        assert_eq!(completed.target_id, target.id);
    }

    #[tokio::test]
    async fn test_speed_test_for_unknown_target_fails() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let svc = service_over(bus);

        let result = svc.run_speed_test(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ServiceError::Invalid(_))));
    }
}
