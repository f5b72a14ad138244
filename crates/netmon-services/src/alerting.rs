//! # Alerting Service
//!
//! Alert-rule administration and incident history. Subscribes passively to
//! speed-test broadcasts and records an incident when a probe fails; rule
//! threshold evaluation is out of scope.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{json, Value};
use uuid::Uuid;

use netmon_bus::{BusError, EventBus, EventHandler, HandlerError, TypedBus};
use netmon_types::events::{self, ListByTargetRequest, SpeedTestCompleted};
use netmon_types::{
    AlertRule, AlertRuleRepository, AlertingService, CreateAlertRuleInput, IncidentEvent,
    IncidentEventRepository, Logger, ServiceError, SpeedTestStatus,
};

use crate::responder::{request_id_of, respond, to_payload};

/// Concrete alerting service.
pub struct DefaultAlertingService {
    rules: Arc<dyn AlertRuleRepository>,
    incidents: Arc<dyn IncidentEventRepository>,
    bus: Arc<dyn EventBus>,
    logger: Arc<dyn Logger>,
}

impl DefaultAlertingService {
    pub fn new(
        rules: Arc<dyn AlertRuleRepository>,
        incidents: Arc<dyn IncidentEventRepository>,
        bus: Arc<dyn EventBus>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            rules,
            incidents,
            bus,
            logger,
        }
    }

    /// Subscribe request handlers plus the passive speed-test observer.
    pub fn attach_handlers(this: &Arc<Self>) -> Result<(), BusError> {
        Self::route(
            this,
            events::ALERT_RULE_CREATE_REQUESTED,
            |svc, payload| async move { svc.handle_create_rule(payload).await },
        )?;
        Self::route(
            this,
            events::ALERT_RULES_LIST_REQUESTED,
            |svc, payload| async move { svc.handle_list_rules(payload).await },
        )?;
        Self::route(
            this,
            events::INCIDENTS_LIST_REQUESTED,
            |svc, payload| async move { svc.handle_list_incidents(payload).await },
        )?;
        Self::route(this, events::SPEED_TEST_COMPLETED, |svc, payload| async move {
            svc.handle_speed_test_observed(payload).await
        })?;
        this.logger.info("Alerting service handlers attached", None);
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

    async fn handle_create_rule(&self, payload: Value) -> Result<(), HandlerError> {
        let request_id = request_id_of(&payload)
            .ok_or_else(|| HandlerError::Decode("request without requestId".into()))?;
        let outcome = match serde_json::from_value::<CreateAlertRuleInput>(payload) {
            Ok(input) => self.create_rule(input).await.and_then(to_payload),
            Err(e) => Err(ServiceError::Invalid(e.to_string())),
        };
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::ALERT_RULE_CREATED,
            events::ALERT_RULE_CREATE_FAILED,
            outcome,
        );
        Ok(())
    }

    async fn handle_list_rules(&self, payload: Value) -> Result<(), HandlerError> {
        let request_id = request_id_of(&payload)
            .ok_or_else(|| HandlerError::Decode("request without requestId".into()))?;
        let outcome = match serde_json::from_value::<ListByTargetRequest>(payload) {
            Ok(req) => self.list_rules(req.target_id).await.and_then(to_payload),
            Err(e) => Err(ServiceError::Invalid(e.to_string())),
        };
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::ALERT_RULES_LISTED,
            events::ALERT_RULES_LIST_FAILED,
            outcome,
        );
        Ok(())
    }

    async fn handle_list_incidents(&self, payload: Value) -> Result<(), HandlerError> {
        let request_id = request_id_of(&payload)
            .ok_or_else(|| HandlerError::Decode("request without requestId".into()))?;
        let outcome = match serde_json::from_value::<ListByTargetRequest>(payload) {
            Ok(req) => self
                .list_incidents(req.target_id)
                .await
                .and_then(to_payload),
            Err(e) => Err(ServiceError::Invalid(e.to_string())),
        };
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::INCIDENTS_LISTED,
            events::INCIDENTS_LIST_FAILED,
            outcome,
        );
        Ok(())
    }

    /// Passive observer: failed probes become incidents.
    async fn handle_speed_test_observed(&self, payload: Value) -> Result<(), HandlerError> {
        let completed: SpeedTestCompleted =
            serde_json::from_value(payload).map_err(|e| HandlerError::Decode(e.to_string()))?;
        if completed.result.status == SpeedTestStatus::Failure {
            let description = completed
                .result
                .error
                .unwrap_or_else(|| "speed test failed".to_string());
            self.record_incident(completed.target_id, None, description)
                .await
                .map_err(|e| HandlerError::Failed(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl AlertingService for DefaultAlertingService {
    async fn create_rule(&self, input: CreateAlertRuleInput) -> Result<AlertRule, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::Invalid("rule name must be non-empty".into()));
        }
        Ok(self.rules.create(input).await?)
    }

    async fn list_rules(&self, target_id: Option<Uuid>) -> Result<Vec<AlertRule>, ServiceError> {
        Ok(match target_id {
            Some(id) => self.rules.find_by_target(id).await?,
            None => self.rules.find_all().await?,
        })
    }

    async fn record_incident(
        &self,
        target_id: Uuid,
        rule_id: Option<Uuid>,
        description: String,
    ) -> Result<IncidentEvent, ServiceError> {
        let incident = IncidentEvent {
            id: Uuid::new_v4(),
            target_id,
            rule_id,
            description,
            resolved: false,
            created_at: Utc::now(),
        };
        let incident = self.incidents.create(incident).await?;

        self.logger.warn(
            "Incident recorded",
            Some(json!({ "target": target_id, "description": incident.description })),
        );
        // Broadcast so the notification service can pick it up.
        if let Err(e) = self.bus.emit_typed(events::INCIDENT_CREATED, &incident) {
            self.logger.warn(
                "Failed to broadcast incident",
                Some(json!({ "error": e.to_string() })),
            );
        }
        Ok(incident)
    }

    async fn list_incidents(
        &self,
        target_id: Option<Uuid>,
    ) -> Result<Vec<IncidentEvent>, ServiceError> {
        Ok(match target_id {
            Some(id) => self.incidents.find_by_target(id).await?,
            None => self.incidents.find_all().await?,
        })
    }
}

/// Alerting double for mock wiring environments.
#[derive(Default)]
pub struct MockAlertingService {
    rules: RwLock<Vec<AlertRule>>,
    incidents: RwLock<Vec<IncidentEvent>>,
}

impl MockAlertingService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertingService for MockAlertingService {
    async fn create_rule(&self, input: CreateAlertRuleInput) -> Result<AlertRule, ServiceError> {
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
        self.rules.write().push(rule.clone());
        Ok(rule)
    }

    async fn list_rules(&self, target_id: Option<Uuid>) -> Result<Vec<AlertRule>, ServiceError> {
        Ok(self
            .rules
            .read()
            .iter()
            .filter(|r| target_id.is_none_or(|id| r.target_id == id))
            .cloned()
            .collect())
    }

    async fn record_incident(
        &self,
        target_id: Uuid,
        rule_id: Option<Uuid>,
        description: String,
    ) -> Result<IncidentEvent, ServiceError> {
        let incident = IncidentEvent {
            id: Uuid::new_v4(),
            target_id,
            rule_id,
            description,
            resolved: false,
            created_at: Utc::now(),
        };
        self.incidents.write().push(incident.clone());
        Ok(incident)
    }

    async fn list_incidents(
        &self,
        target_id: Option<Uuid>,
    ) -> Result<Vec<IncidentEvent>, ServiceError> {
        Ok(self
            .incidents
            .read()
            .iter()
            .filter(|i| target_id.is_none_or(|id| i.target_id == id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MockLogger;
    use crate::repositories::{InMemoryAlertRuleRepository, InMemoryIncidentEventRepository};
    use netmon_bus::InProcessEventBus;
    use netmon_types::SpeedTestResult;

    fn service_over(bus: Arc<dyn EventBus>) -> Arc<DefaultAlertingService> {
        let logger: Arc<dyn Logger> = Arc::new(MockLogger::new());
        Arc::new(DefaultAlertingService::new(
            Arc::new(InMemoryAlertRuleRepository::seeded(Arc::clone(&logger))),
            Arc::new(InMemoryIncidentEventRepository::seeded(Arc::clone(
                &logger,
            ))),
            bus,
            logger,
        ))
    }

    #[tokio::test]
    async fn test_failed_probe_becomes_incident() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let svc = service_over(Arc::clone(&bus));
        DefaultAlertingService::attach_handlers(&svc).unwrap();

        let target_id = Uuid::new_v4();
        let completed = SpeedTestCompleted {
            target_id,
            result: SpeedTestResult {
                id: Uuid::new_v4(),
                target_id,
                ping_ms: 0.0,
                download_mbps: 0.0,
                upload_mbps: 0.0,
                status: SpeedTestStatus::Failure,
                error: Some("connection refused".into()),
                created_at: Utc::now(),
            },
        };
        bus.emit_async(
            events::SPEED_TEST_COMPLETED,
            serde_json::to_value(&completed).unwrap(),
        )
        .await
        .unwrap();

        let incidents = svc.list_incidents(Some(target_id)).await.unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].description, "connection refused");
    }

    #[tokio::test]
    async fn test_successful_probe_records_nothing() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let svc = service_over(Arc::clone(&bus));
        DefaultAlertingService::attach_handlers(&svc).unwrap();

        let target_id = Uuid::new_v4();
        let completed = SpeedTestCompleted {
            target_id,
            result: SpeedTestResult {
                id: Uuid::new_v4(),
                target_id,
                ping_ms: 9.0,
                download_mbps: 100.0,
                upload_mbps: 20.0,
                status: SpeedTestStatus::Success,
                error: None,
                created_at: Utc::now(),
            },
        };
        bus.emit_async(
            events::SPEED_TEST_COMPLETED,
            serde_json::to_value(&completed).unwrap(),
        )
        .await
        .unwrap();

        assert!(svc.list_incidents(None).await.unwrap().is_empty());
    }
}
