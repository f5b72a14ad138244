//! # Notification Service
//!
//! Notification feed and push subscriptions. Subscribes passively to
//! incident broadcasts and turns each one into a feed entry; actual push
//! delivery is out of scope.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{json, Value};
use uuid::Uuid;

use netmon_bus::{BusError, EventBus, EventHandler, HandlerError};
use netmon_types::events::{self, NotificationCreateRequest, PushSubscribeRequest};
use netmon_types::{
    IncidentEvent, Logger, Notification, NotificationRepository, NotificationService,
    PushSubscription, PushSubscriptionRepository, ServiceError,
};

use crate::responder::{request_id_of, respond, to_payload};

/// Concrete notification service.
pub struct DefaultNotificationService {
    notifications: Arc<dyn NotificationRepository>,
    subscriptions: Arc<dyn PushSubscriptionRepository>,
    bus: Arc<dyn EventBus>,
    logger: Arc<dyn Logger>,
}

impl DefaultNotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        subscriptions: Arc<dyn PushSubscriptionRepository>,
        bus: Arc<dyn EventBus>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            notifications,
            subscriptions,
            bus,
            logger,
        }
    }

    /// Subscribe request handlers plus the passive incident observer.
    pub fn attach_handlers(this: &Arc<Self>) -> Result<(), BusError> {
        Self::route(
            this,
            events::NOTIFICATION_CREATE_REQUESTED,
            |svc, payload| async move { svc.handle_create(payload).await },
        )?;
        Self::route(
            this,
            events::PUSH_SUBSCRIBE_REQUESTED,
            |svc, payload| async move { svc.handle_subscribe(payload).await },
        )?;
        Self::route(this, events::INCIDENT_CREATED, |svc, payload| async move {
            svc.handle_incident_observed(payload).await
        })?;
        this.logger
            .info("Notification service handlers attached", None);
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
        let outcome = match serde_json::from_value::<NotificationCreateRequest>(payload) {
            Ok(req) => self
                .send_notification(req.message)
                .await
                .and_then(to_payload),
            Err(e) => Err(ServiceError::Invalid(e.to_string())),
        };
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::NOTIFICATION_CREATED,
            events::NOTIFICATION_CREATE_FAILED,
            outcome,
        );
        Ok(())
    }

    async fn handle_subscribe(&self, payload: Value) -> Result<(), HandlerError> {
        let request_id = request_id_of(&payload)
            .ok_or_else(|| HandlerError::Decode("request without requestId".into()))?;
        let outcome = match serde_json::from_value::<PushSubscribeRequest>(payload) {
            Ok(req) => self.subscribe_push(req.endpoint).await.and_then(to_payload),
            Err(e) => Err(ServiceError::Invalid(e.to_string())),
        };
        respond(
            &self.bus,
            &self.logger,
            &request_id,
            events::PUSH_SUBSCRIBED,
            events::PUSH_SUBSCRIBE_FAILED,
            outcome,
        );
        Ok(())
    }

    /// Passive observer: incidents become feed entries.
    async fn handle_incident_observed(&self, payload: Value) -> Result<(), HandlerError> {
        let incident: IncidentEvent =
            serde_json::from_value(payload).map_err(|e| HandlerError::Decode(e.to_string()))?;
        self.send_notification(format!(
            "Incident on target {}: {}",
            incident.target_id, incident.description
        ))
        .await
        .map_err(|e| HandlerError::Failed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationService for DefaultNotificationService {
    async fn send_notification(&self, message: String) -> Result<Notification, ServiceError> {
        if message.trim().is_empty() {
            return Err(ServiceError::Invalid("message must be non-empty".into()));
        }
        let notification = self.notifications.create(message).await?;
        self.logger.debug(
            "Notification stored",
            Some(json!({ "id": notification.id })),
        );
        Ok(notification)
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>, ServiceError> {
        Ok(self.notifications.find_all().await?)
    }

    async fn subscribe_push(&self, endpoint: String) -> Result<PushSubscription, ServiceError> {
        Ok(self.subscriptions.create(endpoint).await?)
    }

    async fn list_push_subscriptions(&self) -> Result<Vec<PushSubscription>, ServiceError> {
        Ok(self.subscriptions.find_all().await?)
    }
}

/// Notification double for mock wiring environments.
#[derive(Default)]
pub struct MockNotificationService {
    notifications: RwLock<Vec<Notification>>,
    subscriptions: RwLock<Vec<PushSubscription>>,
}

impl MockNotificationService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationService for MockNotificationService {
    async fn send_notification(&self, message: String) -> Result<Notification, ServiceError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            message,
            read: false,
            created_at: Utc::now(),
        };
        self.notifications.write().push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>, ServiceError> {
        Ok(self.notifications.read().clone())
    }

    async fn subscribe_push(&self, endpoint: String) -> Result<PushSubscription, ServiceError> {
        let subscription = PushSubscription {
            id: Uuid::new_v4(),
            endpoint,
            created_at: Utc::now(),
        };
        self.subscriptions.write().push(subscription.clone());
        Ok(subscription)
    }

    async fn list_push_subscriptions(&self) -> Result<Vec<PushSubscription>, ServiceError> {
        Ok(self.subscriptions.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MockLogger;
    use crate::repositories::{
        InMemoryNotificationRepository, InMemoryPushSubscriptionRepository,
    };
    use netmon_bus::InProcessEventBus;

    fn service_over(bus: Arc<dyn EventBus>) -> Arc<DefaultNotificationService> {
        let logger: Arc<dyn Logger> = Arc::new(MockLogger::new());
        Arc::new(DefaultNotificationService::new(
            Arc::new(InMemoryNotificationRepository::seeded(Arc::clone(&logger))),
            Arc::new(InMemoryPushSubscriptionRepository::seeded(Arc::clone(
                &logger,
            ))),
            bus,
            logger,
        ))
    }

    #[tokio::test]
    async fn test_incident_broadcast_becomes_notification() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let svc = service_over(Arc::clone(&bus));
        DefaultNotificationService::attach_handlers(&svc).unwrap();

        let incident = IncidentEvent {
            id: Uuid::new_v4(),
            target_id: Uuid::new_v4(),
            rule_id: None,
            description: "probe failed".into(),
            resolved: false,
            created_at: Utc::now(),
        };
        bus.emit_async(
            events::INCIDENT_CREATED,
            serde_json::to_value(&incident).unwrap(),
        )
        .await
        .unwrap();

        let feed = svc.list_notifications().await.unwrap();
        // One seeded entry plus the incident-driven one.
        assert_eq!(feed.len(), 2);
        assert!(feed[1].message.contains("probe failed"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let svc = service_over(bus);

        let result = svc.send_notification("   ".into()).await;
        assert!(matches!(result, Err(ServiceError::Invalid(_))));
    }
}
