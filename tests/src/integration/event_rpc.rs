//! # EventRPC Against Live Responders
//!
//! The requester half (`EventRpc`) talking to the responder half
//! (`DefaultMonitorService::attach_handlers`) over one bus: the same path
//! a remote caller takes in distributed mode, minus the transport.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use netmon_bus::{EventBus, EventRpc, InProcessEventBus, RpcError};
    use netmon_services::{
        DefaultMonitorService, InMemorySpeedTestResultRepository, InMemoryTargetRepository,
        MockLogger,
    };
    use netmon_types::events;
    use netmon_types::{Logger, MonitoringTarget, SpeedTestResult};

    struct Fixture {
        bus: Arc<dyn EventBus>,
        rpc: EventRpc,
    }

    /// One process worth of monitor stack: bus, responder, requester.
    fn fixture() -> Fixture {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let logger: Arc<dyn Logger> = Arc::new(MockLogger::new());

        let service = Arc::new(DefaultMonitorService::new(
            Arc::new(InMemoryTargetRepository::seeded(Arc::clone(&logger))),
            Arc::new(InMemorySpeedTestResultRepository::seeded(Arc::clone(
                &logger,
            ))),
            Arc::clone(&bus),
            Arc::clone(&logger),
        ));
        DefaultMonitorService::attach_handlers(&service).unwrap();

        let rpc = EventRpc::new(Arc::clone(&bus), logger);
        Fixture { bus, rpc }
    }

    fn assert_no_correlated_listeners(bus: &Arc<dyn EventBus>) {
        for name in bus.event_names() {
            assert!(
                !name.contains("_CREATED_") && !name.contains("_FAILED_"),
                "leaked correlated listener: {name}"
            );
        }
    }

    #[tokio::test]
    async fn test_create_target_request_roundtrip() {
        let f = fixture();

        let target: MonitoringTarget = f
            .rpc
            .request(
                events::TARGET_CREATE_REQUESTED,
                events::TARGET_CREATED,
                events::TARGET_CREATE_FAILED,
                &json!({ "name": "Backbone", "address": "https://backbone.test" }),
                Some(Duration::from_secs(1)),
            )
            .await
            .unwrap();

        assert_eq!(target.name, "Backbone");
        assert_no_correlated_listeners(&f.bus);
    }

    #[tokio::test]
    async fn test_invalid_request_rejects_via_failure_event() {
        let f = fixture();

        // Empty name is rejected by the service and must surface as a
        // remote failure, not a timeout.
        let result: Result<MonitoringTarget, _> = f
            .rpc
            .request(
                events::TARGET_CREATE_REQUESTED,
                events::TARGET_CREATED,
                events::TARGET_CREATE_FAILED,
                &json!({ "name": "", "address": "https://nameless.test" }),
                Some(Duration::from_secs(1)),
            )
            .await;

        match result {
            Err(RpcError::Remote { message }) => {
                assert!(message.contains("non-empty"), "message: {message}");
            }
            other => panic!("expected remote failure, got {other:?}"),
        }
        assert_no_correlated_listeners(&f.bus);
    }

    #[tokio::test]
    async fn test_request_without_responder_times_out() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let logger: Arc<dyn Logger> = Arc::new(MockLogger::new());
        let rpc = EventRpc::new(Arc::clone(&bus), logger);

        let result: Result<MonitoringTarget, _> = rpc
            .request(
                events::TARGET_CREATE_REQUESTED,
                events::TARGET_CREATED,
                events::TARGET_CREATE_FAILED,
                &json!({ "name": "orphan", "address": "https://orphan.test" }),
                Some(Duration::from_millis(30)),
            )
            .await;

        assert!(matches!(result, Err(RpcError::Timeout { .. })));
        // Timed-out requests must not leak their correlated subscriptions.
        assert!(bus.event_names().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_speed_tests_resolve_to_their_own_targets() {
        let f = fixture();

        // Two targets from the seeded repository.
        let listed: Vec<MonitoringTarget> = f
            .rpc
            .request(
                events::TARGETS_LIST_REQUESTED,
                events::TARGETS_LISTED,
                events::TARGETS_LIST_FAILED,
                &json!({}),
                Some(Duration::from_secs(1)),
            )
            .await
            .unwrap();
        assert!(listed.len() >= 2);

        let speed_test = |target_id| {
            let rpc = f.rpc.clone();
            async move {
                let payload = json!({ "targetId": target_id });
                rpc.request::<_, SpeedTestResult>(
                    events::SPEED_TEST_REQUESTED,
                    events::SPEED_TEST_COMPLETED,
                    events::SPEED_TEST_FAILED,
                    &payload,
                    Some(Duration::from_secs(1)),
                )
                .await
            }
        };

        // Same base event names, different correlation ids; responses must
        // route back to their own requests.
        let (first, second) = tokio::join!(speed_test(listed[0].id), speed_test(listed[1].id));
        assert_eq!(first.unwrap().target_id, listed[0].id);
        assert_eq!(second.unwrap().target_id, listed[1].id);
    }

    #[tokio::test]
    async fn test_typed_request_reads_as_a_function_call() {
        let f = fixture();

        let list_targets = f.rpc.typed_request::<serde_json::Value, Vec<MonitoringTarget>>(
            events::TARGETS_LIST_REQUESTED,
            events::TARGETS_LISTED,
            events::TARGETS_LIST_FAILED,
            Some(Duration::from_secs(1)),
        );

        let first = list_targets.call(&json!({})).await.unwrap();
        let second = list_targets.call(&json!({})).await.unwrap();
        assert_eq!(first.len(), second.len());
    }
}
