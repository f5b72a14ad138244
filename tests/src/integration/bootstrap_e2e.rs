//! # Bootstrap End-to-End
//!
//! Boots the shipped `service-wiring/*.json` files and drives the resulting
//! processes: monolith choreography (speed-test failure → incident →
//! notification) and the mock environment used for offline work.

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use netmon_bus::{EventBus, EventRpc};
    use netmon_runtime::{bootstrap, BootstrapOptions, ServiceKey};
    use netmon_types::events;
    use netmon_types::{
        AlertingService, Database, MonitorService, MonitoringTarget, NotificationService,
    };

    fn wiring(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .expect("workspace root")
            .join("service-wiring")
            .join(name)
    }

    #[tokio::test]
    async fn test_development_wiring_boots_the_full_stack() {
        let context = bootstrap(
            BootstrapOptions::new("e2e").with_config_path(wiring("development.json")),
        )
        .await
        .unwrap();

        assert!(context.database.as_ref().unwrap().is_connected());
        assert_eq!(context.container.registered_keys().len(), 13);

        let monitor: Arc<dyn MonitorService> = context.require_service("monitor").unwrap();
        let target = monitor
            .create_target(netmon_types::CreateTargetInput {
                name: "Uplink".into(),
                address: "https://uplink.test".into(),
                owner_id: None,
            })
            .await
            .unwrap();
        let result = monitor.run_speed_test(target.id).await.unwrap();
        assert_eq!(result.target_id, target.id);
    }

    #[tokio::test]
    async fn test_failed_probe_flows_to_the_notification_feed() {
        let context = bootstrap(
            BootstrapOptions::new("e2e").with_config_path(wiring("development.json")),
        )
        .await
        .unwrap();

        let notification: Arc<dyn NotificationService> =
            context.require_service("notification").unwrap();
        let alerting: Arc<dyn AlertingService> = context.require_service("alerting").unwrap();
        assert!(notification.list_notifications().await.unwrap().is_empty());

        // A failed probe broadcast; the alerting service records an
        // incident, whose broadcast the notification service turns into a
        // feed entry.
        let target_id = uuid::Uuid::new_v4();
        let payload = json!({
            "targetId": target_id,
            "result": {
                "id": uuid::Uuid::new_v4(),
                "targetId": target_id,
                "pingMs": 0.0,
                "downloadMbps": 0.0,
                "uploadMbps": 0.0,
                "status": "failure",
                "error": "host unreachable",
                "createdAt": chrono_now(),
            }
        });
        context
            .event_bus
            .emit_async(events::SPEED_TEST_COMPLETED, payload)
            .await
            .unwrap();

        let incidents = alerting.list_incidents(Some(target_id)).await.unwrap();
        assert_eq!(incidents.len(), 1);

        // The incident broadcast is fire-and-forget; poll briefly.
        let mut feed = Vec::new();
        for _ in 0..50 {
            feed = notification.list_notifications().await.unwrap();
            if !feed.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(feed.len(), 1);
        assert!(feed[0].message.contains("host unreachable"));
    }

    #[tokio::test]
    async fn test_all_mock_wiring_swaps_every_implementation() {
        let context = bootstrap(
            BootstrapOptions::new("e2e").with_config_path(wiring("all-mock.json")),
        )
        .await
        .unwrap();

        for key in context.container.registered_keys() {
            assert_eq!(
                context.container.is_mock(key),
                Some(true),
                "expected {key} to be wired as a mock"
            );
        }

        // The mock monitor serves canned data without repositories.
        let monitor: Arc<dyn MonitorService> = context.require_service("monitor").unwrap();
        assert_eq!(monitor.list_targets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_monitor_service_wiring_serves_rpc_requests() {
        let context = bootstrap(
            BootstrapOptions::new("e2e").with_config_path(wiring("monitor-service.json")),
        )
        .await
        .unwrap();

        // Only the monitor stack is wired in this process.
        assert!(!context.container.has(ServiceKey::AlertingService));
        assert!(!context.container.has(ServiceKey::NotificationService));

        let rpc = EventRpc::new(Arc::clone(&context.event_bus), Arc::clone(&context.logger));
        let created: MonitoringTarget = rpc
            .request(
                events::TARGET_CREATE_REQUESTED,
                events::TARGET_CREATED,
                events::TARGET_CREATE_FAILED,
                &json!({ "name": "Edge", "address": "https://edge.test" }),
                Some(Duration::from_secs(1)),
            )
            .await
            .unwrap();
        assert_eq!(created.name, "Edge");
    }

    fn chrono_now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}
