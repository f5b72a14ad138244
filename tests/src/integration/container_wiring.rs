//! # Container Wiring Integration
//!
//! Drives the registry → loader → container path with the real service
//! factories, checking the end-to-end wiring guarantees: registration order
//! independence, singleton identity across consumers, and mock/concrete
//! selection purely from configuration.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use netmon_runtime::{Container, ConfigLoader, FactoryRegistry, ServiceKey};
    use netmon_types::{
        CreateTargetInput, Database, Logger, MonitorService, TargetRepository,
    };

    const WIRING: &str = r#"{
        "name": "Wiring integration",
        "environment": "test",
        "services": {
            "IMonitorService": {
                "className": "DefaultMonitorService",
                "dependencies": [
                    "ITargetRepository",
                    "ISpeedTestResultRepository",
                    "IEventBus",
                    "ILogger"
                ]
            },
            "ISpeedTestResultRepository": {
                "className": "InMemorySpeedTestResultRepository",
                "dependencies": ["IDatabaseService", "ILogger"]
            },
            "ITargetRepository": {
                "className": "InMemoryTargetRepository",
                "dependencies": ["IDatabaseService", "ILogger"]
            },
            "IDatabaseService": { "className": "MockDatabase" },
            "IEventBus": { "className": "InProcessEventBus" },
            "ILogger": { "className": "MockLogger" }
        }
    }"#;

    async fn build_container(json: &str) -> Container {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loader = ConfigLoader::with_path(file.path());
        let config = loader.load_configuration().unwrap();
        let registry = FactoryRegistry::with_defaults();

        let container = Container::new();
        // Descriptors arrive in document (BTreeMap) order, which is not
        // dependency order; initialize() must not care.
        for descriptor in loader.convert_to_descriptors(&config, &registry).unwrap() {
            container.register(descriptor).unwrap();
        }
        container.initialize().await.unwrap();
        container
    }

    #[tokio::test]
    async fn test_monitor_service_shares_the_cached_repository() {
        let container = build_container(WIRING).await;
        let database = container
            .get::<Arc<dyn Database>>(ServiceKey::Database)
            .unwrap();
        database.connect().await.unwrap();

        let monitor = container
            .get::<Arc<dyn MonitorService>>(ServiceKey::MonitorService)
            .unwrap();
        let targets = container
            .get::<Arc<dyn TargetRepository>>(ServiceKey::TargetRepository)
            .unwrap();

        // A row created through the repository handle is visible through
        // the service: both hold the same cached instance.
        targets
            .create(CreateTargetInput {
                name: "shared".into(),
                address: "https://shared.test".into(),
                owner_id: None,
            })
            .await
            .unwrap();
        let listed = monitor.list_targets().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "shared");
    }

    #[tokio::test]
    async fn test_singleton_identity_for_every_key() {
        let container = build_container(WIRING).await;

        let first = container
            .get::<Arc<dyn Logger>>(ServiceKey::Logger)
            .unwrap();
        let second = container
            .get::<Arc<dyn Logger>>(ServiceKey::Logger)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_mock_flag_is_surfaced_from_configuration() {
        let wiring = WIRING.replace(
            r#""IDatabaseService": { "className": "MockDatabase" }"#,
            r#""IDatabaseService": { "className": "MockDatabase", "isMock": true }"#,
        );
        let container = build_container(&wiring).await;

        assert_eq!(container.is_mock(ServiceKey::Database), Some(true));
        assert_eq!(container.is_mock(ServiceKey::Logger), Some(false));
        assert_eq!(container.is_mock(ServiceKey::UserRepository), None);
    }

    #[tokio::test]
    async fn test_registered_keys_reflect_the_document() {
        let container = build_container(WIRING).await;

        let keys = container.registered_keys();
        assert_eq!(keys.len(), 6);
        assert!(container.has(ServiceKey::MonitorService));
        assert!(!container.has(ServiceKey::AlertingService));
    }
}
