//! # Factory Registry
//!
//! The compiled-in `className -> factory` table the wiring files select
//! from. The reference system resolved class names through dynamic module
//! loading; in a statically-compiled runtime the registry is populated here,
//! at program startup, and the JSON file can only pick names that exist in
//! it.
//!
//! Factories receive their resolved dependencies positionally, in the order
//! the wiring file declares them; the expected order is part of each
//! factory's contract and is listed alongside the registration.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use netmon_bus::{EventBus, InProcessEventBus, RecordingEventBus};
use netmon_services::{
    DatabaseService, DefaultAlertingService, DefaultMonitorService, DefaultNotificationService,
    InMemoryAlertRuleRepository, InMemoryIncidentEventRepository, InMemoryNotificationRepository,
    InMemoryPushSubscriptionRepository, InMemorySpeedTestResultRepository,
    InMemoryTargetRepository, InMemoryUserRepository, LoggerService, MockAlertingService,
    MockDatabase, MockLogger, MockMonitorService, MockNotificationService,
};
use netmon_types::{
    AlertRuleRepository, AlertingService, Database, IncidentEventRepository, Logger,
    MonitorService, NotificationRepository, NotificationService, PushSubscriptionRepository,
    SpeedTestResultRepository, TargetRepository, UserRepository,
};

use crate::container::{ContainerError, ServiceFactory, ServiceInstance, ServiceKey};

/// Downcast one positional dependency to its handle type.
pub fn dep<T: Clone + 'static>(
    key: ServiceKey,
    deps: &[ServiceInstance],
    index: usize,
) -> Result<T, ContainerError> {
    deps.get(index)
        .ok_or_else(|| ContainerError::factory(key, format!("missing dependency #{index}")))?
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| {
            ContainerError::factory(
                key,
                format!(
                    "dependency #{index} is not of type {}; check the wiring file's dependency order",
                    std::any::type_name::<T>()
                ),
            )
        })
}

/// Wrap a service handle for storage in the container.
fn instance<T: Send + Sync + 'static>(handle: T) -> ServiceInstance {
    Arc::new(handle)
}

/// The compiled-in factory table.
pub struct FactoryRegistry {
    factories: HashMap<String, ServiceFactory>,
}

impl FactoryRegistry {
    /// Empty registry; useful for tests that register their own factories.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under the name wiring files use.
    pub fn register<F, Fut>(&mut self, class_name: &str, factory: F)
    where
        F: Fn(Vec<ServiceInstance>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ServiceInstance, ContainerError>> + Send + 'static,
    {
        self.factories.insert(
            class_name.to_string(),
            Arc::new(move |deps, params| Box::pin(factory(deps, params))),
        );
    }

    /// Look up a factory by class name.
    #[must_use]
    pub fn get(&self, class_name: &str) -> Option<ServiceFactory> {
        self.factories.get(class_name).cloned()
    }

    /// Registered class names, sorted.
    #[must_use]
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registry pre-populated with every implementation this workspace
    /// ships. Dependency order per factory is documented inline.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // --- Infrastructure ------------------------------------------------

        registry.register("LoggerService", |_deps, _params| async {
            let logger: Arc<dyn Logger> = Arc::new(LoggerService::new());
            Ok(instance(logger))
        });
        registry.register("MockLogger", |_deps, _params| async {
            let logger: Arc<dyn Logger> = Arc::new(MockLogger::new());
            Ok(instance(logger))
        });

        registry.register("InProcessEventBus", |_deps, _params| async {
            let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
            Ok(instance(bus))
        });
        registry.register("RecordingEventBus", |_deps, _params| async {
            let bus: Arc<dyn EventBus> = Arc::new(RecordingEventBus::new());
            Ok(instance(bus))
        });

        // deps: [ILogger]; params: { "url"?: string }
        registry.register("DatabaseService", |deps, params| async move {
            let logger: Arc<dyn Logger> = dep(ServiceKey::Database, &deps, 0)?;
            let url = params
                .get("url")
                .and_then(Value::as_str)
                .map(str::to_string);
            let database: Arc<dyn Database> = Arc::new(DatabaseService::new(url, logger));
            Ok(instance(database))
        });
        registry.register("MockDatabase", |_deps, _params| async {
            let database: Arc<dyn Database> = Arc::new(MockDatabase::new());
            Ok(instance(database))
        });

        // --- Repositories --------------------------------------------------
        // Concrete constructors take [IDatabaseService, ILogger]; the mock
        // variants are seeded stores taking [ILogger] only.

        registry.register("InMemoryTargetRepository", |deps, _params| async move {
            let database: Arc<dyn Database> = dep(ServiceKey::TargetRepository, &deps, 0)?;
            let logger: Arc<dyn Logger> = dep(ServiceKey::TargetRepository, &deps, 1)?;
            let repository: Arc<dyn TargetRepository> =
                Arc::new(InMemoryTargetRepository::new(database, logger));
            Ok(instance(repository))
        });
        registry.register("MockTargetRepository", |deps, _params| async move {
            let logger: Arc<dyn Logger> = dep(ServiceKey::TargetRepository, &deps, 0)?;
            let repository: Arc<dyn TargetRepository> =
                Arc::new(InMemoryTargetRepository::seeded(logger));
            Ok(instance(repository))
        });

        registry.register(
            "InMemorySpeedTestResultRepository",
            |deps, _params| async move {
                let database: Arc<dyn Database> =
                    dep(ServiceKey::SpeedTestResultRepository, &deps, 0)?;
                let logger: Arc<dyn Logger> = dep(ServiceKey::SpeedTestResultRepository, &deps, 1)?;
                let repository: Arc<dyn SpeedTestResultRepository> =
                    Arc::new(InMemorySpeedTestResultRepository::new(database, logger));
                Ok(instance(repository))
            },
        );
        registry.register(
            "MockSpeedTestResultRepository",
            |deps, _params| async move {
                let logger: Arc<dyn Logger> = dep(ServiceKey::SpeedTestResultRepository, &deps, 0)?;
                let repository: Arc<dyn SpeedTestResultRepository> =
                    Arc::new(InMemorySpeedTestResultRepository::seeded(logger));
                Ok(instance(repository))
            },
        );

        registry.register("InMemoryAlertRuleRepository", |deps, _params| async move {
            let database: Arc<dyn Database> = dep(ServiceKey::AlertRuleRepository, &deps, 0)?;
            let logger: Arc<dyn Logger> = dep(ServiceKey::AlertRuleRepository, &deps, 1)?;
            let repository: Arc<dyn AlertRuleRepository> =
                Arc::new(InMemoryAlertRuleRepository::new(database, logger));
            Ok(instance(repository))
        });
        registry.register("MockAlertRuleRepository", |deps, _params| async move {
            let logger: Arc<dyn Logger> = dep(ServiceKey::AlertRuleRepository, &deps, 0)?;
            let repository: Arc<dyn AlertRuleRepository> =
                Arc::new(InMemoryAlertRuleRepository::seeded(logger));
            Ok(instance(repository))
        });

        registry.register(
            "InMemoryIncidentEventRepository",
            |deps, _params| async move {
                let database: Arc<dyn Database> =
                    dep(ServiceKey::IncidentEventRepository, &deps, 0)?;
                let logger: Arc<dyn Logger> = dep(ServiceKey::IncidentEventRepository, &deps, 1)?;
                let repository: Arc<dyn IncidentEventRepository> =
                    Arc::new(InMemoryIncidentEventRepository::new(database, logger));
                Ok(instance(repository))
            },
        );
        registry.register(
            "MockIncidentEventRepository",
            |deps, _params| async move {
                let logger: Arc<dyn Logger> = dep(ServiceKey::IncidentEventRepository, &deps, 0)?;
                let repository: Arc<dyn IncidentEventRepository> =
                    Arc::new(InMemoryIncidentEventRepository::seeded(logger));
                Ok(instance(repository))
            },
        );

        registry.register(
            "InMemoryNotificationRepository",
            |deps, _params| async move {
                let database: Arc<dyn Database> =
                    dep(ServiceKey::NotificationRepository, &deps, 0)?;
                let logger: Arc<dyn Logger> = dep(ServiceKey::NotificationRepository, &deps, 1)?;
                let repository: Arc<dyn NotificationRepository> =
                    Arc::new(InMemoryNotificationRepository::new(database, logger));
                Ok(instance(repository))
            },
        );
        registry.register(
            "MockNotificationRepository",
            |deps, _params| async move {
                let logger: Arc<dyn Logger> = dep(ServiceKey::NotificationRepository, &deps, 0)?;
                let repository: Arc<dyn NotificationRepository> =
                    Arc::new(InMemoryNotificationRepository::seeded(logger));
                Ok(instance(repository))
            },
        );

        registry.register(
            "InMemoryPushSubscriptionRepository",
            |deps, _params| async move {
                let database: Arc<dyn Database> =
                    dep(ServiceKey::PushSubscriptionRepository, &deps, 0)?;
                let logger: Arc<dyn Logger> =
                    dep(ServiceKey::PushSubscriptionRepository, &deps, 1)?;
                let repository: Arc<dyn PushSubscriptionRepository> =
                    Arc::new(InMemoryPushSubscriptionRepository::new(database, logger));
                Ok(instance(repository))
            },
        );
        registry.register(
            "MockPushSubscriptionRepository",
            |deps, _params| async move {
                let logger: Arc<dyn Logger> =
                    dep(ServiceKey::PushSubscriptionRepository, &deps, 0)?;
                let repository: Arc<dyn PushSubscriptionRepository> =
                    Arc::new(InMemoryPushSubscriptionRepository::seeded(logger));
                Ok(instance(repository))
            },
        );

        registry.register("InMemoryUserRepository", |deps, _params| async move {
            let database: Arc<dyn Database> = dep(ServiceKey::UserRepository, &deps, 0)?;
            let logger: Arc<dyn Logger> = dep(ServiceKey::UserRepository, &deps, 1)?;
            let repository: Arc<dyn UserRepository> =
                Arc::new(InMemoryUserRepository::new(database, logger));
            Ok(instance(repository))
        });
        registry.register("MockUserRepository", |deps, _params| async move {
            let logger: Arc<dyn Logger> = dep(ServiceKey::UserRepository, &deps, 0)?;
            let repository: Arc<dyn UserRepository> =
                Arc::new(InMemoryUserRepository::seeded(logger));
            Ok(instance(repository))
        });

        // --- Domain services -----------------------------------------------
        // Constructed services attach their event handlers immediately, so
        // wiring a service into a process makes it a live responder.

        // deps: [ITargetRepository, ISpeedTestResultRepository, IEventBus, ILogger]
        registry.register("DefaultMonitorService", |deps, _params| async move {
            let targets: Arc<dyn TargetRepository> = dep(ServiceKey::MonitorService, &deps, 0)?;
            let results: Arc<dyn SpeedTestResultRepository> =
                dep(ServiceKey::MonitorService, &deps, 1)?;
            let bus: Arc<dyn EventBus> = dep(ServiceKey::MonitorService, &deps, 2)?;
            let logger: Arc<dyn Logger> = dep(ServiceKey::MonitorService, &deps, 3)?;

            let service = Arc::new(DefaultMonitorService::new(targets, results, bus, logger));
            DefaultMonitorService::attach_handlers(&service)
                .map_err(|e| ContainerError::factory(ServiceKey::MonitorService, e.to_string()))?;
            let service: Arc<dyn MonitorService> = service;
            Ok(instance(service))
        });
        registry.register("MockMonitorService", |_deps, _params| async {
            let service: Arc<dyn MonitorService> = Arc::new(MockMonitorService::new());
            Ok(instance(service))
        });

        // deps: [IAlertRuleRepository, IIncidentEventRepository, IEventBus, ILogger]
        registry.register("DefaultAlertingService", |deps, _params| async move {
            let rules: Arc<dyn AlertRuleRepository> = dep(ServiceKey::AlertingService, &deps, 0)?;
            let incidents: Arc<dyn IncidentEventRepository> =
                dep(ServiceKey::AlertingService, &deps, 1)?;
            let bus: Arc<dyn EventBus> = dep(ServiceKey::AlertingService, &deps, 2)?;
            let logger: Arc<dyn Logger> = dep(ServiceKey::AlertingService, &deps, 3)?;

            let service = Arc::new(DefaultAlertingService::new(rules, incidents, bus, logger));
            DefaultAlertingService::attach_handlers(&service)
                .map_err(|e| ContainerError::factory(ServiceKey::AlertingService, e.to_string()))?;
            let service: Arc<dyn AlertingService> = service;
            Ok(instance(service))
        });
        registry.register("MockAlertingService", |_deps, _params| async {
            let service: Arc<dyn AlertingService> = Arc::new(MockAlertingService::new());
            Ok(instance(service))
        });

        // deps: [INotificationRepository, IPushSubscriptionRepository, IEventBus, ILogger]
        registry.register("DefaultNotificationService", |deps, _params| async move {
            let notifications: Arc<dyn NotificationRepository> =
                dep(ServiceKey::NotificationService, &deps, 0)?;
            let subscriptions: Arc<dyn PushSubscriptionRepository> =
                dep(ServiceKey::NotificationService, &deps, 1)?;
            let bus: Arc<dyn EventBus> = dep(ServiceKey::NotificationService, &deps, 2)?;
            let logger: Arc<dyn Logger> = dep(ServiceKey::NotificationService, &deps, 3)?;

            let service = Arc::new(DefaultNotificationService::new(
                notifications,
                subscriptions,
                bus,
                logger,
            ));
            DefaultNotificationService::attach_handlers(&service).map_err(|e| {
                ContainerError::factory(ServiceKey::NotificationService, e.to_string())
            })?;
            let service: Arc<dyn NotificationService> = service;
            Ok(instance(service))
        });
        registry.register("MockNotificationService", |_deps, _params| async {
            let service: Arc<dyn NotificationService> = Arc::new(MockNotificationService::new());
            Ok(instance(service))
        });

        registry
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
