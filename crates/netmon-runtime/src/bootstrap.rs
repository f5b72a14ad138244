//! # Application Bootstrap
//!
//! Orchestrates ConfigLoader → Container → app context. Every entry point
//! (the monolith and the per-service binaries) goes through [`bootstrap`];
//! they differ only in which wiring file they ask for.
//!
//! There is no global container and no implicit auto-init: the returned
//! [`AppContext`] is the only handle on the assembled runtime, passed down
//! explicitly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use netmon_bus::EventBus;
use netmon_types::{Database, Logger};

use crate::config::{ConfigError, ConfigLoader, WIRING_ENV_VAR};
use crate::container::{Container, ContainerError, ServiceInstance, ServiceKey};
use crate::factories::FactoryRegistry;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("Database connection failed: {0}")]
    Database(String),

    #[error("Required service missing from context: {name}")]
    MissingService { name: String },

    #[error("Service {name} has an unexpected type")]
    WrongServiceType { name: String },
}

/// How to bootstrap one process.
pub struct BootstrapOptions {
    /// Name reported in startup logs (e.g. "monitor-service").
    pub application_name: String,
    /// Explicit wiring file; overrides everything else.
    pub config_path: Option<PathBuf>,
    /// Wiring environment to use when `SERVICE_WIRING_CONFIG` is unset.
    pub environment: Option<String>,
    /// Connect the database service after initialization (default: true).
    pub enable_database: bool,
}

impl BootstrapOptions {
    #[must_use]
    pub fn new(application_name: &str) -> Self {
        Self {
            application_name: application_name.to_string(),
            config_path: None,
            environment: None,
            enable_database: true,
        }
    }

    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: &str) -> Self {
        self.environment = Some(environment.to_string());
        self
    }

    #[must_use]
    pub fn without_database(mut self) -> Self {
        self.enable_database = false;
        self
    }
}

/// The assembled runtime handed to entry points.
pub struct AppContext {
    pub logger: Arc<dyn Logger>,
    pub event_bus: Arc<dyn EventBus>,
    pub database: Option<Arc<dyn Database>>,
    /// Domain services by context name ("monitor", "alerting", ...).
    pub services: HashMap<String, ServiceInstance>,
    /// Repositories by context name ("target", "alertRule", ...).
    pub repositories: HashMap<String, ServiceInstance>,
    pub container: Arc<Container>,
}

impl AppContext {
    /// A named service, or a loud failure: a missing required service is a
    /// startup-configuration bug, not a recoverable condition.
    pub fn require_service<T: Clone + 'static>(&self, name: &str) -> Result<T, BootstrapError> {
        require(&self.services, name)
    }

    /// A named repository, with the same loud-failure contract.
    pub fn require_repository<T: Clone + 'static>(&self, name: &str) -> Result<T, BootstrapError> {
        require(&self.repositories, name)
    }
}

fn require<T: Clone + 'static>(
    map: &HashMap<String, ServiceInstance>,
    name: &str,
) -> Result<T, BootstrapError> {
    let entry = map.get(name).ok_or_else(|| BootstrapError::MissingService {
        name: name.to_string(),
    })?;
    entry
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| BootstrapError::WrongServiceType {
            name: name.to_string(),
        })
}

/// Context names for the services map.
const SERVICE_NAMES: [(&str, ServiceKey); 6] = [
    ("logger", ServiceKey::Logger),
    ("eventBus", ServiceKey::EventBus),
    ("database", ServiceKey::Database),
    ("monitor", ServiceKey::MonitorService),
    ("alerting", ServiceKey::AlertingService),
    ("notification", ServiceKey::NotificationService),
];

/// Context names for the repositories map.
const REPOSITORY_NAMES: [(&str, ServiceKey); 7] = [
    ("user", ServiceKey::UserRepository),
    ("target", ServiceKey::TargetRepository),
    ("speedTestResult", ServiceKey::SpeedTestResultRepository),
    ("alertRule", ServiceKey::AlertRuleRepository),
    ("incidentEvent", ServiceKey::IncidentEventRepository),
    ("notification", ServiceKey::NotificationRepository),
    ("pushSubscription", ServiceKey::PushSubscriptionRepository),
];

/// Bootstrap one process: load wiring, build the container, connect the
/// database, and assemble the context.
pub async fn bootstrap(options: BootstrapOptions) -> Result<AppContext, BootstrapError> {
    let loader = select_loader(&options);
    let config = loader.load_configuration()?;
    info!(
        application = %options.application_name,
        name = %config.name,
        environment = %config.environment,
        "Loading service wiring"
    );

    let registry = FactoryRegistry::with_defaults();
    let descriptors = loader.convert_to_descriptors(&config, &registry)?;

    let container = Container::new();
    for descriptor in descriptors {
        container.register(descriptor)?;
    }
    container.initialize().await?;

    let logger = container.get::<Arc<dyn Logger>>(ServiceKey::Logger)?;
    let event_bus = container.get::<Arc<dyn EventBus>>(ServiceKey::EventBus)?;

    let database = if options.enable_database && container.has(ServiceKey::Database) {
        let database = container.get::<Arc<dyn Database>>(ServiceKey::Database)?;
        database
            .connect()
            .await
            .map_err(|e| BootstrapError::Database(e.to_string()))?;
        Some(database)
    } else {
        None
    };

    let mut services = HashMap::new();
    for (name, key) in SERVICE_NAMES {
        if let Some(entry) = container.instance(key) {
            services.insert(name.to_string(), entry);
        }
    }
    let mut repositories = HashMap::new();
    for (name, key) in REPOSITORY_NAMES {
        if let Some(entry) = container.instance(key) {
            repositories.insert(name.to_string(), entry);
        }
    }

    logger.info(
        "Application bootstrapped",
        Some(serde_json::json!({
            "application": options.application_name,
            "configuration": config.name,
            "environment": config.environment,
            "services": container.registered_keys().len(),
        })),
    );

    Ok(AppContext {
        logger,
        event_bus,
        database,
        services,
        repositories,
        container: Arc::new(container),
    })
}

/// Pick the wiring source: explicit path, then `SERVICE_WIRING_CONFIG`,
/// then the caller's environment, then the run-mode default.
fn select_loader(options: &BootstrapOptions) -> ConfigLoader {
    if let Some(path) = &options.config_path {
        return ConfigLoader::with_path(path);
    }
    if std::env::var(WIRING_ENV_VAR).is_ok() {
        return ConfigLoader::new();
    }
    if let Some(environment) = &options.environment {
        return ConfigLoader::for_environment(environment);
    }
    ConfigLoader::new()
}

/// Install the process-wide tracing subscriber. Called once from each
/// binary entry point.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use netmon_types::MonitorService;

    const WIRING: &str = r#"{
        "name": "Bootstrap test wiring",
        "description": "monitor stack over mocks",
        "environment": "bootstrap-test",
        "services": {
            "ILogger": { "className": "MockLogger" },
            "IEventBus": { "className": "InProcessEventBus" },
            "IDatabaseService": { "className": "MockDatabase" },
            "ITargetRepository": {
                "className": "InMemoryTargetRepository",
                "dependencies": ["IDatabaseService", "ILogger"]
            },
            "ISpeedTestResultRepository": {
                "className": "InMemorySpeedTestResultRepository",
                "dependencies": ["IDatabaseService", "ILogger"]
            },
            "IMonitorService": {
                "className": "DefaultMonitorService",
                "dependencies": [
                    "ITargetRepository",
                    "ISpeedTestResultRepository",
                    "IEventBus",
                    "ILogger"
                ]
            }
        }
    }"#;

    fn wiring_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(WIRING.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_bootstrap_assembles_context() {
        let file = wiring_file();
        let context = bootstrap(
            BootstrapOptions::new("bootstrap-test").with_config_path(file.path()),
        )
        .await
        .unwrap();

        // Database was wired and connected.
        assert!(context.database.as_ref().unwrap().is_connected());

        let monitor: Arc<dyn MonitorService> = context.require_service("monitor").unwrap();
        let targets = monitor.list_targets().await.unwrap();
        assert!(targets.is_empty());
    }

    #[tokio::test]
    async fn test_require_service_fails_loudly_for_absent_names() {
        let file = wiring_file();
        let context = bootstrap(
            BootstrapOptions::new("bootstrap-test").with_config_path(file.path()),
        )
        .await
        .unwrap();

        let result: Result<Arc<dyn MonitorService>, _> = context.require_service("alerting");
        assert!(matches!(
            result,
            Err(BootstrapError::MissingService { name }) if name == "alerting"
        ));
    }

    #[tokio::test]
    async fn test_bootstrap_without_database_skips_connect() {
        let file = wiring_file();
        let context = bootstrap(
            BootstrapOptions::new("bootstrap-test")
                .with_config_path(file.path())
                .without_database(),
        )
        .await
        .unwrap();

        assert!(context.database.is_none());
        // The handle still exists in the container, unconnected.
        let database = context
            .container
            .get::<Arc<dyn Database>>(ServiceKey::Database)
            .unwrap();
        assert!(!database.is_connected());
    }
}
