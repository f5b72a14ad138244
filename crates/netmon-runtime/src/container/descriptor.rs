//! Service keys, descriptors, and the factory contract.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

/// Identifier for an abstract capability the container can produce.
///
/// A closed enum rather than runtime-generated keys: two different services
/// can never collide, and a wiring file can only name capabilities that
/// exist at compile time. `name()` returns the identifier used in the JSON
/// wiring files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKey {
    Logger,
    EventBus,
    Database,
    UserRepository,
    TargetRepository,
    SpeedTestResultRepository,
    AlertRuleRepository,
    IncidentEventRepository,
    NotificationRepository,
    PushSubscriptionRepository,
    MonitorService,
    AlertingService,
    NotificationService,
}

impl ServiceKey {
    /// The wiring-file name for this key.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Logger => "ILogger",
            Self::EventBus => "IEventBus",
            Self::Database => "IDatabaseService",
            Self::UserRepository => "IUserRepository",
            Self::TargetRepository => "ITargetRepository",
            Self::SpeedTestResultRepository => "ISpeedTestResultRepository",
            Self::AlertRuleRepository => "IAlertRuleRepository",
            Self::IncidentEventRepository => "IIncidentEventRepository",
            Self::NotificationRepository => "INotificationRepository",
            Self::PushSubscriptionRepository => "IPushSubscriptionRepository",
            Self::MonitorService => "IMonitorService",
            Self::AlertingService => "IAlertingService",
            Self::NotificationService => "INotificationService",
        }
    }

    /// Reverse of [`ServiceKey::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|key| key.name() == name)
    }

    /// Every key, in a stable order.
    #[must_use]
    pub fn all() -> Vec<ServiceKey> {
        vec![
            Self::Logger,
            Self::EventBus,
            Self::Database,
            Self::UserRepository,
            Self::TargetRepository,
            Self::SpeedTestResultRepository,
            Self::AlertRuleRepository,
            Self::IncidentEventRepository,
            Self::NotificationRepository,
            Self::PushSubscriptionRepository,
            Self::MonitorService,
            Self::AlertingService,
            Self::NotificationService,
        ]
    }
}

impl std::fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A constructed service, shared by everything that depends on it.
///
/// The `Any` holds the service's shared handle (e.g. an `Arc<dyn Logger>`);
/// [`crate::Container::get`] downcasts back to that handle type.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Async construction function.
///
/// Receives the resolved dependency instances in declaration order plus the
/// `params` object from the wiring file.
pub type ServiceFactory = Arc<
    dyn Fn(Vec<ServiceInstance>, Value) -> BoxFuture<'static, Result<ServiceInstance, ContainerError>>
        + Send
        + Sync,
>;

/// What to do when `register` sees a key twice.
///
/// The reference system silently overwrote; here the choice is explicit.
/// `Strict` is the default, since a silent overwrite usually masks a wiring
/// mistake; `Override` exists for deliberate last-config-wins layering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    #[default]
    Strict,
    Override,
}

/// The registered recipe for producing one service.
#[derive(Clone)]
pub struct ServiceDescriptor {
    pub key: ServiceKey,
    pub factory: ServiceFactory,
    /// Keys resolved and passed to the factory, in this order.
    pub dependencies: Vec<ServiceKey>,
    /// Cached and reused when true; rebuilt per `resolve` otherwise.
    pub singleton: bool,
    /// Diagnostics only; never changes resolution behavior.
    pub is_mock: bool,
    /// Constructor parameters from the wiring file.
    pub params: Value,
}

impl ServiceDescriptor {
    /// Singleton descriptor with no mock flag and no params.
    pub fn new<F, Fut>(key: ServiceKey, dependencies: Vec<ServiceKey>, factory: F) -> Self
    where
        F: Fn(Vec<ServiceInstance>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ServiceInstance, ContainerError>> + Send + 'static,
    {
        Self {
            key,
            factory: Arc::new(move |deps, params| Box::pin(factory(deps, params))),
            dependencies,
            singleton: true,
            is_mock: false,
            params: Value::Null,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn mock(mut self, is_mock: bool) -> Self {
        self.is_mock = is_mock;
        self
    }

    #[must_use]
    pub fn transient(mut self) -> Self {
        self.singleton = false;
        self
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("key", &self.key)
            .field("dependencies", &self.dependencies)
            .field("singleton", &self.singleton)
            .field("is_mock", &self.is_mock)
            .finish_non_exhaustive()
    }
}

/// Errors from container operations.
///
/// Everything except `Factory` is a startup-configuration bug; callers are
/// expected to fail fast rather than degrade.
#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    /// `register` saw the key twice under the strict policy.
    #[error("Service already registered: {key}")]
    DuplicateRegistration { key: ServiceKey },

    /// A descriptor names a dependency that was never registered.
    #[error("Service {key} depends on {dependency} which is not registered")]
    MissingDependency {
        key: ServiceKey,
        dependency: ServiceKey,
    },

    /// The dependency graph contains a cycle.
    #[error("Dependency cycle detected: {path}")]
    DependencyCycle { path: String },

    /// `get`/`resolve` called for an unknown key.
    #[error("Service not registered: {key}")]
    ServiceNotRegistered { key: ServiceKey },

    /// `get`/`resolve` called before `initialize()`.
    #[error("Container not initialized; call initialize() first")]
    NotInitialized,

    /// Sync `get` called for a transient descriptor.
    #[error("Service {key} is not a singleton; use resolve()")]
    NotASingleton { key: ServiceKey },

    /// The key was registered after `initialize()` and never constructed.
    #[error("Service {key} registered but not instantiated; re-run initialize()")]
    NotInstantiated { key: ServiceKey },

    /// The cached instance is not of the requested handle type.
    #[error("Service {key} is not of the requested type {expected}")]
    TypeMismatch {
        key: ServiceKey,
        expected: &'static str,
    },

    /// A factory failed during construction.
    #[error("Factory for {key} failed: {message}")]
    Factory { key: ServiceKey, message: String },
}

impl ContainerError {
    /// Shorthand for factory failures.
    pub fn factory(key: ServiceKey, message: impl Into<String>) -> Self {
        Self::Factory {
            key,
            message: message.into(),
        }
    }
}
