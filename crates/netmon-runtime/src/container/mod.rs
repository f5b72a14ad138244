//! # Service Container
//!
//! Owns the mapping from abstract service key to concrete running instance.
//! Descriptors go in via `register`; `initialize()` resolves the dependency
//! graph once (validate references, reject cycles before any factory runs,
//! then build every singleton bottom-up); `get` hands out the cached
//! instances for the rest of the process lifetime.
//!
//! ## Thread Safety
//!
//! Both tables are guarded; locks are never held across an await (the
//! descriptor is cloned out before its factory runs). All singleton
//! construction happens inside `initialize()` before the container is
//! shared, so "constructed exactly once" needs no construction-time
//! coordination; post-init `resolve` only builds transients.

mod descriptor;

pub use descriptor::{
    ContainerError, RegistrationPolicy, ServiceDescriptor, ServiceFactory, ServiceInstance,
    ServiceKey,
};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::{debug, info};

/// The service registry.
pub struct Container {
    registrations: RwLock<HashMap<ServiceKey, ServiceDescriptor>>,
    instances: RwLock<HashMap<ServiceKey, ServiceInstance>>,
    initialized: AtomicBool,
    policy: RegistrationPolicy,
}

impl Container {
    /// Container with the strict duplicate-registration policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(RegistrationPolicy::Strict)
    }

    #[must_use]
    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Self {
            registrations: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            policy,
        }
    }

    /// Record a descriptor.
    ///
    /// Under [`RegistrationPolicy::Strict`] a second registration for the
    /// same key is an error; under `Override` the last write wins.
    pub fn register(&self, descriptor: ServiceDescriptor) -> Result<(), ContainerError> {
        let mut registrations = self.registrations.write();
        if registrations.contains_key(&descriptor.key)
            && self.policy == RegistrationPolicy::Strict
        {
            return Err(ContainerError::DuplicateRegistration {
                key: descriptor.key,
            });
        }
        debug!(key = %descriptor.key, is_mock = descriptor.is_mock, "Service registered");
        registrations.insert(descriptor.key, descriptor);
        Ok(())
    }

    /// Resolve the dependency graph and construct every singleton.
    ///
    /// Validation and cycle detection both complete before the first factory
    /// is invoked, so a bad graph can never leave a half-built container.
    /// Idempotent: a second call returns immediately.
    pub async fn initialize(&self) -> Result<(), ContainerError> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        let registrations = self.registrations.read().clone();

        for (key, descriptor) in &registrations {
            for dependency in &descriptor.dependencies {
                if !registrations.contains_key(dependency) {
                    return Err(ContainerError::MissingDependency {
                        key: *key,
                        dependency: *dependency,
                    });
                }
            }
        }

        detect_cycles(&registrations)?;

        // Deterministic construction order; recursion still builds
        // dependencies first.
        let mut keys: Vec<ServiceKey> = registrations.keys().copied().collect();
        keys.sort();
        for key in keys {
            if registrations[&key].singleton {
                self.build(key, &registrations).await?;
            }
        }

        self.initialized.store(true, Ordering::SeqCst);
        info!(services = registrations.len(), "Container initialized");
        Ok(())
    }

    /// Cached singleton instance, downcast to its handle type.
    pub fn get<T: Clone + 'static>(&self, key: ServiceKey) -> Result<T, ContainerError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(ContainerError::NotInitialized);
        }
        {
            let registrations = self.registrations.read();
            let descriptor = registrations
                .get(&key)
                .ok_or(ContainerError::ServiceNotRegistered { key })?;
            if !descriptor.singleton {
                return Err(ContainerError::NotASingleton { key });
            }
        }
        let instances = self.instances.read();
        let instance = instances
            .get(&key)
            .ok_or(ContainerError::NotInstantiated { key })?;
        instance
            .downcast_ref::<T>()
            .cloned()
            .ok_or(ContainerError::TypeMismatch {
                key,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolve a key, constructing transients on demand.
    ///
    /// Singletons come from the cache; a transient is rebuilt on every call,
    /// with its dependencies resolved recursively.
    pub async fn resolve<T: Clone + 'static>(&self, key: ServiceKey) -> Result<T, ContainerError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(ContainerError::NotInitialized);
        }
        let registrations = self.registrations.read().clone();
        if !registrations.contains_key(&key) {
            return Err(ContainerError::ServiceNotRegistered { key });
        }
        let instance = self.build(key, &registrations).await?;
        instance
            .downcast_ref::<T>()
            .cloned()
            .ok_or(ContainerError::TypeMismatch {
                key,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Cached instance without downcasting, if one was constructed.
    ///
    /// Used by bootstrap to assemble the context maps; typed access goes
    /// through [`Container::get`].
    #[must_use]
    pub fn instance(&self, key: ServiceKey) -> Option<ServiceInstance> {
        self.instances.read().get(&key).cloned()
    }

    /// Existence check without triggering construction.
    #[must_use]
    pub fn has(&self, key: ServiceKey) -> bool {
        self.registrations.read().contains_key(&key)
    }

    /// Whether a key is wired to a mock implementation. Diagnostics only.
    #[must_use]
    pub fn is_mock(&self, key: ServiceKey) -> Option<bool> {
        self.registrations.read().get(&key).map(|d| d.is_mock)
    }

    /// Registered keys, sorted.
    #[must_use]
    pub fn registered_keys(&self) -> Vec<ServiceKey> {
        let mut keys: Vec<ServiceKey> = self.registrations.read().keys().copied().collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Build one key, dependencies first. Singleton results are cached.
    fn build<'a>(
        &'a self,
        key: ServiceKey,
        registrations: &'a HashMap<ServiceKey, ServiceDescriptor>,
    ) -> BoxFuture<'a, Result<ServiceInstance, ContainerError>> {
        Box::pin(async move {
            if let Some(existing) = self.instances.read().get(&key) {
                return Ok(existing.clone());
            }

            let descriptor = registrations
                .get(&key)
                .ok_or(ContainerError::ServiceNotRegistered { key })?
                .clone();

            let mut resolved = Vec::with_capacity(descriptor.dependencies.len());
            for dependency in &descriptor.dependencies {
                resolved.push(self.build(*dependency, registrations).await?);
            }

            debug!(key = %key, deps = descriptor.dependencies.len(), "Constructing service");
            let instance = (descriptor.factory)(resolved, descriptor.params.clone()).await?;

            if descriptor.singleton {
                self.instances.write().insert(key, instance.clone());
            }
            Ok(instance)
        })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first cycle check over the declared dependency edges.
///
/// Pure graph walk; no factory is invoked. A key encountered while already
/// on the in-progress stack is a cycle; the error names the offending path.
fn detect_cycles(
    registrations: &HashMap<ServiceKey, ServiceDescriptor>,
) -> Result<(), ContainerError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    fn visit(
        key: ServiceKey,
        registrations: &HashMap<ServiceKey, ServiceDescriptor>,
        marks: &mut HashMap<ServiceKey, Mark>,
        stack: &mut Vec<ServiceKey>,
    ) -> Result<(), ContainerError> {
        match marks.get(&key) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let start = stack.iter().position(|k| *k == key).unwrap_or(0);
                let mut path: Vec<&str> = stack[start..].iter().map(ServiceKey::name).collect();
                path.push(key.name());
                return Err(ContainerError::DependencyCycle {
                    path: path.join(" -> "),
                });
            }
            None => {}
        }

        marks.insert(key, Mark::InProgress);
        stack.push(key);
        if let Some(descriptor) = registrations.get(&key) {
            for dependency in &descriptor.dependencies {
                visit(*dependency, registrations, marks, stack)?;
            }
        }
        stack.pop();
        marks.insert(key, Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut keys: Vec<ServiceKey> = registrations.keys().copied().collect();
    keys.sort();
    for key in keys {
        visit(key, registrations, &mut marks, &mut stack)?;
    }
    Ok(())
}
