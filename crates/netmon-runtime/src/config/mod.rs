//! # Service Wiring Configuration
//!
//! Loads the declarative JSON descriptor that selects which concrete class
//! backs each named service for the current environment, and translates it
//! into container registrations. Swapping a mock for a real implementation
//! is a config change, never a code change.
//!
//! The file is purely a selection mechanism over pre-compiled factories
//! (see [`crate::factories::FactoryRegistry`]); it can never load code.
//!
//! ## Path convention
//!
//! `service-wiring/<environment>.json`, where `<environment>` comes from
//! the `SERVICE_WIRING_CONFIG` environment variable or falls back to the
//! build's run mode (`development` for debug builds, `production` for
//! release). String values may embed `${VAR}` / `${VAR:-default}`
//! placeholders, resolved against the process environment at load time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::container::{ServiceDescriptor, ServiceKey};
use crate::factories::FactoryRegistry;

/// Environment variable naming the wiring environment.
pub const WIRING_ENV_VAR: &str = "SERVICE_WIRING_CONFIG";

/// Directory holding the wiring files.
pub const WIRING_DIR: &str = "service-wiring";

/// Load-time configuration errors. All fatal: there is no partial or
/// degraded load.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration in {path}: {source}")]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration must have a non-empty '{field}' field")]
    MissingField { field: &'static str },

    #[error("Unknown service type: {name}")]
    UnknownService { name: String },

    #[error("Service {service} depends on {dependency} which is not defined")]
    DanglingDependency { service: String, dependency: String },

    #[error("No factory registered for class: {class_name}")]
    UnknownFactory { class_name: String },

    #[error("Unclosed ${{...}} placeholder in: {0}")]
    MalformedPlaceholder(String),

    #[error("Environment variable not set: {name}")]
    UnsetVariable { name: String },
}

/// One service selection in the wiring file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    /// Factory name in the compiled-in registry.
    pub class_name: String,
    /// Descriptive module path; metadata only.
    #[serde(default)]
    pub module: String,
    /// Diagnostics flag surfaced on the descriptor.
    #[serde(default)]
    pub is_mock: bool,
    /// Names of other service definitions, injected in this order.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Constructor parameters handed to the factory.
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub description: String,
    /// Cached once per container when true (the default).
    #[serde(default = "default_singleton")]
    pub singleton: bool,
}

fn default_singleton() -> bool {
    true
}

/// The parsed wiring document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWiringConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub environment: String,
    pub services: BTreeMap<String, ServiceDefinition>,
}

/// Reads and validates wiring files.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Loader for the process-default environment: `SERVICE_WIRING_CONFIG`
    /// if set, otherwise the build's run mode.
    #[must_use]
    pub fn new() -> Self {
        let environment =
            std::env::var(WIRING_ENV_VAR).unwrap_or_else(|_| default_environment().to_string());
        Self::for_environment(&environment)
    }

    /// Loader for a named environment under `service-wiring/`.
    #[must_use]
    pub fn for_environment(environment: &str) -> Self {
        Self {
            path: Path::new(WIRING_DIR).join(format!("{environment}.json")),
        }
    }

    /// Loader for an explicit file path.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this loader reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, expand placeholders, parse, and validate one wiring document.
    pub fn load_configuration(&self) -> Result<ServiceWiringConfig, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::FileNotFound {
                path: self.path.clone(),
            });
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut document: Value =
            serde_json::from_str(&raw).map_err(|source| ConfigError::MalformedJson {
                path: self.path.clone(),
                source,
            })?;
        expand_placeholders(&mut document)?;

        let config: ServiceWiringConfig =
            serde_json::from_value(document).map_err(|source| ConfigError::MalformedJson {
                path: self.path.clone(),
                source,
            })?;

        validate(&config)?;
        debug!(
            name = %config.name,
            environment = %config.environment,
            services = config.services.len(),
            "Wiring configuration loaded"
        );
        Ok(config)
    }

    /// Translate a validated document into container registrations.
    ///
    /// Every `className` must name a compiled-in factory; an unknown name
    /// aborts the conversion.
    pub fn convert_to_descriptors(
        &self,
        config: &ServiceWiringConfig,
        registry: &FactoryRegistry,
    ) -> Result<Vec<ServiceDescriptor>, ConfigError> {
        let mut descriptors = Vec::with_capacity(config.services.len());
        for (service_name, definition) in &config.services {
            // Presence was validated at load time.
            let key = ServiceKey::from_name(service_name).ok_or_else(|| {
                ConfigError::UnknownService {
                    name: service_name.clone(),
                }
            })?;
            let factory =
                registry
                    .get(&definition.class_name)
                    .ok_or_else(|| ConfigError::UnknownFactory {
                        class_name: definition.class_name.clone(),
                    })?;
            let mut dependencies = Vec::with_capacity(definition.dependencies.len());
            for dependency in &definition.dependencies {
                dependencies.push(ServiceKey::from_name(dependency).ok_or_else(|| {
                    ConfigError::UnknownService {
                        name: dependency.clone(),
                    }
                })?);
            }
            descriptors.push(ServiceDescriptor {
                key,
                factory,
                dependencies,
                singleton: definition.singleton,
                is_mock: definition.is_mock,
                params: definition.params.clone(),
            });
        }
        Ok(descriptors)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// The build's run-mode name.
#[must_use]
pub fn default_environment() -> &'static str {
    if cfg!(debug_assertions) {
        "development"
    } else {
        "production"
    }
}

fn validate(config: &ServiceWiringConfig) -> Result<(), ConfigError> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::MissingField { field: "name" });
    }
    if config.environment.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: "environment",
        });
    }
    for (service_name, definition) in &config.services {
        if ServiceKey::from_name(service_name).is_none() {
            return Err(ConfigError::UnknownService {
                name: service_name.clone(),
            });
        }
        if definition.class_name.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "className" });
        }
        for dependency in &definition.dependencies {
            if !config.services.contains_key(dependency) {
                return Err(ConfigError::DanglingDependency {
                    service: service_name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Expand `${VAR}` / `${VAR:-default}` in every string of the document.
fn expand_placeholders(value: &mut Value) -> Result<(), ConfigError> {
    match value {
        Value::String(s) => {
            if s.contains("${") {
                *s = expand_str(s)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                expand_placeholders(item)?;
            }
        }
        Value::Object(map) => {
            for (_key, item) in map.iter_mut() {
                expand_placeholders(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn expand_str(input: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ConfigError::MalformedPlaceholder(input.to_string()))?;
        let token = &after[..end];
        let (name, default) = match token.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (token, None),
        };
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => match default {
                Some(default) => out.push_str(default),
                None => {
                    return Err(ConfigError::UnsetVariable {
                        name: name.to_string(),
                    })
                }
            },
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
