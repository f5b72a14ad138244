//! # Netmon Runtime
//!
//! The service-composition runtime. A process starts, [`bootstrap`] loads a
//! `service-wiring/<environment>.json` descriptor, translates it into
//! container registrations through the compiled-in [`FactoryRegistry`], the
//! [`Container`] resolves the dependency graph building singletons
//! bottom-up, and the resulting [`AppContext`] is handed to the entry point.
//!
//! ## Modular Structure
//!
//! - `container/` - service registry with dependency resolution
//! - `config/` - JSON wiring loader and validation
//! - `factories` - compiled-in `className -> factory` table
//! - `bootstrap` - config → container → app context assembly
//!
//! ## Startup Sequence
//!
//! 1. Resolve the wiring file (explicit path, `SERVICE_WIRING_CONFIG`, or
//!    the build's run mode)
//! 2. Load, expand `${VAR}` placeholders, validate references
//! 3. Register descriptors into a fresh container
//! 4. `initialize()`: validate the graph, reject cycles, build singletons
//! 5. Connect the database, assemble the context, hand it to the caller
//!
//! There is no global container: the context value is passed down
//! explicitly, and a second bootstrap builds a second, independent runtime.

pub mod bootstrap;
pub mod config;
pub mod container;
pub mod factories;

pub use bootstrap::{bootstrap, AppContext, BootstrapError, BootstrapOptions};
pub use config::{ConfigError, ConfigLoader, ServiceDefinition, ServiceWiringConfig};
pub use container::{
    Container, ContainerError, RegistrationPolicy, ServiceDescriptor, ServiceInstance, ServiceKey,
};
pub use factories::FactoryRegistry;
