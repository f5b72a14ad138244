//! # Netmon Types Crate
//!
//! Domain entities, event contracts, and collaborator traits shared across
//! all services of the network-monitoring system.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a service boundary
//!   lives here; services never re-declare each other's payloads.
//! - **Narrow Collaborators**: the composition runtime consumes a logger and
//!   a database only through the method-level contracts in [`services`],
//!   never a concrete backend.
//! - **No Direct Calls**: services exchange the payloads in [`events`] over
//!   the event bus; this crate deliberately contains no service logic.

pub mod entities;
pub mod errors;
pub mod events;
pub mod repositories;
pub mod services;

pub use entities::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
