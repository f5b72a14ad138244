//! # Netmon Bus - Event Bus for Inter-Service Communication
//!
//! All inter-service communication goes through this bus; services never
//! import one another. Two layers live here:
//!
//! - [`bus`]: the publish/subscribe hub ([`InProcessEventBus`]) with dynamic
//!   (string name, JSON payload) and typed (serde-checked payload) entry
//!   points, both feeding one listener table.
//! - [`rpc`]: [`EventRpc`], a request/response illusion over the bus; a
//!   correlation id routes exactly one success or failure event back to the
//!   pending request, with a timeout as the third outcome.
//!
//! ## Choreography Pattern
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Monitor     │                    │  Alerting    │
//! │              │    emit()          │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘   on()
//! ```
//!
//! ## Delivery Semantics
//!
//! - Fan-out to all handlers of an event, in registration order.
//! - A failing handler is isolated; the rest still run.
//! - Emitting with zero subscribers is a silent no-op, never an error;
//!   publishers may start before any subscriber has attached.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod rpc;

// Re-export main types
pub use bus::{
    BusError, EventBus, EventHandler, HandlerError, HandlerId, InProcessEventBus,
    RecordingEventBus, TypedBus,
};
pub use rpc::{EventRpc, RpcError, TypedRequest, DEFAULT_RPC_TIMEOUT};
