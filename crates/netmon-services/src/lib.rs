//! # Netmon Services
//!
//! The implementations the composition runtime instantiates: loggers, the
//! database handle, in-memory repositories, and the monitor / alerting /
//! notification services. The service-wiring JSON selects between the
//! concrete types and their mock counterparts per environment; nothing in
//! this crate is constructed directly by entry points.
//!
//! Domain services also carry the responder half of the EventRPC contract:
//! `attach_handlers` subscribes a service to its `*_REQUESTED` events, and
//! every request is answered on the correlation-suffixed success or failure
//! event.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod alerting;
pub mod database;
pub mod logger;
pub mod monitor;
pub mod notification;
pub mod repositories;

mod responder;

pub use alerting::{DefaultAlertingService, MockAlertingService};
pub use database::{DatabaseService, MockDatabase};
pub use logger::{LoggerService, MockLogger};
pub use monitor::{DefaultMonitorService, MockMonitorService};
pub use notification::{DefaultNotificationService, MockNotificationService};
pub use repositories::{
    InMemoryAlertRuleRepository, InMemoryIncidentEventRepository, InMemoryNotificationRepository,
    InMemoryPushSubscriptionRepository, InMemorySpeedTestResultRepository,
    InMemoryTargetRepository, InMemoryUserRepository,
};
