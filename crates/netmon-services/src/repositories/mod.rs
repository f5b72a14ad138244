//! # In-Memory Repositories
//!
//! Simple field-mapper implementations of the repository contracts. The
//! concrete constructors take the wired [`Database`] handle and refuse to
//! operate while it is disconnected; the `seeded` constructors back the mock
//! wiring environments with canned rows and no database gate.

use std::sync::Arc;

use netmon_types::{Database, RepositoryError};

pub mod alerts;
pub mod notifications;
pub mod speed_tests;
pub mod targets;
pub mod users;

pub use alerts::{InMemoryAlertRuleRepository, InMemoryIncidentEventRepository};
pub use notifications::{InMemoryNotificationRepository, InMemoryPushSubscriptionRepository};
pub use speed_tests::InMemorySpeedTestResultRepository;
pub use targets::InMemoryTargetRepository;
pub use users::InMemoryUserRepository;

/// Gate repository operations on the wired database handle, when present.
pub(crate) fn ensure_connected(
    database: &Option<Arc<dyn Database>>,
) -> Result<(), RepositoryError> {
    match database {
        Some(db) if !db.is_connected() => {
            Err(RepositoryError::Storage("database not connected".into()))
        }
        _ => Ok(()),
    }
}
