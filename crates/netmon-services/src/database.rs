//! # Database Handle
//!
//! The container-visible database collaborator. Connection management only;
//! the actual engine sits behind the repositories and is out of scope here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use netmon_types::{Database, Logger, ServiceError};

/// Default connection string when neither wiring params nor the environment
/// provide one.
const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/netmon";

/// Concrete database handle.
///
/// Tracks connection state and logs transitions; repositories consult
/// [`Database::is_connected`] before touching their stores.
pub struct DatabaseService {
    url: String,
    connected: AtomicBool,
    logger: Arc<dyn Logger>,
}

impl DatabaseService {
    /// Build a handle for `url`; falls back to `DATABASE_URL`, then to the
    /// compiled-in default.
    pub fn new(url: Option<String>, logger: Arc<dyn Logger>) -> Self {
        let url = url
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        Self {
            url,
            connected: AtomicBool::new(false),
            logger,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Database for DatabaseService {
    async fn connect(&self) -> Result<(), ServiceError> {
        if self.connected.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.logger
            .info("Database connected", Some(json!({ "url": self.url })));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ServiceError> {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.logger.info("Database disconnected", None);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Database double for mock wiring environments.
///
/// Optionally fails `connect` so startup failure paths can be exercised.
#[derive(Default)]
pub struct MockDatabase {
    connected: AtomicBool,
    fail_connect: bool,
}

impl MockDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose `connect` always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            connected: AtomicBool::new(false),
            fail_connect: true,
        }
    }
}

#[async_trait]
impl Database for MockDatabase {
    async fn connect(&self) -> Result<(), ServiceError> {
        if self.fail_connect {
            return Err(ServiceError::Database("mock connect failure".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ServiceError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
