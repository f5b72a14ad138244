//! # Notification Service Entry Point
//!
//! Bootstraps only the notification stack from
//! `service-wiring/notification-service.json` (unless
//! `SERVICE_WIRING_CONFIG` overrides it) and serves notification and push
//! subscription requests over the bus.

use anyhow::{Context, Result};

use netmon_bus::EventBus;
use netmon_types::Logger;
use netmon_runtime::bootstrap::init_tracing;
use netmon_runtime::{bootstrap, BootstrapOptions};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let context = bootstrap(
        BootstrapOptions::new("notification-service").with_environment("notification-service"),
    )
    .await
    .context("failed to bootstrap notification service")?;

    context
        .logger
        .info("Notification service running; press Ctrl-C to stop", None);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    context.event_bus.disconnect().await;
    Ok(())
}
