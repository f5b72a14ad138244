//! # Alerting Service Entry Point
//!
//! Bootstraps only the alerting stack from `service-wiring/alerting-service.json`
//! (unless `SERVICE_WIRING_CONFIG` overrides it) and serves alert-rule and
//! incident requests over the bus.

use anyhow::{Context, Result};

use netmon_bus::EventBus;
use netmon_types::Logger;
use netmon_runtime::bootstrap::init_tracing;
use netmon_runtime::{bootstrap, BootstrapOptions};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let context = bootstrap(
        BootstrapOptions::new("alerting-service").with_environment("alerting-service"),
    )
    .await
    .context("failed to bootstrap alerting service")?;

    context
        .logger
        .info("Alerting service running; press Ctrl-C to stop", None);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    context.event_bus.disconnect().await;
    Ok(())
}
