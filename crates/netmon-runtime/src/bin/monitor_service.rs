//! # Monitor Service Entry Point
//!
//! Bootstraps only the monitor stack from `service-wiring/monitor-service.json`
//! (unless `SERVICE_WIRING_CONFIG` overrides it) and serves target and
//! speed-test requests over the bus.

use anyhow::{Context, Result};

use netmon_bus::EventBus;
use netmon_types::Logger;
use netmon_runtime::bootstrap::init_tracing;
use netmon_runtime::{bootstrap, BootstrapOptions};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let context = bootstrap(
        BootstrapOptions::new("monitor-service").with_environment("monitor-service"),
    )
    .await
    .context("failed to bootstrap monitor service")?;

    context
        .logger
        .info("Monitor service running; press Ctrl-C to stop", None);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    context.event_bus.disconnect().await;
    Ok(())
}
