//! # Network Monitor - Monolith Entry Point
//!
//! Runs every service in one process over one in-process bus. The wiring
//! file decides which implementations back them; distributed deployment
//! uses the per-service binaries instead, each bootstrapping its own wiring
//! file, with no code changes to the services themselves.

use anyhow::{Context, Result};

use netmon_bus::EventBus;
use netmon_types::{Database, Logger};
use netmon_runtime::bootstrap::init_tracing;
use netmon_runtime::{bootstrap, BootstrapOptions};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let context = bootstrap(BootstrapOptions::new("netmon"))
        .await
        .context("failed to bootstrap application")?;

    context
        .logger
        .info("Network monitor running; press Ctrl-C to stop", None);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    if let Some(database) = &context.database {
        if let Err(e) = database.disconnect().await {
            context.logger.warn(
                "Database disconnect failed",
                Some(serde_json::json!({ "error": e.to_string() })),
            );
        }
    }
    context.event_bus.disconnect().await;
    context.logger.info("Shutdown complete", None);
    Ok(())
}
