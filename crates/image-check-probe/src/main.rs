//! image-check - Image availability probe
//!
//! Runs one check and reports the verdict:
//! - Layered configuration (defaults, file, environment, flags)
//! - Inventory and catalog access through the HTTP gateway
//! - A single success or failure report per run

use std::sync::Arc;
use std::time::SystemTime;

use clap::Parser;
use image_check::backend::{HttpCatalog, HttpInventory};
use image_check::{CheckError, Reconciler, RunConfig};
use image_check_probe::{
    deliver, reporter_for, run_guarded, shutdown_signal, Cli, ProbeError, ProbeOutcome, ProbeResult,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Configuration is resolved first so its debug flag can drive logging.
    let config = RunConfig::load(cli.config.as_deref())
        .map(|config| cli.apply(config, SystemTime::now()));
    let level = match &config {
        Ok(config) => cli.log_directive(config),
        Err(_) => cli.log_directive(&RunConfig::default()),
    };

    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let reporter = reporter_for(cli.reporting_url.as_deref())?;

    let prepared = config
        .map_err(|e| ProbeError::from(CheckError::from(e)))
        .and_then(|config| prepare(&cli, config));

    let outcome = match prepared {
        Ok(reconciler) => {
            let config = reconciler.config();
            info!(
                region = %config.region,
                bucket = %config.bucket,
                cluster = %config.cluster_filter,
                deadline_secs = config.deadline_secs,
                "Starting image check"
            );

            tokio::select! {
                outcome = run_guarded(async move { reconciler.run().await }) => outcome,
                _ = shutdown_signal() => {
                    ProbeOutcome::Unhealthy(vec!["check interrupted by shutdown signal".to_string()])
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to prepare check");
            ProbeOutcome::Unhealthy(vec![e.to_string()])
        }
    };

    deliver(reporter.as_ref(), outcome).await?;
    Ok(())
}

/// Build the reconciler over the HTTP gateway backends.
fn prepare(cli: &Cli, config: RunConfig) -> ProbeResult<Reconciler> {
    let inventory = Arc::new(HttpInventory::new(&cli.inventory_url)?);
    let catalog = Arc::new(HttpCatalog::new(cli.catalog_endpoint())?);

    Ok(Reconciler::new(config, inventory, catalog)?)
}
