//! Command line and environment overrides.

use std::time::SystemTime;

use clap::Parser;
use image_check::config::{deadline_from_unix, parse_debug_flag};
use image_check::RunConfig;

/// Image availability probe
#[derive(Debug, Parser)]
#[command(name = "image-check")]
#[command(about = "Checks that every image referenced by the cluster's instance groups exists", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "IMAGE_CHECK_CONFIG")]
    pub config: Option<String>,

    /// Provider region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Inventory namespace holding the manifests
    #[arg(long, env = "AWS_S3_BUCKET_NAME")]
    pub bucket: Option<String>,

    /// Cluster name every manifest key must contain
    #[arg(long, env = "CLUSTER_FQDN")]
    pub cluster: Option<String>,

    /// Absolute run deadline as unix seconds
    #[arg(long, env = "KH_CHECK_RUN_DEADLINE")]
    pub deadline: Option<u64>,

    /// Inventory gateway endpoint
    #[arg(long, env = "IMAGE_CHECK_INVENTORY_URL", default_value = "http://localhost:9000")]
    pub inventory_url: String,

    /// Catalog gateway endpoint (defaults to the inventory endpoint)
    #[arg(long, env = "IMAGE_CHECK_CATALOG_URL")]
    pub catalog_url: Option<String>,

    /// Endpoint receiving the verdict; logs only when unset
    #[arg(long, env = "KH_REPORTING_URL")]
    pub reporting_url: Option<String>,

    /// Debug logging (t, true, yes)
    #[arg(long, env = "DEBUG")]
    pub debug: Option<String>,

    /// Log level
    #[arg(long, env = "IMAGE_CHECK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "IMAGE_CHECK_LOG_JSON")]
    pub json: bool,
}

impl Cli {
    /// Whether debug logging was requested.
    pub fn debug_enabled(&self) -> bool {
        self.debug.as_deref().is_some_and(parse_debug_flag)
    }

    /// Catalog endpoint to use.
    pub fn catalog_endpoint(&self) -> &str {
        self.catalog_url.as_deref().unwrap_or(&self.inventory_url)
    }

    /// Log filter for the run. Debug from any layer wins over `--log-level`.
    pub fn log_directive(&self, config: &RunConfig) -> String {
        if config.debug || self.debug_enabled() {
            "debug".to_string()
        } else {
            self.log_level.clone()
        }
    }

    /// Apply command line overrides on top of the loaded configuration.
    pub fn apply(&self, mut config: RunConfig, now: SystemTime) -> RunConfig {
        if let Some(region) = self.region.as_ref().filter(|r| !r.is_empty()) {
            config.region = region.clone();
        }
        if let Some(bucket) = self.bucket.as_ref().filter(|b| !b.is_empty()) {
            config.bucket = bucket.clone();
        }
        if let Some(cluster) = self.cluster.as_ref().filter(|c| !c.is_empty()) {
            config.cluster_filter = cluster.clone();
        }
        if let Some(deadline) = self.deadline {
            // An exhausted budget runs for one second.
            let budget = deadline_from_unix(deadline, now).unwrap_or_default();
            config.deadline_secs = budget.as_secs().max(1);
        }
        if self.debug_enabled() {
            config.debug = true;
        }
        config
    }
}
