//! Run configuration.
//!
//! A [`RunConfig`] is built once per run (defaults, optional file, then
//! `IMAGE_CHECK_*` environment variables), validated, and passed by
//! reference to every component. It is never mutated during a run.

use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::owners::TrustedOwner;

/// Expected shape of a provider region, e.g. `us-east-1`.
pub const REGION_PATTERN: &str = r"^[\w]{2}[-][\w]{4,9}[-][\d]$";

/// Time kept back from an externally supplied deadline for reporting.
pub const REPORT_MARGIN: Duration = Duration::from_secs(5);

/// Immutable configuration for one check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Provider region queried for images and manifests.
    #[serde(default = "default_region")]
    pub region: String,

    /// Inventory namespace (bucket) holding the manifests.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Substring every manifest key must contain.
    #[serde(default = "default_cluster_filter")]
    pub cluster_filter: String,

    /// Deadline for the whole run in seconds.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Maximum manifest fetches in flight.
    #[serde(default = "default_load_concurrency")]
    pub load_concurrency: usize,

    /// Verbose logging.
    #[serde(default)]
    pub debug: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            bucket: default_bucket(),
            cluster_filter: default_cluster_filter(),
            deadline_secs: default_deadline_secs(),
            load_concurrency: default_load_concurrency(),
            debug: false,
        }
    }
}

// Default value helpers
fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "kops-state-store".to_string()
}

fn default_cluster_filter() -> String {
    "cluster-fqdn".to_string()
}

fn default_deadline_secs() -> u64 {
    60
}

fn default_load_concurrency() -> usize {
    8
}

impl RunConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        let defaults = config::Config::try_from(&RunConfig::default())
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        builder = builder.add_source(defaults);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with IMAGE_CHECK_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("IMAGE_CHECK")
                .prefix_separator("_")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Check every field before the run touches the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_region(&self.region) {
            return Err(ConfigError::InvalidRegion(self.region.clone()));
        }
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::MissingField("bucket"));
        }
        if self.cluster_filter.trim().is_empty() {
            return Err(ConfigError::MissingField("cluster_filter"));
        }
        if self.deadline_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "deadline_secs",
                reason: "must be at least one second".to_string(),
            });
        }
        if self.load_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "load_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Deadline for the whole run.
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Trusted image owners. Fixed; not part of the loaded configuration.
    pub fn trusted_owners(&self) -> [TrustedOwner; 4] {
        TrustedOwner::ALL
    }
}

/// Whether `region` has the `xx-xxxx-N` shape.
pub fn is_valid_region(region: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(REGION_PATTERN).expect("region pattern compiles"))
        .is_match(region)
}

/// Interpret a debug flag value. Accepts `t`, `true` and `yes`.
pub fn parse_debug_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "t" | "true" | "yes"
    )
}

/// Turn an absolute deadline (unix seconds) into a run budget.
///
/// [`REPORT_MARGIN`] is held back so the verdict can still be reported.
/// Returns `None` when the deadline is already too close.
pub fn deadline_from_unix(deadline_unix: u64, now: SystemTime) -> Option<Duration> {
    let now_secs = now.duration_since(UNIX_EPOCH).ok()?.as_secs();
    let remaining = Duration::from_secs(deadline_unix.checked_sub(now_secs)?);
    remaining
        .checked_sub(REPORT_MARGIN)
        .filter(|budget| !budget.is_zero())
}
