//! # image-check - Image Availability Reconciliation
//!
//! Verifies that every machine image referenced by a cluster's instance group
//! manifests exists in the provider's image catalog.
//!
//! ## Overview
//!
//! One run goes through four stages:
//!
//! - **Scan**: page through the inventory store and keep the keys that hold
//!   an instance group manifest of the configured cluster
//! - **Load**: fetch and decode each manifest into an [`InstanceGroupRecord`]
//! - **Fetch**: describe every image published by the [`TrustedOwner`]s
//! - **Reconcile**: match each record's image reference against the catalog
//!
//! Loading and fetching run concurrently. The whole run is bounded by the
//! configured deadline.
//!
//! ## Key Components
//!
//! - [`Reconciler`]: drives a run and produces a [`CheckReport`]
//! - [`InventoryScanner`], [`ManifestLoader`], [`ImageCatalogFetcher`]: the stages
//! - [`backend`]: transport traits with in-memory and HTTP implementations
//! - [`matcher`]: name extraction and catalog matching rules
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use image_check::{
//!     backend::{InMemoryCatalog, InMemoryInventory},
//!     CatalogEntry, Reconciler, RunConfig, TrustedOwner,
//! };
//!
//! # async fn example() -> Result<(), image_check::CheckError> {
//! let config = RunConfig {
//!     bucket: "state-store".to_string(),
//!     cluster_filter: "prod.example.com".to_string(),
//!     ..Default::default()
//! };
//!
//! let inventory = Arc::new(InMemoryInventory::new().with_object(
//!     "state-store",
//!     "prod.example.com/instancegroup/nodes",
//!     "metadata:\n  name: nodes\nspec:\n  image: kope.io/k8s-1.27\n",
//! ));
//! let catalog = Arc::new(
//!     InMemoryCatalog::new()
//!         .with_image(TrustedOwner::Kopeio, CatalogEntry::named("k8s-1.27-amd64")),
//! );
//!
//! let reconciler = Reconciler::new(config, inventory, catalog)?;
//! let report = reconciler.run().await?;
//! assert!(report.is_healthy());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Configuration and transport errors end a run without a verdict. Malformed
//! manifests are logged and skipped. Instance groups without an image and
//! unmatched images become [`Diagnostic`]s in the report.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod model;
pub mod owners;
pub mod reconciler;
pub mod report;
pub mod scanner;

// Re-export main types
pub use catalog::ImageCatalogFetcher;
pub use config::RunConfig;
pub use error::{
    CheckError, CheckResult, ConfigError, ParseError, RecordError, TransportError,
    TransportResult,
};
pub use loader::{LoadOutcome, LoadedManifests, ManifestLoader};
pub use model::{CatalogEntry, Diagnostic, InstanceGroupManifest, InstanceGroupRecord, ObjectKey};
pub use owners::TrustedOwner;
pub use reconciler::{check_record, reconcile, Reconciler};
pub use report::{CheckReport, Verdict};
pub use scanner::InventoryScanner;
