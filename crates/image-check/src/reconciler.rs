//! Reconciliation of declared instance group images against the catalog.
//!
//! The [`Reconciler`] drives one run: scan and load the manifests while the
//! catalog is fetched, then match every record and collect diagnostics.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::backend::{ImageCatalog, InventoryStore};
use crate::catalog::ImageCatalogFetcher;
use crate::config::RunConfig;
use crate::error::{CheckResult, RecordError, TransportError};
use crate::loader::ManifestLoader;
use crate::matcher::{extract_target_name, find_match};
use crate::model::{CatalogEntry, Diagnostic, InstanceGroupRecord};
use crate::report::CheckReport;
use crate::scanner::InventoryScanner;

/// Orchestrates one image availability check.
pub struct Reconciler {
    config: RunConfig,
    scanner: InventoryScanner,
    loader: ManifestLoader,
    fetcher: ImageCatalogFetcher,
}

impl Reconciler {
    /// Create a reconciler. The configuration is validated here, before any I/O.
    pub fn new(
        config: RunConfig,
        store: Arc<dyn InventoryStore>,
        catalog: Arc<dyn ImageCatalog>,
    ) -> CheckResult<Self> {
        config.validate()?;

        Ok(Self {
            scanner: InventoryScanner::new(store.clone()),
            loader: ManifestLoader::new(store, config.load_concurrency),
            fetcher: ImageCatalogFetcher::new(catalog),
            config,
        })
    }

    /// Configuration of this reconciler.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the check within the configured deadline.
    ///
    /// Transport failures and deadline expiry end the run without a report.
    pub async fn run(&self) -> CheckResult<CheckReport> {
        let deadline = self.config.deadline();
        let run_id = Uuid::new_v4();

        match tokio::time::timeout(deadline, self.run_once(run_id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(run_id = %run_id, deadline = ?deadline, "Check deadline exceeded");
                Err(TransportError::DeadlineExceeded(deadline).into())
            }
        }
    }

    #[instrument(skip(self), fields(cluster = %self.config.cluster_filter))]
    async fn run_once(&self, run_id: Uuid) -> CheckResult<CheckReport> {
        let started_at = Utc::now();
        info!("Running check");

        // Manifests and catalog are independent; fetch them side by side.
        let inventory = async {
            let keys = self.scanner.scan(&self.config).await?;
            let loaded = self.loader.load_all(&self.config.bucket, &keys).await?;
            Ok::<_, TransportError>((keys.len(), loaded))
        };
        let ((keys_scanned, loaded), catalog) =
            tokio::try_join!(inventory, self.fetcher.fetch(&self.config))?;

        let diagnostics = reconcile(&loaded.entries, &catalog);

        let report = CheckReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            keys_scanned,
            records_checked: loaded.records().count(),
            manifests_skipped: loaded.skipped,
            catalog_size: catalog.len(),
            diagnostics,
        };

        if report.is_healthy() {
            info!(records = report.records_checked, "Instance group images are available");
        } else {
            warn!(failures = report.diagnostics.len(), "Instance group images are missing");
        }
        Ok(report)
    }
}

/// Match every loaded manifest against the catalog.
///
/// Entries are independent: each failure adds one diagnostic and the pass
/// continues. A manifest that names no image reports its error in place, so
/// diagnostics follow input order.
pub fn reconcile(
    entries: &[Result<InstanceGroupRecord, RecordError>],
    catalog: &[CatalogEntry],
) -> Vec<Diagnostic> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            Ok(record) => check_record(record, catalog).err(),
            Err(err) => Some(Diagnostic::from(err.clone())),
        })
        .collect()
}

/// Check one record, returning the diagnostic it produces, if any.
pub fn check_record(
    record: &InstanceGroupRecord,
    catalog: &[CatalogEntry],
) -> Result<(), Diagnostic> {
    debug!(name = %record.name(), image = %record.image_reference(), "Looking at instance group");

    let target = extract_target_name(record.image_reference())?;

    match find_match(catalog, target) {
        Some(entry) => {
            debug!(name = %record.name(), image = %entry.label(), "Matched catalog image");
            Ok(())
        }
        None => Err(Diagnostic::unmatched(record.image_reference())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reference: &str) -> InstanceGroupRecord {
        InstanceGroupRecord::new("ig-name", reference).unwrap()
    }

    fn entry(reference: &str) -> Result<InstanceGroupRecord, RecordError> {
        Ok(record(reference))
    }

    #[test]
    fn test_reference_with_owner_matches_name_substring() {
        let catalog = vec![CatalogEntry::named("k8s-1.27-hvm")];
        assert!(check_record(&record("kope.io/k8s-1.27"), &catalog).is_ok());
    }

    #[test]
    fn test_bare_reference_matches_location() {
        let catalog = vec![CatalogEntry::located("kope.io/k8s-1.27")];
        assert!(check_record(&record("k8s-1.27"), &catalog).is_ok());
    }

    #[test]
    fn test_unmatched_reference_is_reported_verbatim() {
        let catalog = vec![CatalogEntry::named("other")];
        let diagnostics = reconcile(&[entry("missing-image")], &catalog);
        assert_eq!(diagnostics, vec![Diagnostic::unmatched("missing-image")]);
    }

    #[test]
    fn test_all_records_are_checked() {
        let catalog = vec![CatalogEntry::named("k8s-1.27")];
        let records = vec![
            entry("kope.io/missing-a"),
            entry("kope.io/k8s-1.27"),
            entry(" kope.io/missing-b"),
        ];

        let diagnostics = reconcile(&records, &catalog);

        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::unmatched("kope.io/missing-a"),
                Diagnostic::unmatched(" kope.io/missing-b"),
            ]
        );
    }

    #[test]
    fn test_missing_image_reported_in_input_order() {
        let catalog = vec![CatalogEntry::named("k8s-1.27")];
        let entries = vec![
            entry("kope.io/missing"),
            Err(RecordError::MissingImage("b".to_string())),
            entry("kope.io/k8s-1.27"),
        ];

        let diagnostics = reconcile(&entries, &catalog);

        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::unmatched("kope.io/missing"),
                Diagnostic::new("instance group b does not define an image"),
            ]
        );
    }

    #[test]
    fn test_empty_catalog_fails_every_record() {
        let diagnostics = reconcile(&[entry("a"), entry("b")], &[]);
        assert_eq!(diagnostics.len(), 2);
    }
}
