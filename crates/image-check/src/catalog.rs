//! Image catalog fetching.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::backend::ImageCatalog;
use crate::config::RunConfig;
use crate::error::TransportResult;
use crate::model::CatalogEntry;

/// Fetches every image published by the trusted owners.
pub struct ImageCatalogFetcher {
    catalog: Arc<dyn ImageCatalog>,
}

impl ImageCatalogFetcher {
    /// Create a fetcher over `catalog`.
    pub fn new(catalog: Arc<dyn ImageCatalog>) -> Self {
        Self { catalog }
    }

    /// Describe the trusted owners' images in the configured region.
    ///
    /// Single request; a failure aborts the run.
    #[instrument(skip(self, config), fields(region = %config.region))]
    pub async fn fetch(&self, config: &RunConfig) -> TransportResult<Vec<CatalogEntry>> {
        let owners = config.trusted_owners();
        let images = self
            .catalog
            .describe_images(&config.region, &owners)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list images");
                e
            })?;

        info!(total = images.len(), "Retrieved images");
        Ok(images)
    }
}
