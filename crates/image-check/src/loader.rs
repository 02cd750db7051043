//! Manifest loading.
//!
//! Fetches the body behind each filtered key and decodes it into an
//! [`InstanceGroupRecord`]. Fetch failures are fatal; empty and malformed
//! bodies are skipped.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};

use crate::backend::InventoryStore;
use crate::error::{ParseError, RecordError, TransportResult};
use crate::model::{InstanceGroupManifest, InstanceGroupRecord, ObjectKey};

/// Result of loading one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A usable record.
    Loaded(InstanceGroupRecord),
    /// The object exists but has no body.
    Empty,
    /// The body could not be decoded.
    Malformed(ParseError),
    /// The manifest decoded but does not name an image.
    Invalid(RecordError),
}

/// Everything the loader produced for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedManifests {
    /// Decoded manifests in key order. A manifest without an image is kept
    /// as its error so it is reported where it appeared.
    pub entries: Vec<Result<InstanceGroupRecord, RecordError>>,
    /// Keys skipped because of an empty or malformed body.
    pub skipped: usize,
}

impl LoadedManifests {
    /// Records ready for matching.
    pub fn records(&self) -> impl Iterator<Item = &InstanceGroupRecord> {
        self.entries.iter().filter_map(|entry| entry.as_ref().ok())
    }

    /// Number of manifests that decoded but name no image.
    pub fn invalid_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_err()).count()
    }
}

/// Fetches and decodes instance group manifests.
pub struct ManifestLoader {
    store: Arc<dyn InventoryStore>,
    concurrency: usize,
}

impl ManifestLoader {
    /// Create a loader with at most `concurrency` fetches in flight.
    pub fn new(store: Arc<dyn InventoryStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Load one key. Only a failed fetch is an error.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn load(&self, namespace: &str, key: &ObjectKey) -> TransportResult<LoadOutcome> {
        fetch(self.store.as_ref(), namespace, key).await
    }

    /// Load every key, keeping records in key order.
    ///
    /// The first fetch failure aborts the whole load.
    pub async fn load_all(
        &self,
        namespace: &str,
        keys: &[ObjectKey],
    ) -> TransportResult<LoadedManifests> {
        info!(count = keys.len(), "Reading manifest contents");

        // Each load owns its key and a store handle so the stream stays Send.
        let outcomes: Vec<LoadOutcome> = stream::iter(keys.iter().cloned())
            .map(|key| {
                let store = Arc::clone(&self.store);
                let namespace = namespace.to_string();
                async move { fetch(store.as_ref(), &namespace, &key).await }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut loaded = LoadedManifests::default();
        for outcome in outcomes {
            match outcome {
                LoadOutcome::Loaded(record) => loaded.entries.push(Ok(record)),
                LoadOutcome::Invalid(err) => loaded.entries.push(Err(err)),
                LoadOutcome::Empty | LoadOutcome::Malformed(_) => loaded.skipped += 1,
            }
        }

        info!(
            records = loaded.records().count(),
            invalid = loaded.invalid_count(),
            skipped = loaded.skipped,
            "Loaded instance groups"
        );
        Ok(loaded)
    }
}

async fn fetch(
    store: &dyn InventoryStore,
    namespace: &str,
    key: &ObjectKey,
) -> TransportResult<LoadOutcome> {
    let body = store.get_object(namespace, key).await.map_err(|e| {
        warn!(key = %key, error = %e, "Failed to fetch manifest");
        e
    })?;

    Ok(decode(key, &body))
}

/// Decode one manifest body.
pub fn decode(key: &ObjectKey, body: &[u8]) -> LoadOutcome {
    if body.iter().all(u8::is_ascii_whitespace) {
        warn!(key = %key, "Manifest body was empty");
        return LoadOutcome::Empty;
    }

    let manifest = match InstanceGroupManifest::from_yaml(body) {
        Ok(manifest) => manifest,
        Err(e) => {
            let err = ParseError {
                key: key.to_string(),
                reason: e.to_string(),
            };
            warn!(error = %err, "Skipping malformed manifest");
            return LoadOutcome::Malformed(err);
        }
    };

    match manifest.into_record() {
        Ok(record) => {
            debug!(key = %key, name = %record.name(), "Decoded instance group");
            LoadOutcome::Loaded(record)
        }
        Err(err) => LoadOutcome::Invalid(err),
    }
}
