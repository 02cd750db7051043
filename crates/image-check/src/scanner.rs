//! Inventory scanning.
//!
//! Pages through the inventory namespace and keeps the keys that denote an
//! instance group manifest of the configured cluster.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::backend::InventoryStore;
use crate::config::RunConfig;
use crate::error::{TransportError, TransportResult};
use crate::model::ObjectKey;

/// Path segment present in every instance group manifest key.
pub const INSTANCE_GROUP_SEGMENT: &str = "/instancegroup/";

/// Lists and filters manifest keys.
pub struct InventoryScanner {
    store: Arc<dyn InventoryStore>,
}

impl InventoryScanner {
    /// Create a scanner over `store`.
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Every manifest key of the configured cluster.
    ///
    /// Pages are requested one after another, each using the previous
    /// page's token. Any failed request aborts the scan.
    #[instrument(skip(self, config), fields(bucket = %config.bucket))]
    pub async fn scan(&self, config: &RunConfig) -> TransportResult<Vec<ObjectKey>> {
        let keys = self.list_all(&config.bucket).await?;
        let total = keys.len();

        let filtered: Vec<ObjectKey> = keys
            .into_iter()
            .filter(|key| {
                let keep = is_manifest_of(key, &config.cluster_filter);
                if !keep {
                    debug!(key = %key, "Skipping object");
                }
                keep
            })
            .collect();

        info!(
            total = total,
            manifests = filtered.len(),
            cluster = %config.cluster_filter,
            "Scanned inventory"
        );
        Ok(filtered)
    }

    /// Concatenate every page of the namespace listing.
    pub async fn list_all(&self, namespace: &str) -> TransportResult<Vec<ObjectKey>> {
        let mut page = self.store.list_page(namespace, None).await.map_err(|e| {
            warn!(error = %e, "Failed to list inventory objects");
            e
        })?;
        let mut keys = std::mem::take(&mut page.keys);
        let mut previous: Option<String> = None;

        while let Some(token) = page.continuation().map(str::to_string) {
            if previous.as_deref() == Some(token.as_str()) {
                return Err(TransportError::StalledPagination {
                    namespace: namespace.to_string(),
                    token,
                });
            }

            debug!(marker = %token, "More inventory objects to query");
            page = self
                .store
                .list_page(namespace, Some(&token))
                .await
                .map_err(|e| {
                    warn!(error = %e, marker = %token, "Failed to list inventory objects");
                    e
                })?;
            keys.append(&mut page.keys);
            previous = Some(token);
        }

        Ok(keys)
    }
}

/// Whether `key` names an instance group manifest.
pub fn is_instance_group_key(key: &ObjectKey) -> bool {
    key.as_str().contains(INSTANCE_GROUP_SEGMENT)
}

/// Whether `key` is an instance group manifest of `cluster_filter`.
pub fn is_manifest_of(key: &ObjectKey, cluster_filter: &str) -> bool {
    is_instance_group_key(key) && key.as_str().contains(cluster_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryInventory, ListPage};

    fn page(keys: &[&str], token: Option<&str>) -> ListPage {
        ListPage {
            keys: keys.iter().map(|k| ObjectKey::new(*k)).collect(),
            next_token: token.map(str::to_string),
        }
    }

    fn config() -> RunConfig {
        RunConfig {
            bucket: "state".to_string(),
            cluster_filter: "prod.example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_key_filters() {
        let manifest = ObjectKey::new("prod.example.com/instancegroup/nodes");
        let other_cluster = ObjectKey::new("dev.example.com/instancegroup/nodes");
        let not_a_manifest = ObjectKey::new("prod.example.com/config");

        assert!(is_manifest_of(&manifest, "prod.example.com"));
        assert!(!is_manifest_of(&other_cluster, "prod.example.com"));
        assert!(!is_manifest_of(&not_a_manifest, "prod.example.com"));
        assert!(!is_instance_group_key(&ObjectKey::new("instancegroup/nodes")));
    }

    #[tokio::test]
    async fn test_scan_follows_tokens() {
        let store = Arc::new(InMemoryInventory::new().with_scripted_pages(vec![
            page(&["prod.example.com/instancegroup/a"], Some("t1")),
            page(&["prod.example.com/config"], Some("t2")),
            page(&["prod.example.com/instancegroup/b"], None),
        ]));
        let scanner = InventoryScanner::new(store.clone());

        let keys = scanner.scan(&config()).await.unwrap();

        assert_eq!(
            keys,
            vec![
                ObjectKey::new("prod.example.com/instancegroup/a"),
                ObjectKey::new("prod.example.com/instancegroup/b"),
            ]
        );
        assert_eq!(store.list_requests(), 3);
    }

    #[tokio::test]
    async fn test_empty_token_terminates() {
        let store = Arc::new(InMemoryInventory::new().with_scripted_pages(vec![
            page(&["a", "b"], Some("")),
            page(&["never"], None),
        ]));
        let scanner = InventoryScanner::new(store.clone());

        let keys = scanner.list_all("state").await.unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(store.list_requests(), 1);
    }

    #[tokio::test]
    async fn test_repeated_token_is_fatal() {
        let store = Arc::new(InMemoryInventory::new().with_scripted_pages(vec![
            page(&["a"], Some("same")),
            page(&["b"], Some("same")),
            page(&["c"], None),
        ]));
        let scanner = InventoryScanner::new(store.clone());

        let err = scanner.list_all("state").await.unwrap_err();

        assert!(matches!(err, TransportError::StalledPagination { ref token, .. } if token == "same"));
        assert_eq!(store.list_requests(), 2);
    }

    #[tokio::test]
    async fn test_failure_mid_pagination_aborts() {
        let store = Arc::new(
            InMemoryInventory::new()
                .with_scripted_pages(vec![page(&["a"], Some("t1")), page(&["b"], None)])
                .failing_list_request(1),
        );
        let scanner = InventoryScanner::new(store);

        let err = scanner.scan(&config()).await.unwrap_err();
        assert!(matches!(err, TransportError::Request { operation: "list objects", .. }));
    }
}
