//! In-memory backends for development and testing

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::*;
use crate::error::{TransportError, TransportResult};
use crate::model::{CatalogEntry, ObjectKey};
use crate::owners::TrustedOwner;

/// In-memory inventory store.
///
/// Listings are paged `page_size` keys at a time in key order, with the last
/// key of a page used as the continuation token. Scripted pages replace the
/// generated listing entirely, which lets tests feed arbitrary token
/// sequences.
#[derive(Debug)]
pub struct InMemoryInventory {
    objects: RwLock<HashMap<String, BTreeMap<ObjectKey, Vec<u8>>>>,
    scripted_pages: Option<Vec<ListPage>>,
    page_size: usize,
    latency: Option<Duration>,
    fail_list_request: Option<usize>,
    failing_keys: HashSet<ObjectKey>,
    list_requests: AtomicUsize,
    get_requests: AtomicUsize,
}

impl Default for InMemoryInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInventory {
    /// Create an empty inventory with a page size of 1000.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            scripted_pages: None,
            page_size: 1000,
            latency: None,
            fail_list_request: None,
            failing_keys: HashSet::new(),
            list_requests: AtomicUsize::new(0),
            get_requests: AtomicUsize::new(0),
        }
    }

    /// Add an object.
    pub fn with_object(
        mut self,
        namespace: &str,
        key: impl Into<ObjectKey>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.objects
            .get_mut()
            .entry(namespace.to_string())
            .or_default()
            .insert(key.into(), body.into());
        self
    }

    /// Keys returned per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Serve these pages, one per list request, instead of the stored keys.
    pub fn with_scripted_pages(mut self, pages: Vec<ListPage>) -> Self {
        self.scripted_pages = Some(pages);
        self
    }

    /// Delay every request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the list request with this zero-based index.
    pub fn failing_list_request(mut self, index: usize) -> Self {
        self.fail_list_request = Some(index);
        self
    }

    /// Fail every fetch of `key`.
    pub fn failing_key(mut self, key: impl Into<ObjectKey>) -> Self {
        self.failing_keys.insert(key.into());
        self
    }

    /// Number of list requests served so far.
    pub fn list_requests(&self) -> usize {
        self.list_requests.load(Ordering::SeqCst)
    }

    /// Number of object fetches served so far.
    pub fn get_requests(&self) -> usize {
        self.get_requests.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventory {
    async fn list_page(&self, namespace: &str, token: Option<&str>) -> TransportResult<ListPage> {
        let request = self.list_requests.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.fail_list_request == Some(request) {
            return Err(TransportError::request(
                "list objects",
                format!("injected failure on request {}", request),
            ));
        }

        if let Some(pages) = &self.scripted_pages {
            return pages.get(request).cloned().ok_or_else(|| {
                TransportError::request("list objects", "no more scripted pages")
            });
        }

        let objects = self.objects.read().await;
        let Some(bucket) = objects.get(namespace) else {
            return Err(TransportError::Status {
                operation: "list objects",
                status: 404,
                body: format!("no such namespace: {}", namespace),
            });
        };

        let remaining: Vec<ObjectKey> = bucket
            .keys()
            .filter(|key| token.map_or(true, |marker| key.as_str() > marker))
            .cloned()
            .collect();

        let keys: Vec<ObjectKey> = remaining.iter().take(self.page_size).cloned().collect();
        let next_token = if remaining.len() > keys.len() {
            keys.last().map(|key| key.as_str().to_string())
        } else {
            None
        };

        Ok(ListPage { keys, next_token })
    }

    async fn get_object(&self, namespace: &str, key: &ObjectKey) -> TransportResult<Vec<u8>> {
        self.get_requests.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.failing_keys.contains(key) {
            return Err(TransportError::request(
                "get object",
                format!("injected failure for {}", key),
            ));
        }

        let objects = self.objects.read().await;
        objects
            .get(namespace)
            .and_then(|bucket| bucket.get(key))
            .cloned()
            .ok_or_else(|| TransportError::Status {
                operation: "get object",
                status: 404,
                body: format!("no such key: {}", key),
            })
    }
}

/// In-memory image catalog.
///
/// Every image is stored with its owning account, and only images owned by
/// a requested owner are returned.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    images: RwLock<Vec<(String, CatalogEntry)>>,
    latency: Option<Duration>,
    failure: Option<String>,
    requests: AtomicUsize,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image owned by a trusted owner.
    pub fn with_image(self, owner: TrustedOwner, entry: CatalogEntry) -> Self {
        self.with_owned_image(owner.account_id(), entry)
    }

    /// Add an image owned by an arbitrary account.
    pub fn with_owned_image(mut self, owner_account: &str, entry: CatalogEntry) -> Self {
        self.images
            .get_mut()
            .push((owner_account.to_string(), entry));
        self
    }

    /// Delay every request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every request with `reason`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Number of describe requests served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageCatalog for InMemoryCatalog {
    async fn describe_images(
        &self,
        _region: &str,
        owners: &[TrustedOwner; 4],
    ) -> TransportResult<Vec<CatalogEntry>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(reason) = &self.failure {
            return Err(TransportError::request("describe images", reason));
        }

        let allowed: HashSet<&str> = owners.iter().map(|owner| owner.account_id()).collect();
        let images = self.images.read().await;
        Ok(images
            .iter()
            .filter(|(owner, _)| allowed.contains(owner.as_str()))
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}
