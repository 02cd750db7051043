//! Backend trait definitions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportResult;
use crate::model::{CatalogEntry, ObjectKey};
use crate::owners::TrustedOwner;

/// One page of an inventory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    /// Keys on this page, in provider order.
    pub keys: Vec<ObjectKey>,

    /// Cursor for the next page. `None` or empty means this was the last.
    pub next_token: Option<String>,
}

impl ListPage {
    /// Continuation token, if one was returned and is non-empty.
    pub fn continuation(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|token| !token.is_empty())
    }
}

/// Key-value store holding the cluster manifests.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// List one page of keys in `namespace`, starting after `token`.
    async fn list_page(&self, namespace: &str, token: Option<&str>) -> TransportResult<ListPage>;

    /// Fetch the body stored under `key`. An empty object yields an empty vec.
    async fn get_object(&self, namespace: &str, key: &ObjectKey) -> TransportResult<Vec<u8>>;
}

/// Provider image catalog.
#[async_trait]
pub trait ImageCatalog: Send + Sync {
    /// Describe every image published by one of `owners` in `region`.
    async fn describe_images(
        &self,
        region: &str,
        owners: &[TrustedOwner; 4],
    ) -> TransportResult<Vec<CatalogEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_ends_listing() {
        let page = ListPage {
            keys: vec![],
            next_token: Some(String::new()),
        };
        assert_eq!(page.continuation(), None);

        let page = ListPage {
            keys: vec![],
            next_token: Some("k-100".to_string()),
        };
        assert_eq!(page.continuation(), Some("k-100"));
    }
}
