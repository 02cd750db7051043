//! HTTP backends for the inventory and catalog gateways

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::traits::*;
use crate::error::{TransportError, TransportResult};
use crate::model::{CatalogEntry, ObjectKey};
use crate::owners::TrustedOwner;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared reqwest plumbing for both gateways.
#[derive(Debug, Clone)]
struct GatewayClient {
    client: Client,
    base_url: String,
    base: Url,
}

impl GatewayClient {
    fn new(endpoint: &str, timeout: Duration) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::request("build http client", e))?;

        let base_url = endpoint.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).map_err(|e| TransportError::request("parse endpoint", e))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::request("parse endpoint", "endpoint cannot carry a path"));
        }

        Ok(Self {
            client,
            base_url,
            base,
        })
    }

    /// Endpoint URL extended by `segments`, each percent-encoded on its own.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> TransportResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::request(operation, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::Status {
                operation,
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> TransportResult<T> {
        self.send(operation, request)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::request(operation, e))
    }

    async fn get_bytes(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> TransportResult<Vec<u8>> {
        let bytes = self
            .send(operation, request)
            .await?
            .bytes()
            .await
            .map_err(|e| TransportError::request(operation, e))?;
        Ok(bytes.to_vec())
    }
}

/// Listing response of the inventory gateway.
#[derive(Debug, Deserialize)]
struct ListObjectsResponse {
    #[serde(default)]
    items: Vec<ListedObject>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    key: String,
}

/// Inventory store reached through the HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpInventory {
    gateway: GatewayClient,
}

impl HttpInventory {
    /// Create a client for the gateway at `endpoint`.
    pub fn new(endpoint: &str) -> TransportResult<Self> {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> TransportResult<Self> {
        Ok(Self {
            gateway: GatewayClient::new(endpoint, timeout)?,
        })
    }

    /// Normalized gateway base URL.
    pub fn base_url(&self) -> &str {
        &self.gateway.base_url
    }
}

#[async_trait]
impl InventoryStore for HttpInventory {
    async fn list_page(&self, namespace: &str, token: Option<&str>) -> TransportResult<ListPage> {
        let url = self.gateway.url(["v1", "buckets", namespace, "objects"]);
        debug!(url = %url, marker = ?token, "Listing inventory page");

        let mut request = self.gateway.client.get(url);
        if let Some(token) = token {
            request = request.query(&[("marker", token)]);
        }

        let response: ListObjectsResponse = self.gateway.get_json("list objects", request).await?;
        Ok(ListPage {
            keys: response
                .items
                .into_iter()
                .map(|item| ObjectKey::new(item.key))
                .collect(),
            next_token: response.next_token,
        })
    }

    async fn get_object(&self, namespace: &str, key: &ObjectKey) -> TransportResult<Vec<u8>> {
        let url = self.gateway.url(
            ["v1", "buckets", namespace, "objects"]
                .into_iter()
                .chain(key.as_str().trim_start_matches('/').split('/')),
        );
        let request = self.gateway.client.get(url);
        self.gateway.get_bytes("get object", request).await
    }
}

/// Image catalog reached through the HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    gateway: GatewayClient,
}

impl HttpCatalog {
    /// Create a client for the gateway at `endpoint`.
    pub fn new(endpoint: &str) -> TransportResult<Self> {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> TransportResult<Self> {
        Ok(Self {
            gateway: GatewayClient::new(endpoint, timeout)?,
        })
    }
}

#[async_trait]
impl ImageCatalog for HttpCatalog {
    async fn describe_images(
        &self,
        region: &str,
        owners: &[TrustedOwner; 4],
    ) -> TransportResult<Vec<CatalogEntry>> {
        let url = self.gateway.url(["v1", "regions", region, "images"]);
        let query: Vec<(&str, &str)> = owners
            .iter()
            .map(|owner| ("owner", owner.account_id()))
            .collect();

        let request = self.gateway.client.get(url).query(&query);
        self.gateway.get_json("describe images", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_normalization() {
        let inventory = HttpInventory::new("http://localhost:9000/").unwrap();
        assert_eq!(inventory.base_url(), "http://localhost:9000");
    }

    #[test]
    fn test_key_segments_are_encoded() {
        let gateway = GatewayClient::new("http://localhost:9000/gw/", DEFAULT_REQUEST_TIMEOUT).unwrap();
        let url = gateway.url(["v1", "objects", "c", "a#b?c d%"]);
        assert_eq!(url.as_str(), "http://localhost:9000/gw/v1/objects/c/a%23b%3Fc%20d%25");
    }

    #[test]
    fn test_opaque_endpoint_rejected() {
        assert!(HttpInventory::new("mailto:ops@example.com").is_err());
    }
}
