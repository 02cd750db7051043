//! HTTP gateway backends against a mock server.

use std::sync::Arc;

use image_check::backend::{HttpCatalog, HttpInventory, ImageCatalog, InventoryStore};
use image_check::{
    CatalogEntry, ObjectKey, Reconciler, RunConfig, TransportError, TrustedOwner,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn list_page_sends_marker_and_parses_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/buckets/state/objects"))
        .and(query_param("marker", "prod/instancegroup/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "key": "prod/instancegroup/b" }],
            "next_token": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = HttpInventory::new(&server.uri()).unwrap();
    let page = inventory
        .list_page("state", Some("prod/instancegroup/a"))
        .await
        .unwrap();

    assert_eq!(page.keys, vec![ObjectKey::new("prod/instancegroup/b")]);
    assert_eq!(page.next_token, None);
}

#[tokio::test]
async fn get_object_returns_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/buckets/state/objects/prod/instancegroup/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("spec:\n  image: k8s\n"))
        .mount(&server)
        .await;

    let inventory = HttpInventory::new(&server.uri()).unwrap();
    let body = inventory
        .get_object("state", &ObjectKey::new("prod/instancegroup/nodes"))
        .await
        .unwrap();

    assert_eq!(body, b"spec:\n  image: k8s\n".to_vec());
}

#[tokio::test]
async fn get_object_encodes_reserved_characters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/buckets/state/objects/c/instancegroup/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("WRONG OBJECT"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/buckets/state/objects/c/instancegroup/a%23b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("spec:\n  image: k8s\n"))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = HttpInventory::new(&server.uri()).unwrap();
    let body = inventory
        .get_object("state", &ObjectKey::new("c/instancegroup/a#b"))
        .await
        .unwrap();

    assert_eq!(body, b"spec:\n  image: k8s\n".to_vec());
}

#[tokio::test]
async fn error_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/buckets/state/objects"))
        .respond_with(ResponseTemplate::new(503).set_body_string("slow down"))
        .mount(&server)
        .await;

    let inventory = HttpInventory::new(&server.uri()).unwrap();
    let err = inventory.list_page("state", None).await.unwrap_err();

    assert_eq!(
        err,
        TransportError::Status {
            operation: "list objects",
            status: 503,
            body: "slow down".to_string(),
        }
    );
}

#[tokio::test]
async fn describe_images_queries_trusted_owners() {
    let server = MockServer::start().await;
    let mut mock = Mock::given(method("GET")).and(path("/v1/regions/us-east-1/images"));
    for owner in TrustedOwner::account_ids() {
        mock = mock.and(query_param("owner", owner));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "name": "k8s-1.27-hvm", "location": "383156758163/k8s-1.27-hvm" },
        { "location": "amazon/amzn2-ami" }
    ])))
    .expect(1)
    .mount(&server)
    .await;

    let catalog = HttpCatalog::new(&server.uri()).unwrap();
    let images = catalog
        .describe_images("us-east-1", &TrustedOwner::ALL)
        .await
        .unwrap();

    assert_eq!(
        images,
        vec![
            CatalogEntry {
                name: Some("k8s-1.27-hvm".to_string()),
                location: Some("383156758163/k8s-1.27-hvm".to_string()),
            },
            CatalogEntry::located("amazon/amzn2-ami"),
        ]
    );
}

#[tokio::test]
async fn full_run_over_http_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/buckets/state/objects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "key": "prod.example.com/instancegroup/nodes" },
                { "key": "prod.example.com/cluster.spec" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/buckets/state/objects/prod.example.com/instancegroup/nodes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("metadata:\n  name: nodes\nspec:\n  image: kope.io/k8s-1.28\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/regions/us-east-1/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "k8s-1.27" }])))
        .mount(&server)
        .await;

    let config = RunConfig {
        bucket: "state".to_string(),
        cluster_filter: "prod.example.com".to_string(),
        ..Default::default()
    };
    let reconciler = Reconciler::new(
        config,
        Arc::new(HttpInventory::new(&server.uri()).unwrap()),
        Arc::new(HttpCatalog::new(&server.uri()).unwrap()),
    )
    .unwrap();

    let report = reconciler.run().await.unwrap();

    assert_eq!(
        report.failure_message().as_deref(),
        Some("could not find image matching kope.io/k8s-1.28")
    );
}
