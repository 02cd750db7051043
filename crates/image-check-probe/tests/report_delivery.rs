//! Report delivery against a mock reporting endpoint.

use std::sync::Arc;

use image_check::backend::{InMemoryCatalog, InMemoryInventory};
use image_check::{CatalogEntry, Reconciler, RunConfig, TrustedOwner};
use image_check_probe::{deliver, run_guarded, HttpReporter, ProbeError, ProbeOutcome};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reconciler(catalog: InMemoryCatalog) -> Reconciler {
    let config = RunConfig {
        bucket: "state".to_string(),
        cluster_filter: "prod.example.com".to_string(),
        ..Default::default()
    };
    let inventory = InMemoryInventory::new().with_object(
        "state",
        "prod.example.com/instancegroup/nodes",
        "metadata:\n  name: nodes\nspec:\n  image: kope.io/k8s-1.28\n",
    );

    Reconciler::new(config, Arc::new(inventory), Arc::new(catalog)).unwrap()
}

#[tokio::test]
async fn healthy_run_posts_ok() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .and(body_json(json!({ "OK": true, "Errors": [] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = reconciler(
        InMemoryCatalog::new().with_image(TrustedOwner::Kopeio, CatalogEntry::named("k8s-1.28-amd64")),
    );
    let outcome = run_guarded(async move { reconciler.run().await }).await;
    assert!(outcome.is_healthy());

    let reporter = HttpReporter::new(format!("{}/report", server.uri())).unwrap();
    deliver(&reporter, outcome).await.unwrap();
}

#[tokio::test]
async fn unmatched_image_posts_single_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .and(body_json(json!({
            "OK": false,
            "Errors": ["could not find image matching kope.io/k8s-1.28"]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = reconciler(
        InMemoryCatalog::new().with_image(TrustedOwner::Kopeio, CatalogEntry::named("k8s-1.27-amd64")),
    );
    let outcome = run_guarded(async move { reconciler.run().await }).await;

    let reporter = HttpReporter::new(format!("{}/report", server.uri())).unwrap();
    deliver(&reporter, outcome).await.unwrap();
}

#[tokio::test]
async fn rejected_report_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad uuid"))
        .mount(&server)
        .await;

    let reporter = HttpReporter::new(format!("{}/report", server.uri())).unwrap();
    let err = deliver(&reporter, ProbeOutcome::Unhealthy(vec!["boom".to_string()]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProbeError::Rejected { status: 400, ref body } if body == "bad uuid"));
}
