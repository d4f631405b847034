//! End-to-end tests of the try-on lifecycle against mock external services.
//!
//! The provider and the media hosting endpoint are wiremock servers; the
//! catalog is an in-memory store. Nothing here needs network access or a
//! database.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header_exists, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use closetly::db::catalog::{CatalogError, CatalogStore};
use closetly::models::item::CatalogItem;
use closetly::models::tryon::TaskStatus;
use closetly::services::kling::{KlingClient, ProviderError};
use closetly::services::relay::MediaRelay;
use closetly::services::storage::MediaStorage;
use closetly::services::tryon::{TryOnError, TryOnOrchestrator};

const PUBLIC_BASE: &str = "https://media.example.com";

/// Catalog store that records inserts in memory.
#[derive(Default)]
struct InMemoryCatalog {
    items: Mutex<Vec<CatalogItem>>,
}

impl InMemoryCatalog {
    fn items(&self) -> Vec<CatalogItem> {
        self.items.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn insert_item(
        &self,
        name: &str,
        item_type: &str,
        image_url: &str,
    ) -> Result<CatalogItem, CatalogError> {
        let item = CatalogItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            item_type: item_type.to_string(),
            image_url: image_url.to_string(),
            created_at: Utc::now(),
        };
        self.items.lock().unwrap().push(item.clone());
        Ok(item)
    }
}

/// Catalog store whose writes always fail.
struct FailingCatalog;

#[async_trait]
impl CatalogStore for FailingCatalog {
    async fn insert_item(
        &self,
        _name: &str,
        _item_type: &str,
        _image_url: &str,
    ) -> Result<CatalogItem, CatalogError> {
        Err(CatalogError::Db(sqlx::Error::PoolClosed))
    }
}

fn orchestrator(
    provider_url: &str,
    hosting_url: &str,
    catalog: Arc<dyn CatalogStore>,
) -> TryOnOrchestrator {
    let provider = KlingClient::new(provider_url, "test-access-key", "test-secret-key")
        .expect("client construction");
    let storage = MediaStorage::new("media", hosting_url, "ak", "sk", PUBLIC_BASE).unwrap();
    let relay = MediaRelay::new(Arc::new(storage)).unwrap();
    TryOnOrchestrator::new(Arc::new(provider), Arc::new(relay), catalog)
}

fn submit_ok_body(task_id: &str) -> serde_json::Value {
    serde_json::json!({
        "code": 0,
        "message": "SUCCEED",
        "data": {"task_id": task_id, "task_status": "submitted"}
    })
}

fn poll_body(status: &str, images: &[String], msg: Option<&str>) -> serde_json::Value {
    let mut data = serde_json::json!({
        "task_id": "task-123",
        "task_status": status,
    });
    if let Some(m) = msg {
        data["task_status_msg"] = serde_json::json!(m);
    }
    if !images.is_empty() {
        let urls: Vec<_> = images
            .iter()
            .map(|u| serde_json::json!({"url": u}))
            .collect();
        data["task_result"] = serde_json::json!({"images": urls});
    }
    serde_json::json!({"code": 0, "message": "SUCCEED", "data": data})
}

fn jpeg_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([10, 200, 90]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .unwrap();
    out
}

/// Mount the hosting PUT endpoint (path-style S3 upload into the `media`
/// bucket) and return nothing; unmatched uploads 404 and surface as faults.
async fn mount_hosting_upload(server: &MockServer, expected: u64) {
    Mock::given(method("PUT"))
        .and(path_regex(r"^/media/closetly/tryon/.+\.png$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn submit_returns_provider_task_id() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/kolors-virtual-try-on"))
        .and(header_exists("authorization"))
        .and(body_partial_json(serde_json::json!({
            "model_name": "kolors-virtual-try-on-v1",
            "human_image": "m1",
            "cloth_image": "c1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(submit_ok_body("task-123")))
        .expect(1)
        .mount(&provider)
        .await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    let task_id = orch.submit("m1", "c1").await.expect("submit should succeed");
    assert_eq!(task_id, "task-123");
    assert!(catalog.items().is_empty());
}

#[tokio::test]
async fn submit_auth_rejection_is_a_fault_not_a_task() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/kolors-virtual-try-on"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 1101,
            "message": "Authentication failed"
        })))
        .mount(&provider)
        .await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    let err = orch.submit("m1", "c1").await.unwrap_err();
    match err {
        TryOnError::Provider(ProviderError::Auth { code, message }) => {
            assert_eq!(code, 1101);
            assert_eq!(message, "Authentication failed");
        }
        other => panic!("expected auth fault, got {other:?}"),
    }
    assert!(catalog.items().is_empty());
}

#[tokio::test]
async fn submit_never_returns_an_empty_task_id() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    // An "ok" response that carries no task id is a malformed-response
    // fault, not an empty success.
    Mock::given(method("POST"))
        .and(path("/v1/images/kolors-virtual-try-on"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "message": "SUCCEED",
            "data": {"task_id": ""}
        })))
        .mount(&provider)
        .await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    let err = orch.submit("m1", "c1").await.unwrap_err();
    assert!(matches!(
        err,
        TryOnError::Provider(ProviderError::Response(_))
    ));
}

#[tokio::test]
async fn poll_reports_non_terminal_statuses_verbatim() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/images/kolors-virtual-try-on/task-123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(poll_body("submitted", &[], None)),
        )
        .up_to_n_times(1)
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/images/kolors-virtual-try-on/task-123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(poll_body("processing", &[], None)),
        )
        .mount(&provider)
        .await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    let first = orch.poll("task-123").await.unwrap();
    assert_eq!(first.status, TaskStatus::Pending);
    assert!(first.output_url.is_none());

    let second = orch.poll("task-123").await.unwrap();
    assert_eq!(second.status, TaskStatus::Running);

    // Non-terminal polls persist nothing.
    assert!(catalog.items().is_empty());
}

#[tokio::test]
async fn poll_failed_carries_provider_message_and_persists_nothing() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/images/kolors-virtual-try-on/task-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poll_body(
            "failed",
            &[],
            Some("content policy rejection"),
        )))
        .mount(&provider)
        .await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    let outcome = orch.poll("task-123").await.unwrap();
    assert_eq!(outcome.status, TaskStatus::Failed);
    assert_eq!(outcome.error.as_deref(), Some("content policy rejection"));
    assert!(catalog.items().is_empty());
}

#[tokio::test]
async fn successful_poll_relays_last_image_and_inserts_one_record() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    let urls = vec![
        format!("{}/results/out_a.webp", hosting.uri()),
        format!("{}/results/out_b.webp", hosting.uri()),
    ];

    Mock::given(method("GET"))
        .and(path("/v1/images/kolors-virtual-try-on/task-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poll_body("succeed", &urls, None)))
        .mount(&provider)
        .await;

    // Tie-break policy: only the last listed image may be fetched.
    Mock::given(method("GET"))
        .and(path("/results/out_a.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes()))
        .expect(0)
        .mount(&hosting)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/out_b.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes()))
        .expect(1)
        .mount(&hosting)
        .await;
    mount_hosting_upload(&hosting, 1).await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    let outcome = orch.poll("task-123").await.unwrap();
    assert_eq!(outcome.status, TaskStatus::Succeeded);

    let output_url = outcome.output_url.expect("succeeded poll carries a URL");
    assert!(
        output_url.starts_with(&format!("{PUBLIC_BASE}/closetly/tryon/")),
        "unexpected output url: {output_url}"
    );
    assert!(output_url.ends_with(".png"));

    let items = catalog.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_type, "tryon");
    assert_eq!(items[0].name, "Try-On Result");
    assert_eq!(items[0].image_url, output_url);
}

#[tokio::test]
async fn relay_failure_surfaces_error_then_repeat_poll_inserts() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    let urls = vec![format!("{}/results/out.webp", hosting.uri())];

    Mock::given(method("GET"))
        .and(path("/v1/images/kolors-virtual-try-on/task-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poll_body("succeed", &urls, None)))
        .mount(&provider)
        .await;

    // First download attempt fails, the next succeeds.
    Mock::given(method("GET"))
        .and(path("/results/out.webp"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&hosting)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/out.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes()))
        .mount(&hosting)
        .await;
    mount_hosting_upload(&hosting, 1).await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    // The provider-side job succeeded, but the poll reports a fault.
    let err = orch.poll("task-123").await.unwrap_err();
    assert!(matches!(err, TryOnError::Relay(_)));
    assert!(catalog.items().is_empty());

    // Caller polls again; the relay + insert path repeats and lands.
    let outcome = orch.poll("task-123").await.unwrap();
    assert_eq!(outcome.status, TaskStatus::Succeeded);
    assert_eq!(catalog.items().len(), 1);
}

#[tokio::test]
async fn repeated_successful_polls_insert_duplicate_records() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    let urls = vec![format!("{}/results/out.webp", hosting.uri())];

    Mock::given(method("GET"))
        .and(path("/v1/images/kolors-virtual-try-on/task-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poll_body("succeed", &urls, None)))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/out.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes()))
        .mount(&hosting)
        .await;
    mount_hosting_upload(&hosting, 2).await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    // There is no idempotency key: every observed success re-runs the
    // relay + insert path. Two polls, two records.
    orch.poll("task-123").await.unwrap();
    orch.poll("task-123").await.unwrap();

    let items = catalog.items();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.item_type == "tryon"));
    // Each relay pass hosts its own copy.
    assert_ne!(items[0].image_url, items[1].image_url);
}

#[tokio::test]
async fn catalog_failure_after_relay_is_a_poll_fault() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    let urls = vec![format!("{}/results/out.webp", hosting.uri())];

    Mock::given(method("GET"))
        .and(path("/v1/images/kolors-virtual-try-on/task-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poll_body("succeed", &urls, None)))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/out.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes()))
        .mount(&hosting)
        .await;
    // The image still gets hosted (and orphaned) before the write fails.
    mount_hosting_upload(&hosting, 1).await;

    let orch = orchestrator(&provider.uri(), &hosting.uri(), Arc::new(FailingCatalog));

    let err = orch.poll("task-123").await.unwrap_err();
    assert!(matches!(err, TryOnError::Catalog(_)));
}

#[tokio::test]
async fn poll_on_unknown_task_is_a_fault_not_a_status() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/images/kolors-virtual-try-on/no-such-task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 1201,
            "message": "task not found"
        })))
        .mount(&provider)
        .await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    let err = orch.poll("no-such-task").await.unwrap_err();
    assert!(matches!(
        err,
        TryOnError::Provider(ProviderError::Auth { code: 1201, .. })
    ));
}

#[tokio::test]
async fn success_without_result_image_is_a_fault() {
    let provider = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/images/kolors-virtual-try-on/task-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poll_body("succeed", &[], None)))
        .mount(&provider)
        .await;

    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator(&provider.uri(), &hosting.uri(), catalog.clone());

    let err = orch.poll("task-123").await.unwrap_err();
    assert!(matches!(err, TryOnError::MissingResult));
    assert!(catalog.items().is_empty());
}

#[tokio::test]
async fn provider_unreachable_is_a_distinct_fault() {
    let hosting = MockServer::start().await;

    // Nothing is listening on this port.
    let catalog = Arc::new(InMemoryCatalog::default());
    let orch = orchestrator("http://127.0.0.1:1", &hosting.uri(), catalog.clone());

    let err = orch.submit("m1", "c1").await.unwrap_err();
    assert!(matches!(err, TryOnError::Provider(ProviderError::Http(_))));
}
