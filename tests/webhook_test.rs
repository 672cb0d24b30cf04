//! Webhook receiver integration tests.
//!
//! Runs the full service (router, queue, worker, store, notifiers) on a
//! random port with every provider mocked.

mod common;

use std::time::Duration;

use audiohook::config::NotifierConfig;
use audiohook::server::signature::sign;
use audiohook::server::SIGNATURE_HEADER;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{audnex_book, mam_record, test_config, TestServer, ASIN, MAM_URL};

fn payload(name: &str, url: &str) -> Value {
    json!({
        "name": name,
        "url": url,
        "download_url": "https://example.org/download/1",
        "indexer": "test"
    })
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mam_webhook_is_resolved_stored_and_notified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tor/js/loadSearchJSONbasic.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mam_record(ASIN)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/books/{ASIN}")))
        .and(query_param("region", "us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(audnex_book("Project Hail Mary")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/books/{ASIN}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .and(body_partial_json(json!({"record": {"source": "provider"}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.notifiers.push(NotifierConfig {
        name: "downstream".into(),
        url: format!("{}/notify", server.uri()),
        enabled: true,
    });
    let app = TestServer::start(config).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(app.url("/webhook"))
        .json(&payload("Project Hail Mary by Andy Weir [M4B]", MAM_URL))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "queued");
    let token = body["token"].as_str().unwrap().to_string();

    let record = app.wait_for_record(&token).await;
    assert_eq!(record["title"], "Project Hail Mary");
    assert_eq!(record["source"], "provider");
    assert_eq!(record["asin_source"], "mam");
    assert_eq!(record["asin"], ASIN);
    assert_eq!(record["token"], token);
    assert_eq!(record["download_url"], "https://example.org/download/1");

    // Notification happens right after the record is stored.
    tokio::time::sleep(Duration::from_millis(100)).await;
    app.shutdown().await;
}

#[tokio::test]
async fn unresolvable_webhook_gets_fallback_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.0/catalog/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
        .mount(&server)
        .await;

    let app = TestServer::start(test_config(&server.uri())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(app.url("/webhook"))
        .json(&payload(
            "Mystery Book by Jane Roe [M4B]",
            "https://example.org/torrents/9",
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();

    let record = app
        .wait_for_record(body["token"].as_str().unwrap())
        .await;
    assert_eq!(record["title"], "Mystery Book");
    assert_eq!(record["authors"], "Jane Roe");
    assert_eq!(record["source"], "fallback");
    assert_eq!(record["steps"], "mam_lookup,title_search,exhausted");

    app.shutdown().await;
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_or_incomplete_payloads_are_rejected() {
    let server = MockServer::start().await;
    let app = TestServer::start(test_config(&server.uri())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(app.url("/webhook"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(app.url("/webhook"))
        .json(&json!({"name": "Dune", "url": "https://example.org/1", "download_url": " "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");

    let resp = client
        .post(app.url("/webhook"))
        .json(&json!({"name": "Dune"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    app.shutdown().await;
}

#[tokio::test]
async fn signature_is_required_when_configured() {
    let server = MockServer::start().await;
    let mut config = test_config(&server.uri());
    config.server.signature_secret = Some("s3cret".into());
    let app = TestServer::start(config).await;
    let client = reqwest::Client::new();

    let body = serde_json::to_vec(&payload("Dune", "https://example.org/1")).unwrap();

    let resp = client
        .post(app.url("/webhook"))
        .header("content-type", "application/json")
        .body(body.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(app.url("/webhook"))
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, sign("wrong", &body).unwrap())
        .body(body.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(app.url("/webhook"))
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, sign("s3cret", &body).unwrap())
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);

    app.shutdown().await;
}

#[tokio::test]
async fn webhook_rate_limit_returns_429() {
    let server = MockServer::start().await;
    let mut config = test_config(&server.uri());
    config.server.webhook_rate_limit_per_minute = 1;
    let app = TestServer::start(config).await;
    let client = reqwest::Client::new();

    let body = payload("Dune", "https://example.org/1");
    let first = client
        .post(app.url("/webhook"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 202);

    let second = client
        .post(app.url("/webhook"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 429);

    // Other routes are not limited.
    let health = client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), 200);

    app.shutdown().await;
}

#[tokio::test]
async fn unknown_job_is_404() {
    let server = MockServer::start().await;
    let app = TestServer::start(test_config(&server.uri())).await;

    let resp = reqwest::get(app.url(&format!(
        "/api/jobs/{}",
        audiohook_common::JobToken::new()
    )))
    .await
    .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "not_found");

    app.shutdown().await;
}
