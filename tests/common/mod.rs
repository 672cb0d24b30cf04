//! Shared test harness for integration tests.
//!
//! [`test_config`] points every provider at one wiremock server with fast
//! retry settings. [`TestServer`] runs the full service on a random port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use audiohook::config::{Config, HttpConfig};
use audiohook::http::{RetryPolicy, Transport};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const MAM_URL: &str = "https://www.myanonamouse.net/t/123456";
pub const ASIN: &str = "B0F67KLM54";

/// Config wired to `mock_uri` with MAM enabled and three regions.
pub fn test_config(mock_uri: &str) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.server.poll_interval_ms = 20;
    config.server.webhook_rate_limit_per_minute = 0;

    config.http = fast_http();

    config.regions.list = vec!["us".into(), "uk".into(), "de".into()];
    config.regions.max_regions_to_try = 3;

    config.mam.enabled = true;
    config.mam.base_url = mock_uri.to_string();
    config.mam.session_cookie = Some("test-cookie".into());

    config.audnex.base_url = mock_uri.to_string();
    config.audnex.fetch_chapters = false;
    config.audible.base_url = Some(mock_uri.to_string());

    config
}

pub fn fast_http() -> HttpConfig {
    HttpConfig {
        rate_limit_interval_ms: 0,
        max_retries: 3,
        backoff_base: 2.0,
        backoff_unit_ms: 10,
        default_retry_after_secs: 0,
        max_retry_after_secs: 1,
        timeout_secs: 5,
        ..HttpConfig::default()
    }
}

pub fn transport(http: &HttpConfig) -> Arc<Transport> {
    Arc::new(Transport::from_config("test", http).expect("failed to build transport"))
}

pub fn transport_with(policy: RetryPolicy, interval: Duration) -> Arc<Transport> {
    Arc::new(Transport::new("test", reqwest::Client::new(), policy, interval))
}

/// A valid Audnex book body.
pub fn audnex_book(title: &str) -> Value {
    serde_json::json!({
        "asin": ASIN,
        "title": title,
        "authors": [{"name": "Andy Weir"}],
        "narrators": [{"name": "Ray Porter"}],
        "runtimeLengthMin": 970,
        "releaseDate": "2021-05-04T00:00:00.000Z",
        "language": "english"
    })
}

/// MAM search response whose record carries `asin` in the isbn field.
pub fn mam_record(asin: &str) -> Value {
    serde_json::json!({
        "data": [{"isbn": format!("ASIN:{asin}"), "description": "An audiobook"}]
    })
}

/// The full service running on a random local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub cancel: CancellationToken,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub async fn start(config: Config) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(audiohook::server::run(listener, config, cancel.clone()));

        Self {
            addr,
            cancel,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Poll the job API until the record appears.
    pub async fn wait_for_record(&self, token: &str) -> Value {
        let client = reqwest::Client::new();
        for _ in 0..200 {
            let resp = client
                .get(self.url(&format!("/api/jobs/{token}")))
                .send()
                .await
                .unwrap();
            if resp.status() == 200 {
                let body: Value = resp.json().await.unwrap();
                return body["record"].clone();
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("job {token} was never processed");
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not shut down");
        result.unwrap().unwrap();
    }
}
