use crate::config::NotifierConfig;
use anyhow::Result;
use async_trait::async_trait;
use audiohook_common::{FlatRecord, JobToken};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::Notifier;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs each processed record as JSON to a configured URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    name: String,
}

impl WebhookNotifier {
    pub fn new(config: &NotifierConfig) -> Self {
        let client = Client::builder()
            .timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            url: config.url.clone(),
            name: config.name.clone(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, token: JobToken, record: &FlatRecord) -> Result<()> {
        let body = json!({
            "token": token,
            "record": record,
        });

        let response = self.client.post(&self.url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Notifier '{}' rejected record ({}): {}", self.name, status, body);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record() -> FlatRecord {
        let mut record = FlatRecord::new();
        record.insert("title".into(), "Dune".into());
        record.insert("source".into(), "fallback".into());
        record
    }

    fn notifier(url: String) -> WebhookNotifier {
        WebhookNotifier::new(&NotifierConfig {
            name: "hook".into(),
            url,
            enabled: true,
        })
    }

    #[tokio::test]
    async fn posts_record_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(body_partial_json(serde_json::json!({"record": {"title": "Dune"}})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        notifier(format!("{}/notify", server.uri()))
            .notify(JobToken::new(), &record())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("nope"))
            .mount(&server)
            .await;

        let err = notifier(server.uri())
            .notify(JobToken::new(), &record())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
