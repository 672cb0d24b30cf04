use audiohook_common::{Error, JobToken, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of an inbound release webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Release name as announced (e.g. "Dune by Frank Herbert [M4B]").
    pub name: String,
    /// Item page URL on the source site.
    pub url: String,
    /// Direct download link.
    pub download_url: String,
    /// Any other fields are carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookPayload {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("url", &self.url),
            ("download_url", &self.download_url),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("'{field}' must not be empty")));
            }
        }
        Ok(())
    }
}

/// A webhook accepted for processing.
#[derive(Debug, Clone)]
pub struct QueueJob {
    pub token: JobToken,
    pub payload: WebhookPayload,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueJob {
    pub fn new(payload: WebhookPayload) -> Self {
        Self {
            token: JobToken::new(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}
