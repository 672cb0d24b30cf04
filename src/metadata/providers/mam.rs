//! MAM tracker ASIN extraction.
//!
//! Looks up the item behind a tracker URL through the JSON search endpoint
//! and pulls an ASIN out of the record's `isbn` field, falling back to the
//! description text.

use std::sync::Arc;

use async_trait::async_trait;
use audiohook_parser::{extract_mam_id, find_asin, is_mam_url, normalize_asin};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::MamConfig;
use crate::http::{HttpRequest, Transport};
use crate::metadata::provider::{AsinExtractor, Lookup};

const SEARCH_PATH: &str = "/tor/js/loadSearchJSONbasic.php";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<TorrentRecord>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TorrentRecord {
    isbn: Option<String>,
    description: Option<String>,
}

/// Client for the MAM JSON search API.
pub struct MamClient {
    transport: Arc<Transport>,
    base_url: String,
    domain: String,
    session_cookie: String,
}

impl MamClient {
    /// Returns `None` when MAM is disabled or has no session cookie.
    pub fn from_config(transport: Arc<Transport>, config: &MamConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let cookie = config.session_cookie.as_deref()?.trim();
        if cookie.is_empty() {
            return None;
        }
        Some(Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            domain: config.domain.clone(),
            session_cookie: cookie.to_string(),
        })
    }

    fn search_request(&self, id: u64) -> HttpRequest {
        HttpRequest::post(format!("{}{}", self.base_url, SEARCH_PATH))
            .header("cookie", format!("mam_id={}", self.session_cookie))
            .json(json!({
                "tor": { "id": id },
                "description": "true",
                "isbn": "true",
            }))
    }
}

#[async_trait]
impl AsinExtractor for MamClient {
    fn name(&self) -> &'static str {
        "mam"
    }

    fn handles(&self, url: &str) -> bool {
        is_mam_url(url, &self.domain)
    }

    async fn find_asin(&self, url: &str) -> Lookup<String> {
        let Some(id) = extract_mam_id(url) else {
            debug!(url, "No MAM id in URL");
            return Lookup::NotFound;
        };

        let response: SearchResponse =
            match self.transport.get_json(&self.search_request(id)).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(mam_id = id, error = %e, "MAM lookup failed");
                    return Lookup::from_transport_error(&e);
                }
            };

        if let Some(error) = response.error.filter(|_| response.data.is_empty()) {
            debug!(mam_id = id, error = %error, "MAM returned no record");
            return Lookup::NotFound;
        }

        match response.data.first().and_then(asin_from_record) {
            Some(asin) => {
                debug!(mam_id = id, asin = %asin, "ASIN found in MAM record");
                Lookup::Found(asin)
            }
            None => Lookup::NotFound,
        }
    }
}

fn asin_from_record(record: &TorrentRecord) -> Option<String> {
    record
        .isbn
        .as_deref()
        .and_then(|isbn| find_asin(isbn).or_else(|| normalize_asin(isbn.trim_start_matches("ASIN:"))))
        .or_else(|| record.description.as_deref().and_then(find_asin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(isbn: Option<&str>, description: Option<&str>) -> TorrentRecord {
        TorrentRecord {
            isbn: isbn.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn asin_from_isbn_field() {
        assert_eq!(
            asin_from_record(&record(Some("ASIN:B0F67KLM54"), None)).as_deref(),
            Some("B0F67KLM54")
        );
        assert_eq!(
            asin_from_record(&record(Some("1250217601"), None)).as_deref(),
            Some("1250217601")
        );
    }

    #[test]
    fn asin_from_description_when_isbn_is_useless() {
        let found = asin_from_record(&record(
            Some("978-0593135204"),
            Some("Listen on Audible: ASIN B08G9PRS1K"),
        ));
        assert_eq!(found.as_deref(), Some("B08G9PRS1K"));
    }

    #[test]
    fn no_asin_anywhere() {
        assert_eq!(asin_from_record(&record(None, Some("just a story"))), None);
    }

    #[test]
    fn disabled_or_cookieless_config_yields_no_client() {
        let transport = Arc::new(Transport::new(
            "test",
            reqwest::Client::new(),
            Default::default(),
            std::time::Duration::ZERO,
        ));

        let config = MamConfig::default();
        assert!(MamClient::from_config(Arc::clone(&transport), &config).is_none());

        let config = MamConfig {
            enabled: true,
            session_cookie: Some("  ".into()),
            ..MamConfig::default()
        };
        assert!(MamClient::from_config(Arc::clone(&transport), &config).is_none());

        let config = MamConfig {
            enabled: true,
            session_cookie: Some("cookie".into()),
            ..MamConfig::default()
        };
        let client = MamClient::from_config(transport, &config).unwrap();
        assert!(client.handles("https://www.myanonamouse.net/t/1"));
        assert!(!client.handles("https://example.org/t/1"));
    }
}
