//! Audnex metadata provider.
//!
//! Implements [`BookProvider`] against the Audnex REST API, which serves
//! Audible catalog data keyed by ASIN and region:
//!
//! - `GET /books/{asin}?region={r}` for the book record
//! - `GET /books/{asin}/chapters?region={r}` for chapter markers
//!
//! A 404 or a body without a title counts as "not in this region".

use async_trait::async_trait;
use audiohook_common::{BookMetadata, Chapter, MetadataSource, SeriesEntry};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AudnexConfig;
use crate::http::{HttpRequest, RegionRace};
use crate::metadata::provider::{BookProvider, Lookup, ProviderHit};

// ---------------------------------------------------------------------------
// Audnex API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudnexBook {
    asin: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    authors: Vec<AudnexPerson>,
    #[serde(default)]
    narrators: Vec<AudnexPerson>,
    series_primary: Option<AudnexSeries>,
    runtime_length_min: Option<u32>,
    #[serde(default)]
    genres: Vec<AudnexGenre>,
    publisher_name: Option<String>,
    release_date: Option<String>,
    language: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AudnexPerson {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AudnexSeries {
    name: String,
    position: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AudnexGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudnexChapters {
    #[serde(default)]
    chapters: Vec<AudnexChapter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudnexChapter {
    title: String,
    start_offset_ms: u64,
    length_ms: u64,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// Audnex book provider.
///
/// Book lookups race the configured regions through the shared
/// [`RegionRace`]; chapter lookups go straight to a known region.
pub struct AudnexProvider {
    race: RegionRace,
    base_url: String,
}

impl AudnexProvider {
    pub fn new(race: RegionRace, config: &AudnexConfig) -> Self {
        Self {
            race,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn book_request(&self, asin: &str, region: &str) -> HttpRequest {
        HttpRequest::get(format!("{}/books/{}", self.base_url, asin)).query("region", region)
    }

    fn chapters_request(&self, asin: &str, region: &str) -> HttpRequest {
        HttpRequest::get(format!("{}/books/{}/chapters", self.base_url, asin))
            .query("region", region)
    }
}

/// A book payload is usable only when it decodes into the Audnex schema and
/// carries a non-empty title, so a malformed region loses the race.
pub fn is_valid_book(value: &Value) -> bool {
    serde_json::from_value::<AudnexBook>(value.clone())
        .ok()
        .and_then(|book| book.title)
        .is_some_and(|t| !t.trim().is_empty())
}

#[async_trait]
impl BookProvider for AudnexProvider {
    fn name(&self) -> &'static str {
        "audnex"
    }

    async fn book_by_asin(&self, asin: &str, regions: &[String]) -> Lookup<ProviderHit> {
        let outcome = self
            .race
            .fetch_first_success(regions, |region| self.book_request(asin, region), is_valid_book)
            .await;

        debug!(
            asin,
            attempted = outcome.attempted,
            errors = outcome.errors.len(),
            found = outcome.is_found(),
            "Audnex race finished"
        );

        match outcome.into_lookup() {
            Lookup::Found((payload, region)) => match map_book(payload, &region) {
                Some(metadata) => Lookup::Found(ProviderHit { metadata, region }),
                None => Lookup::Unavailable(format!("unparseable Audnex book in {region}")),
            },
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
        }
    }

    async fn book_in_region(&self, asin: &str, region: &str) -> Lookup<BookMetadata> {
        let request = self.book_request(asin, region);
        match self.race.transport().get_json::<Value>(&request).await {
            Ok(payload) if is_valid_book(&payload) => match map_book(payload, region) {
                Some(metadata) => Lookup::Found(metadata),
                None => Lookup::Unavailable(format!("unparseable Audnex book in {region}")),
            },
            Ok(_) => Lookup::NotFound,
            Err(e) => Lookup::from_transport_error(&e),
        }
    }

    async fn chapters(&self, asin: &str, region: &str) -> Lookup<Vec<Chapter>> {
        let request = self.chapters_request(asin, region);
        let payload = match self.race.transport().get_json::<AudnexChapters>(&request).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(asin, region, error = %e, "Audnex chapters lookup failed");
                return Lookup::from_transport_error(&e);
            }
        };

        if payload.chapters.is_empty() {
            return Lookup::NotFound;
        }

        Lookup::Found(
            payload
                .chapters
                .into_iter()
                .map(|c| Chapter {
                    title: c.title,
                    start_offset_ms: c.start_offset_ms,
                    length_ms: c.length_ms,
                })
                .collect(),
        )
    }
}

/// Map an Audnex book payload into [`BookMetadata`].
fn map_book(payload: Value, region: &str) -> Option<BookMetadata> {
    let book: AudnexBook = match serde_json::from_value(payload) {
        Ok(book) => book,
        Err(e) => {
            warn!(region, error = %e, "Failed to decode Audnex book");
            return None;
        }
    };

    let mut metadata = BookMetadata::new(book.title?.trim(), MetadataSource::Provider);
    metadata.subtitle = book.subtitle.filter(|s| !s.is_empty());
    metadata.authors = book.authors.into_iter().map(|p| p.name).collect();
    metadata.narrators = book.narrators.into_iter().map(|p| p.name).collect();
    metadata.series = book.series_primary.map(|s| SeriesEntry {
        name: s.name,
        position: s.position,
    });
    metadata.duration_minutes = book.runtime_length_min;
    metadata.genres = book.genres.into_iter().map(|g| g.name).collect();
    metadata.publisher = book.publisher_name;
    metadata.release_date = book.release_date.as_deref().map(normalize_date);
    metadata.language = book.language;
    metadata.description = book.summary.or(book.description);
    metadata.cover_url = book.image;
    metadata.asin = book.asin;
    metadata.region = Some(region.to_string());
    Some(metadata)
}

/// Reduce an RFC 3339 timestamp to its calendar date; keep anything else.
pub(crate) fn normalize_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|_| raw.to_string())
}
