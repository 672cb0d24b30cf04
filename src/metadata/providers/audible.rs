//! Audible catalog search provider.
//!
//! Implements [`CatalogSearch`] against the public Audible catalog API. Each
//! region has its own host (`https://api.audible{tld}`); the configured
//! `base_url` replaces that host for every region.

use async_trait::async_trait;
use audiohook_common::{AsinSource, BookMetadata, MetadataSource, SeriesEntry};
use audiohook_parser::TitleGuess;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::audnex::normalize_date;
use crate::config::AudibleConfig;
use crate::http::{HttpRequest, RegionRace};
use crate::metadata::provider::{CatalogSearch, Lookup, ProviderHit};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const NUM_RESULTS: &str = "10";
const RESPONSE_GROUPS: &str =
    "contributors,product_desc,product_extended_attrs,product_attrs,media,series,category_ladders";

/// Top-level domain of the Audible storefront for a region.
pub fn region_tld(region: &str) -> Option<&'static str> {
    Some(match region {
        "us" => ".com",
        "uk" => ".co.uk",
        "ca" => ".ca",
        "au" => ".com.au",
        "de" => ".de",
        "fr" => ".fr",
        "it" => ".it",
        "es" => ".es",
        "in" => ".in",
        "jp" => ".co.jp",
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Audible API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    asin: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    authors: Vec<Contributor>,
    #[serde(default)]
    narrators: Vec<Contributor>,
    #[serde(default)]
    series: Vec<ProductSeries>,
    runtime_length_min: Option<u32>,
    publisher_name: Option<String>,
    release_date: Option<String>,
    language: Option<String>,
    publisher_summary: Option<String>,
    #[serde(default)]
    product_images: HashMap<String, String>,
    #[serde(default)]
    category_ladders: Vec<CategoryLadder>,
}

#[derive(Debug, Deserialize)]
struct Contributor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProductSeries {
    title: String,
    sequence: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryLadder {
    #[serde(default)]
    ladder: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Category {
    name: String,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// Audible catalog search client.
pub struct AudibleSearch {
    race: RegionRace,
    base_url: Option<String>,
}

impl AudibleSearch {
    pub fn new(race: RegionRace, config: &AudibleConfig) -> Self {
        Self {
            race,
            base_url: config
                .base_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    fn host(&self, region: &str) -> String {
        match &self.base_url {
            Some(base) => base.clone(),
            None => format!("https://api.audible{}", region_tld(region).unwrap_or(".com")),
        }
    }

    fn search_request(&self, region: &str, guess: &TitleGuess) -> HttpRequest {
        let mut request = HttpRequest::get(format!("{}/1.0/catalog/products", self.host(region)))
            .query("title", guess.title.as_str());
        if let Some(author) = &guess.author {
            request = request.query("author", author.as_str());
        }
        request
            .query("num_results", NUM_RESULTS)
            .query("products_sort_by", "Relevance")
            .query("response_groups", RESPONSE_GROUPS)
    }

    /// Without a host override only regions with a known storefront can be
    /// queried.
    fn searchable_regions(&self, regions: &[String]) -> Vec<String> {
        if self.base_url.is_some() {
            return regions.to_vec();
        }
        regions
            .iter()
            .filter(|r| {
                let known = region_tld(&r.trim().to_ascii_lowercase()).is_some();
                if !known {
                    debug!(region = %r, "Skipping region without an Audible storefront");
                }
                known
            })
            .cloned()
            .collect()
    }
}

/// A search payload is usable when it decodes into the catalog schema and
/// lists at least one titled product.
pub fn has_products(value: &Value) -> bool {
    serde_json::from_value::<SearchResponse>(value.clone())
        .is_ok_and(|response| response.products.iter().any(is_titled))
}

fn is_titled(product: &Product) -> bool {
    product
        .title
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty())
}

#[async_trait]
impl CatalogSearch for AudibleSearch {
    fn name(&self) -> &'static str {
        "audible"
    }

    async fn search(&self, guess: &TitleGuess, regions: &[String]) -> Lookup<ProviderHit> {
        if guess.title.trim().is_empty() {
            return Lookup::NotFound;
        }

        let regions = self.searchable_regions(regions);
        let outcome = self
            .race
            .fetch_first_success(&regions, |region| self.search_request(region, guess), has_products)
            .await;

        debug!(
            title = %guess.title,
            attempted = outcome.attempted,
            found = outcome.is_found(),
            "Audible search race finished"
        );

        let (payload, region) = match outcome.into_lookup() {
            Lookup::Found(found) => found,
            Lookup::NotFound => return Lookup::NotFound,
            Lookup::Unavailable(reason) => return Lookup::Unavailable(reason),
        };

        let response: SearchResponse = match serde_json::from_value(payload) {
            Ok(response) => response,
            Err(e) => {
                warn!(region = %region, error = %e, "Failed to decode Audible search response");
                return Lookup::Unavailable(e.to_string());
            }
        };

        let titled: Vec<Product> = response.products.into_iter().filter(is_titled).collect();
        match select_candidate(titled, guess) {
            Some(product) => match map_product(product, &region) {
                Some(metadata) => Lookup::Found(ProviderHit { metadata, region }),
                None => Lookup::NotFound,
            },
            None => Lookup::NotFound,
        }
    }
}

/// Lowercase, keep letters and digits, collapse everything else to single
/// spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prefer a title match that also credits the guessed author, then any title
/// match, then the first product.
fn select_candidate(products: Vec<Product>, guess: &TitleGuess) -> Option<Product> {
    let title = normalize(&guess.title);
    let author = guess.author.as_deref().map(normalize);

    let title_matches = |p: &Product| p.title.as_deref().map(normalize).as_deref() == Some(&title);
    let author_matches = |p: &Product| match &author {
        Some(author) => p.authors.iter().any(|a| normalize(&a.name).contains(author.as_str())),
        None => true,
    };

    let index = products
        .iter()
        .position(|p| title_matches(p) && author_matches(p))
        .or_else(|| products.iter().position(title_matches))
        .unwrap_or(0);

    products.into_iter().nth(index)
}

fn map_product(product: Product, region: &str) -> Option<BookMetadata> {
    let title = product.title.filter(|t| !t.trim().is_empty())?;

    let mut metadata = BookMetadata::new(title.trim(), MetadataSource::Search);
    metadata.subtitle = product.subtitle.filter(|s| !s.is_empty());
    metadata.authors = product.authors.into_iter().map(|c| c.name).collect();
    metadata.narrators = product.narrators.into_iter().map(|c| c.name).collect();
    metadata.series = product.series.into_iter().next().map(|s| SeriesEntry {
        name: s.title,
        position: s.sequence,
    });
    metadata.duration_minutes = product.runtime_length_min;
    metadata.genres = genres(&product.category_ladders);
    metadata.publisher = product.publisher_name;
    metadata.release_date = product.release_date.as_deref().map(normalize_date);
    metadata.language = product.language;
    metadata.description = product.publisher_summary;
    metadata.cover_url = largest_image(&product.product_images);
    metadata.asin = product.asin;
    metadata.region = Some(region.to_string());
    metadata.asin_source = metadata.asin.as_ref().map(|_| AsinSource::Search);
    Some(metadata)
}

fn genres(ladders: &[CategoryLadder]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for category in ladders.iter().flat_map(|l| l.ladder.iter()) {
        if !names.contains(&category.name) {
            names.push(category.name.clone());
        }
    }
    names
}

/// `product_images` is keyed by pixel size ("500", "1024").
fn largest_image(images: &HashMap<String, String>) -> Option<String> {
    images
        .iter()
        .filter_map(|(size, url)| size.parse::<u32>().ok().map(|s| (s, url)))
        .max_by_key(|(size, _)| *size)
        .map(|(_, url)| url.clone())
}
