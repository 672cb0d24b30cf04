//! Normalized audiobook metadata.
//!
//! Every provider adapter maps its own response schema into [`BookMetadata`],
//! so downstream code never merges loosely-typed records field by field.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat key/value projection handed to persistence and notification sinks.
pub type FlatRecord = BTreeMap<String, Value>;

/// Where the final metadata record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// Resolved by ASIN against the identifier-keyed provider.
    Provider,
    /// Found through the free-text catalog search.
    Search,
    /// Synthesized from the raw webhook payload after every step failed.
    Fallback,
}

impl fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider => write!(f, "provider"),
            Self::Search => write!(f, "search"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// How the ASIN of a resolved record was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsinSource {
    /// Extracted from the source tracker's item record.
    Mam,
    /// Taken from the catalog search candidate.
    Search,
}

impl fmt::Display for AsinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mam => write!(f, "mam"),
            Self::Search => write!(f, "search"),
        }
    }
}

/// Series membership of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEntry {
    /// Series name.
    pub name: String,
    /// Position within the series as published (e.g. "1", "2.5").
    pub position: Option<String>,
}

/// A single chapter marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter title.
    pub title: String,
    /// Offset from the start of the book in milliseconds.
    pub start_offset_ms: u64,
    /// Chapter length in milliseconds.
    pub length_ms: u64,
}

/// Normalized audiobook metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Display title.
    pub title: String,
    /// Subtitle, if the provider reports one.
    pub subtitle: Option<String>,
    /// Author names in credit order.
    pub authors: Vec<String>,
    /// Narrator names in credit order.
    pub narrators: Vec<String>,
    /// Primary series, if any.
    pub series: Option<SeriesEntry>,
    /// Runtime in minutes.
    pub duration_minutes: Option<u32>,
    /// Genre and tag labels.
    pub genres: Vec<String>,
    /// Publisher name.
    pub publisher: Option<String>,
    /// Release date as reported (usually YYYY-MM-DD).
    pub release_date: Option<String>,
    /// Language name or code.
    pub language: Option<String>,
    /// Publisher summary, possibly containing HTML.
    pub description: Option<String>,
    /// Cover image URL.
    pub cover_url: Option<String>,
    /// Amazon Standard Identification Number.
    pub asin: Option<String>,
    /// Region whose catalog produced this record.
    pub region: Option<String>,
    /// Chapter list, when the supplementary lookup succeeded.
    pub chapters: Option<Vec<Chapter>>,
    /// Which step produced the record.
    pub source: MetadataSource,
    /// How the ASIN was obtained.
    pub asin_source: Option<AsinSource>,
}

impl BookMetadata {
    /// Create a record with only a title and a source tag set.
    pub fn new(title: impl Into<String>, source: MetadataSource) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            authors: Vec::new(),
            narrators: Vec::new(),
            series: None,
            duration_minutes: None,
            genres: Vec::new(),
            publisher: None,
            release_date: None,
            language: None,
            description: None,
            cover_url: None,
            asin: None,
            region: None,
            chapters: None,
            source,
            asin_source: None,
        }
    }

    /// Deterministic stand-in used when every provider step came up empty.
    pub fn fallback(title: impl Into<String>, author: Option<String>) -> Self {
        let mut record = Self::new(title, MetadataSource::Fallback);
        record.authors = author.into_iter().collect();
        record
    }

    /// Project the record into a flat key/value map.
    ///
    /// List fields are joined with `", "`; absent fields are omitted.
    pub fn to_flat_record(&self) -> FlatRecord {
        let mut record = FlatRecord::new();
        record.insert("title".into(), Value::from(self.title.clone()));
        record.insert("source".into(), Value::from(self.source.to_string()));

        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                record.insert(key.to_string(), value);
            }
        };

        put("subtitle", self.subtitle.clone().map(Value::from));
        put("authors", join_names(&self.authors).map(Value::from));
        put("narrators", join_names(&self.narrators).map(Value::from));
        put("series", self.series.as_ref().map(|s| Value::from(s.name.clone())));
        put(
            "series_position",
            self.series
                .as_ref()
                .and_then(|s| s.position.clone())
                .map(Value::from),
        );
        put("duration_minutes", self.duration_minutes.map(Value::from));
        put("genres", join_names(&self.genres).map(Value::from));
        put("publisher", self.publisher.clone().map(Value::from));
        put("release_date", self.release_date.clone().map(Value::from));
        put("language", self.language.clone().map(Value::from));
        put("description", self.description.clone().map(Value::from));
        put("cover_url", self.cover_url.clone().map(Value::from));
        put("asin", self.asin.clone().map(Value::from));
        put("region", self.region.clone().map(Value::from));
        put(
            "chapter_count",
            self.chapters.as_ref().map(|c| Value::from(c.len() as u64)),
        );
        put(
            "asin_source",
            self.asin_source.map(|s| Value::from(s.to_string())),
        );

        record
    }
}

fn join_names(names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}
