//! Provider seams used by the fallback coordinator.
//!
//! Each external service exposes one capability behind an `async_trait`
//! object. Adapters translate transport failures into [`Lookup`] so the
//! coordinator never handles raw HTTP errors.

use async_trait::async_trait;
use audiohook_common::{BookMetadata, Chapter};
use audiohook_parser::TitleGuess;

use crate::http::{RaceOutcome, TransportError};

// ---------------------------------------------------------------------------
// Lookup result
// ---------------------------------------------------------------------------

/// Outcome of a single provider query.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// The provider answered with a usable value.
    Found(T),
    /// The provider answered, but has nothing for this key.
    NotFound,
    /// The provider could not be reached or answered garbage.
    Unavailable(String),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
        }
    }

    /// 404/410 mean "nothing here"; anything else means the provider failed.
    pub fn from_transport_error(err: &TransportError) -> Self {
        if err.is_not_found() {
            Lookup::NotFound
        } else {
            Lookup::Unavailable(err.to_string())
        }
    }
}

impl RaceOutcome {
    /// Collapse a race into a lookup of `(payload, winning region)`.
    pub fn into_lookup(self) -> Lookup<(serde_json::Value, String)> {
        if self.all_unavailable() {
            return Lookup::Unavailable(self.error_summary());
        }
        match (self.payload, self.region) {
            (Some(payload), Some(region)) => Lookup::Found((payload, region)),
            _ => Lookup::NotFound,
        }
    }
}

/// Metadata plus the region whose catalog produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHit {
    pub metadata: BookMetadata,
    pub region: String,
}

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

/// Source tracker that can turn an item URL into an ASIN.
#[async_trait]
pub trait AsinExtractor: Send + Sync {
    /// Short, lowercase identifier (e.g. `"mam"`).
    fn name(&self) -> &'static str;

    /// Whether `url` points at this tracker.
    fn handles(&self, url: &str) -> bool;

    /// Fetch the item behind `url` and pull an ASIN out of it.
    async fn find_asin(&self, url: &str) -> Lookup<String>;
}

/// ASIN-keyed book metadata service.
#[async_trait]
pub trait BookProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Race `regions` for the book and return the first valid record.
    async fn book_by_asin(&self, asin: &str, regions: &[String]) -> Lookup<ProviderHit>;

    /// Fetch the book from one known region, without racing.
    async fn book_in_region(&self, asin: &str, region: &str) -> Lookup<BookMetadata>;

    /// Chapter markers for the book in `region`.
    async fn chapters(&self, asin: &str, region: &str) -> Lookup<Vec<Chapter>>;
}

/// Free-text catalog search.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    fn name(&self) -> &'static str;

    /// Race `regions` for the guessed title and return the best candidate.
    async fn search(&self, guess: &TitleGuess, regions: &[String]) -> Lookup<ProviderHit>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RegionError;
    use serde_json::json;

    fn error(region: &str, unavailable: bool) -> RegionError {
        RegionError {
            region: region.into(),
            message: "boom".into(),
            unavailable,
        }
    }

    #[test]
    fn race_winner_is_found() {
        let outcome = RaceOutcome {
            payload: Some(json!({"title": "x"})),
            region: Some("uk".into()),
            errors: vec![error("us", true)],
            attempted: 2,
        };
        assert_eq!(
            outcome.into_lookup(),
            Lookup::Found((json!({"title": "x"}), "uk".to_string()))
        );
    }

    #[test]
    fn all_transport_failures_are_unavailable() {
        let outcome = RaceOutcome {
            errors: vec![error("us", true), error("uk", true)],
            attempted: 2,
            ..RaceOutcome::default()
        };
        assert!(matches!(outcome.into_lookup(), Lookup::Unavailable(_)));
    }

    #[test]
    fn mixed_failures_are_not_found() {
        let outcome = RaceOutcome {
            errors: vec![error("us", true), error("uk", false)],
            attempted: 2,
            ..RaceOutcome::default()
        };
        assert_eq!(outcome.into_lookup(), Lookup::NotFound);
    }

    #[test]
    fn empty_race_is_not_found() {
        assert_eq!(RaceOutcome::default().into_lookup(), Lookup::NotFound);
    }

    #[test]
    fn transport_404_is_not_found() {
        let err = TransportError::Permanent {
            url: "http://x".into(),
            status: 404,
        };
        assert_eq!(Lookup::<()>::from_transport_error(&err), Lookup::NotFound);

        let err = TransportError::Permanent {
            url: "http://x".into(),
            status: 403,
        };
        assert!(matches!(
            Lookup::<()>::from_transport_error(&err),
            Lookup::Unavailable(_)
        ));
    }
}
