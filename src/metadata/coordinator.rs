//! Fixed-priority fallback across the metadata providers.
//!
//! The cascade is MAM → ASIN → Audnex, then title → Audible search. Each step
//! either produces a result or hands over to the next one; a provider being
//! down is logged and treated the same as it having nothing.

use std::sync::Arc;

use audiohook_common::{AsinSource, BookMetadata, MetadataSource};
use audiohook_parser::guess_title_author;
use tracing::{debug, info, warn};

use super::provider::{AsinExtractor, BookProvider, CatalogSearch, Lookup};
use super::providers::{AudibleSearch, AudnexProvider, MamClient};
use super::workflow::{transition, Outcome, Step, Transition};
use crate::config::Config;
use crate::http::{RegionRace, Transport};

/// Terminal result of one coordinator run.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Box<BookMetadata>),
    Exhausted,
}

/// Steps visited and the terminal result.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowReport {
    pub visited: Vec<Step>,
    pub resolution: Resolution,
}

impl WorkflowReport {
    pub fn metadata(&self) -> Option<&BookMetadata> {
        match &self.resolution {
            Resolution::Resolved(metadata) => Some(metadata),
            Resolution::Exhausted => None,
        }
    }

    pub fn into_metadata(self) -> Option<BookMetadata> {
        match self.resolution {
            Resolution::Resolved(metadata) => Some(*metadata),
            Resolution::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.resolution, Resolution::Exhausted)
    }
}

/// Runs the fallback cascade for one webhook.
pub struct MetadataCoordinator {
    mam: Option<Arc<dyn AsinExtractor>>,
    books: Arc<dyn BookProvider>,
    search: Arc<dyn CatalogSearch>,
    regions: Vec<String>,
    fetch_chapters: bool,
    resolve_search_hits: bool,
}

impl MetadataCoordinator {
    pub fn new(
        books: Arc<dyn BookProvider>,
        search: Arc<dyn CatalogSearch>,
        regions: Vec<String>,
    ) -> Self {
        Self {
            mam: None,
            books,
            search,
            regions,
            fetch_chapters: false,
            resolve_search_hits: false,
        }
    }

    /// Wire up the real providers over one shared transport.
    pub fn from_config(config: &Config, transport: Arc<Transport>) -> Self {
        let race = RegionRace::new(Arc::clone(&transport), config.regions.max_regions_to_try);
        let books = Arc::new(AudnexProvider::new(race.clone(), &config.audnex));
        let search = Arc::new(AudibleSearch::new(race, &config.audible));

        let mut coordinator = Self::new(books, search, config.regions.list.clone())
            .fetch_chapters(config.audnex.fetch_chapters)
            .resolve_search_hits(config.audible.resolve_with_audnex);

        if let Some(mam) = MamClient::from_config(transport, &config.mam) {
            coordinator = coordinator.with_mam(Arc::new(mam));
        }
        coordinator
    }

    pub fn with_mam(mut self, mam: Arc<dyn AsinExtractor>) -> Self {
        self.mam = Some(mam);
        self
    }

    pub fn fetch_chapters(mut self, enabled: bool) -> Self {
        self.fetch_chapters = enabled;
        self
    }

    pub fn resolve_search_hits(mut self, enabled: bool) -> Self {
        self.resolve_search_hits = enabled;
        self
    }

    /// Resolve a webhook's release `name` and item `url` to metadata.
    pub async fn resolve(&self, name: &str, url: &str) -> WorkflowReport {
        let mut step = Step::MamLookup;
        let mut visited = Vec::new();
        let mut asin: Option<String> = None;
        let mut resolved: Option<BookMetadata> = None;

        loop {
            visited.push(step);

            let outcome = match step {
                Step::MamLookup => match self.mam_lookup(url).await {
                    Lookup::Found(found) => {
                        asin = Some(found);
                        Outcome::Found
                    }
                    other => outcome_of(step, &other),
                },
                Step::AsinResolve => match asin.as_deref() {
                    Some(key) => match self.asin_resolve(key).await {
                        Lookup::Found(metadata) => {
                            resolved = Some(metadata);
                            Outcome::Resolved
                        }
                        other => outcome_of(step, &other),
                    },
                    None => Outcome::NotFound,
                },
                Step::TitleSearch => match self.title_search(name).await {
                    Lookup::Found(metadata) => {
                        resolved = Some(metadata);
                        Outcome::Resolved
                    }
                    other => outcome_of(step, &other),
                },
                Step::Exhausted => Outcome::NotFound,
            };

            debug!(step = %step, outcome = ?outcome, "Fallback step finished");

            match transition(step, outcome) {
                Transition::Advance(next) => step = next,
                Transition::Finish => break,
            }
        }

        let resolution = match resolved {
            Some(mut metadata) => {
                if self.fetch_chapters {
                    self.attach_chapters(&mut metadata).await;
                }
                info!(
                    title = %metadata.title,
                    source = %metadata.source,
                    region = metadata.region.as_deref().unwrap_or("-"),
                    "Metadata resolved"
                );
                Resolution::Resolved(Box::new(metadata))
            }
            None => {
                info!(name, "Metadata cascade exhausted");
                Resolution::Exhausted
            }
        };

        WorkflowReport {
            visited,
            resolution,
        }
    }

    async fn mam_lookup(&self, url: &str) -> Lookup<String> {
        match &self.mam {
            Some(mam) if mam.handles(url) => mam.find_asin(url).await,
            Some(_) => {
                debug!(url, "Not a tracker URL");
                Lookup::NotFound
            }
            None => Lookup::NotFound,
        }
    }

    async fn asin_resolve(&self, asin: &str) -> Lookup<BookMetadata> {
        self.books
            .book_by_asin(asin, &self.regions)
            .await
            .map(|hit| {
                let mut metadata = hit.metadata;
                metadata.source = MetadataSource::Provider;
                metadata.asin_source = Some(AsinSource::Mam);
                metadata.asin.get_or_insert_with(|| asin.to_string());
                metadata.region = Some(hit.region);
                metadata
            })
    }

    async fn title_search(&self, name: &str) -> Lookup<BookMetadata> {
        let guess = guess_title_author(name);
        debug!(title = %guess.title, author = ?guess.author, "Searching catalog");

        let hit = match self.search.search(&guess, &self.regions).await {
            Lookup::Found(hit) => hit,
            Lookup::NotFound => return Lookup::NotFound,
            Lookup::Unavailable(reason) => return Lookup::Unavailable(reason),
        };

        let mut metadata = hit.metadata;
        if self.resolve_search_hits {
            if let Some(asin) = metadata.asin.clone() {
                match self.books.book_in_region(&asin, &hit.region).await {
                    Lookup::Found(full) => metadata = full,
                    Lookup::NotFound => debug!(asin = %asin, "Search hit unknown to book provider"),
                    Lookup::Unavailable(reason) => {
                        warn!(asin = %asin, reason = %reason, "Could not resolve search hit")
                    }
                }
            }
        }

        metadata.source = MetadataSource::Search;
        metadata.asin_source = metadata.asin.as_ref().map(|_| AsinSource::Search);
        metadata.region = Some(hit.region);
        Lookup::Found(metadata)
    }

    /// Add chapter markers from the region that produced the record.
    async fn attach_chapters(&self, metadata: &mut BookMetadata) {
        let (Some(asin), Some(region)) = (metadata.asin.clone(), metadata.region.clone()) else {
            return;
        };
        match self.books.chapters(&asin, &region).await {
            Lookup::Found(chapters) => metadata.chapters = Some(chapters),
            Lookup::NotFound => debug!(asin = %asin, region = %region, "No chapters"),
            Lookup::Unavailable(reason) => {
                warn!(asin = %asin, region = %region, reason = %reason, "Chapter lookup failed")
            }
        }
    }
}

fn outcome_of<T>(step: Step, lookup: &Lookup<T>) -> Outcome {
    match lookup {
        Lookup::Found(_) => Outcome::Found,
        Lookup::NotFound => Outcome::NotFound,
        Lookup::Unavailable(reason) => {
            warn!(step = %step, reason = %reason, "Provider unavailable, falling back");
            Outcome::Failed
        }
    }
}
