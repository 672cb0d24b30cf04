//! First-valid-region-wins fan-out.
//!
//! A lookup is issued against several catalog regions at once. The first
//! response accepted by the validator wins; the remaining tasks are cancelled
//! through a shared [`CancellationToken`] and joined before the call returns,
//! so no request outlives the race.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::transport::{HttpRequest, Transport};

/// Failure recorded for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionError {
    pub region: String,
    pub message: String,
    /// The provider could not answer (as opposed to answering "nothing").
    pub unavailable: bool,
}

/// Result of a race. An empty payload is a normal "not found".
#[derive(Debug, Clone, Default)]
pub struct RaceOutcome {
    pub payload: Option<Value>,
    pub region: Option<String>,
    pub errors: Vec<RegionError>,
    pub attempted: usize,
}

impl RaceOutcome {
    pub fn is_found(&self) -> bool {
        self.payload.is_some()
    }

    /// Every attempted region failed at the transport level.
    pub fn all_unavailable(&self) -> bool {
        self.payload.is_none()
            && self.attempted > 0
            && self.errors.len() >= self.attempted
            && self.errors.iter().all(|e| e.unavailable)
    }

    /// One-line summary of the per-region errors.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.region, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Accepts any JSON that carries content: not null and not an empty
/// object, array or string.
pub fn default_validator(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Runs region races over a shared [`Transport`].
#[derive(Clone)]
pub struct RegionRace {
    transport: Arc<Transport>,
    max_regions: usize,
    in_flight: Arc<AtomicUsize>,
}

impl RegionRace {
    pub fn new(transport: Arc<Transport>, max_regions: usize) -> Self {
        Self {
            transport,
            max_regions: max_regions.max(1),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Race tasks currently alive. Always zero between calls.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Query up to `max_regions` distinct regions concurrently and return the
    /// first response that passes `validator`.
    pub async fn fetch_first_success<F, V>(
        &self,
        regions: &[String],
        url_factory: F,
        validator: V,
    ) -> RaceOutcome
    where
        F: Fn(&str) -> HttpRequest,
        V: Fn(&Value) -> bool,
    {
        let regions = rank_regions(regions, self.max_regions);
        if regions.is_empty() {
            return RaceOutcome::default();
        }

        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for region in &regions {
            let request = url_factory(region);
            let transport = Arc::clone(&self.transport);
            let token = cancel.clone();
            let guard = InFlight::enter(&self.in_flight);
            let region = region.clone();

            tasks.spawn(async move {
                let _guard = guard;
                let result = tokio::select! {
                    _ = token.cancelled() => None,
                    res = transport.get_json::<Value>(&request) => Some(res),
                };
                (region, result)
            });
        }

        let mut outcome = RaceOutcome {
            attempted: regions.len(),
            ..RaceOutcome::default()
        };

        // Drain every task, winner or not.
        while let Some(joined) = tasks.join_next().await {
            let (region, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "Region task failed to complete");
                    outcome.errors.push(RegionError {
                        region: "unknown".to_string(),
                        message: e.to_string(),
                        unavailable: true,
                    });
                    continue;
                }
            };

            match result {
                None => debug!(region = %region, "Region cancelled"),
                Some(Ok(payload)) => {
                    if outcome.payload.is_some() {
                        continue;
                    }
                    if validator(&payload) {
                        debug!(region = %region, "Region won the race");
                        outcome.payload = Some(payload);
                        outcome.region = Some(region);
                        cancel.cancel();
                    } else {
                        debug!(region = %region, "Response failed validation");
                        outcome.errors.push(RegionError {
                            region,
                            message: "response failed validation".to_string(),
                            unavailable: false,
                        });
                    }
                }
                Some(Err(e)) => {
                    debug!(region = %region, error = %e, "Region request failed");
                    outcome.errors.push(RegionError {
                        region,
                        unavailable: !e.is_not_found(),
                        message: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

/// Deduplicate preserving order, drop blanks, then keep the first `max`.
fn rank_regions(regions: &[String], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    regions
        .iter()
        .map(|r| r.trim().to_ascii_lowercase())
        .filter(|r| !r.is_empty() && seen.insert(r.clone()))
        .take(max)
        .collect()
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
