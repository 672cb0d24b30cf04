//! Outbound HTTP plumbing shared by every metadata provider.
//!
//! - [`Transport`]: one pooled client behind a single rate gate, with the
//!   status-driven retry policy applied to every request.
//! - [`RegionRace`]: concurrent first-valid-wins fan-out over catalog regions.

mod gate;
pub mod race;
pub mod retry;
pub mod transport;

pub use gate::RateGate;
pub use race::{default_validator, RaceOutcome, RegionError, RegionRace};
pub use retry::{classify_status, parse_retry_after, RetryPolicy, StatusClass};
pub use transport::{HttpRequest, Transport, TransportError};
