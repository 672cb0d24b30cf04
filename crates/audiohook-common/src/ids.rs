//! Typed identifiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique token assigned to a webhook job when it is accepted.
///
/// The token is handed back to the webhook caller synchronously and keys the
/// stored record once the worker has processed the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobToken(Uuid);

impl JobToken {
    /// Generate a new random token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token from its hyphenated string form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for JobToken {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for JobToken {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<JobToken> for Uuid {
    fn from(token: JobToken) -> Self {
        token.0
    }
}

impl std::fmt::Display for JobToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
