//! Status classification and backoff arithmetic.
//!
//! Everything here is pure so the retry decisions can be tested without a
//! server.

use std::time::Duration;

use crate::config::HttpConfig;

/// How the transport reacts to a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx: hand the response to the caller.
    Success,
    /// 429: wait for the server-indicated delay and try again.
    RateLimited,
    /// 500/502/503/504: retry with exponential backoff.
    Transient,
    /// Everything else: fail immediately.
    Permanent,
}

/// Classify an HTTP status code.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 => StatusClass::RateLimited,
        500 | 502 | 503 | 504 => StatusClass::Transient,
        _ => StatusClass::Permanent,
    }
}

/// Parse a `Retry-After` header given in integer seconds.
///
/// HTTP-date values are not supported and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts allowed for transient failures.
    pub max_retries: u32,
    pub backoff_base: f64,
    pub backoff_unit: Duration,
    pub default_retry_after: Duration,
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            backoff_base: config.backoff_base,
            backoff_unit: Duration::from_millis(config.backoff_unit_ms),
            default_retry_after: Duration::from_secs(config.default_retry_after_secs),
            max_retry_after: Duration::from_secs(config.max_retry_after_secs),
        }
    }

    /// Delay before the next try after failed attempt number `attempt`
    /// (zero-based): `backoff_unit * backoff_base^attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.backoff_base.powi(exponent);
        let secs = self.backoff_unit.as_secs_f64() * factor;
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        delay.min(self.max_backoff())
    }

    /// Wait for a 429 response, clamped to `max_retry_after`.
    pub fn retry_after_delay(&self, header: Option<&str>) -> Duration {
        header
            .and_then(parse_retry_after)
            .unwrap_or(self.default_retry_after)
            .min(self.max_retry_after)
    }

    fn max_backoff(&self) -> Duration {
        // An hour is far past any useful retry horizon.
        Duration::from_secs(3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_codes() {
        assert_eq!(classify_status(200), StatusClass::Success);
        assert_eq!(classify_status(204), StatusClass::Success);
        assert_eq!(classify_status(429), StatusClass::RateLimited);
        for status in [500, 502, 503, 504] {
            assert_eq!(classify_status(status), StatusClass::Transient);
        }
        for status in [400, 401, 403, 404, 405, 406, 410, 422] {
            assert_eq!(classify_status(status), StatusClass::Permanent);
        }
        assert_eq!(classify_status(418), StatusClass::Permanent);
        assert_eq!(classify_status(501), StatusClass::Permanent);
        assert_eq!(classify_status(302), StatusClass::Permanent);
    }

    #[test]
    fn backoff_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(200), Duration::from_secs(3600));
    }

    #[test]
    fn retry_after_defaults_and_clamps() {
        let policy = RetryPolicy {
            max_retry_after: Duration::from_secs(10),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.retry_after_delay(None), Duration::from_secs(5));
        assert_eq!(policy.retry_after_delay(Some("garbage")), Duration::from_secs(5));
        assert_eq!(policy.retry_after_delay(Some(" 3 ")), Duration::from_secs(3));
        assert_eq!(policy.retry_after_delay(Some("120")), Duration::from_secs(10));
    }

    #[test]
    fn http_dates_are_not_parsed() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
