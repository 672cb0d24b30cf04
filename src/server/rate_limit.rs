//! Governor-based rate limiting middleware for the webhook route.

use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// A shared rate limiter instance.
pub type SharedLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a rate limiter with the given requests-per-minute quota.
///
/// Returns `None` for a quota of zero, which disables limiting.
pub fn create_limiter(requests_per_minute: u32) -> Option<SharedLimiter> {
    let per_minute = NonZeroU32::new(requests_per_minute)?;
    Some(Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))))
}

/// Rate limiting middleware. Returns 429 Too Many Requests when exceeded.
pub async fn rate_limit_middleware(
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let limiter = request.extensions().get::<SharedLimiter>().cloned();

    if let Some(limiter) = limiter {
        if limiter.check().is_err() {
            tracing::warn!("Webhook rate limit exceeded");
            let body = serde_json::json!({
                "error": "Rate limit exceeded",
                "code": "rate_limited",
            });
            return Err((StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response());
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_disables_limiting() {
        assert!(create_limiter(0).is_none());
    }

    #[test]
    fn quota_allows_burst_then_rejects() {
        let limiter = create_limiter(2).unwrap();
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
