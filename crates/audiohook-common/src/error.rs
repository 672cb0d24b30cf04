//! Unified error type for audiohook.
//!
//! Failures that cross the HTTP boundary funnel into [`Error`], which carries
//! enough context for handlers to derive a status code via
//! [`Error::http_status`].

use std::fmt;

/// Common error type for audiohook.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "job").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The caller failed signature verification.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The ingestion queue is at capacity; the job was not accepted.
    #[error("Queue is full ({capacity} jobs pending)")]
    QueueFull {
        /// Fixed capacity of the queue that rejected the job.
        capacity: usize,
    },

    /// Too many requests from the caller.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Configuration could not be loaded or is invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Unauthorized(_) => 401,
            Error::Validation(_) => 400,
            Error::QueueFull { .. } => 503,
            Error::RateLimited => 429,
            Error::Config(_) => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Unauthorized(_) => "unauthorized",
            Error::Validation(_) => "validation_error",
            Error::QueueFull { .. } => "queue_full",
            Error::RateLimited => "rate_limited",
            Error::Config(_) => "config_error",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Convenience constructor for [`Error::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("job", "abc");
        assert_eq!(err.to_string(), "job not found: abc");

        let err = Error::QueueFull { capacity: 3 };
        assert_eq!(err.to_string(), "Queue is full (3 jobs pending)");

        let err = Error::validation("missing name");
        assert_eq!(err.to_string(), "Validation error: missing name");
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(Error::not_found("job", 1).http_status(), 404);
        assert_eq!(Error::QueueFull { capacity: 1 }.http_status(), 503);
        assert_eq!(Error::RateLimited.http_status(), 429);
        assert_eq!(Error::Unauthorized("sig".into()).http_status(), 401);
        assert_eq!(Error::validation("x").http_status(), 400);
        assert_eq!(Error::internal("x").http_status(), 500);
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.code(), "io_error");
    }
}
