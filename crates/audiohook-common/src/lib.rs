//! Audiohook-Common: Shared types, IDs, and errors.
//!
//! This crate provides common functionality used across audiohook:
//!
//! - **Job tokens**: Type-safe UUID wrapper identifying an ingested webhook job
//! - **Metadata**: The normalized [`BookMetadata`] record every provider maps into
//! - **Error Handling**: Common error type with HTTP status mapping
//!
//! # Examples
//!
//! ```
//! use audiohook_common::{BookMetadata, Error, JobToken, MetadataSource, Result};
//!
//! let token = JobToken::new();
//!
//! let fallback = BookMetadata::fallback("Project Hail Mary", Some("Andy Weir".into()));
//! assert_eq!(fallback.source, MetadataSource::Fallback);
//!
//! fn enqueue() -> Result<()> {
//!     Err(Error::QueueFull { capacity: 10 })
//! }
//! ```

pub mod error;
pub mod ids;
pub mod metadata;

pub use error::{Error, Result};
pub use ids::JobToken;
pub use metadata::*;
