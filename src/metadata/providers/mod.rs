//! Concrete provider implementations.
//!
//! Each submodule wraps a single external API and implements one of the
//! seams in [`provider`](super::provider).

pub mod audible;
pub mod audnex;
pub mod mam;

pub use audible::AudibleSearch;
pub use audnex::AudnexProvider;
pub use mam::MamClient;
