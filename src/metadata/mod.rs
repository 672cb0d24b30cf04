//! Metadata acquisition for incoming audiobook releases.
//!
//! # Module layout
//!
//! - [`provider`] -- Provider seams and the [`Lookup`] result type.
//! - [`providers`] -- MAM, Audnex and Audible adapters.
//! - [`workflow`] -- The fallback cascade as a pure state machine.
//! - [`coordinator`] -- Runs the cascade against the providers.

pub mod coordinator;
pub mod provider;
pub mod providers;
pub mod workflow;

pub use coordinator::{MetadataCoordinator, Resolution, WorkflowReport};
pub use provider::{AsinExtractor, BookProvider, CatalogSearch, Lookup, ProviderHit};
pub use workflow::{transition, Outcome, Step, Transition};
