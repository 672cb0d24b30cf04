//! Bounded ingestion queue between the webhook handler and the worker.
//!
//! The handler enqueues without blocking and answers immediately; a full
//! queue rejects new jobs instead of evicting old ones. A single worker
//! drains the queue and runs the metadata cascade for each job.

pub mod ingest;
pub mod job;
pub mod worker;

pub use ingest::IngestQueue;
pub use job::{QueueJob, WebhookPayload};
pub use worker::{fallback_metadata, Worker};
