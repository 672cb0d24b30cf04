//! Audiohook - audiobook release webhook receiver
//!
//! Accepts release announcements over HTTP, queues them, and resolves each
//! one to normalized book metadata through a fixed provider cascade
//! (tracker ASIN lookup, Audnex by ASIN, Audible catalog search).

pub mod config;
pub mod http;
pub mod metadata;
pub mod notifications;
pub mod queue;
pub mod server;
pub mod store;
