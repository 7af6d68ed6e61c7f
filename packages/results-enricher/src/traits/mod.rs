//! Core trait abstractions for the enrichment pipeline.
//!
//! These traits are the seams where applications plug in persistence, page
//! transport, the proxy collaborator, audit sinks and progress reporting.

pub mod fetcher;
pub mod log_sink;
pub mod observer;
pub mod store;
