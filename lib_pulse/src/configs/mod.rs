//! # Configuration
//!
//! Settings of the ingestion client. The binaries layer their own `clap` based configs on
//! top of this and hand the result to the facade.

/// The `IngestConfig` object and its loaders.
pub mod ingest_config;

pub use ingest_config::IngestConfig;
