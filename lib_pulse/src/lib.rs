//! # lib_pulse
//!
//! Live comment and video-analytics ingestion for a single monitored video.
//!
//! The crate keeps a bounded, continuously-updated local view of the stream. When the
//! upstream WebSocket cannot be reached (or gives up after its reconnect budget), a synthetic
//! generator takes over and feeds the exact same state path, so readers of the view never
//! need to know where the data came from.
//!
//! Modules are gated by feature, in the same folder-per-feature layout as the rest of the
//! workspace:
//!
//! - `ingest` (default): [`core`], [`ingestors`]
//! - `analysis`: [`analysis`] (used by the upstream feed server)
//! - `loggers`: [`loggers`]
//!
//! [`models`], [`configs`] and [`error`] are always available.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod configs;
pub mod error;
pub mod models;

#[cfg(feature = "ingest")]
pub mod core;
#[cfg(feature = "ingest")]
pub mod ingestors;

#[cfg(feature = "analysis")]
pub mod analysis;

#[cfg(feature = "loggers")]
pub mod loggers;

// --- Public API Re-exports ---
pub use configs::IngestConfig;
pub use error::IngestError;
pub use models::{
    AnalyticsSnapshot, Comment, Envelope, EventRecord, FeedMessage, SentimentLabel, TrendPoint,
    VideoMetadata, WordCount,
};

#[cfg(feature = "ingest")]
pub use crate::core::{ConnectionState, IngestStatus, IngestionFacade, Snapshot, SourceMode};
