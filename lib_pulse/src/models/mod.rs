//! # Data Model
//!
//! Plain data carried through the ingestion pipeline: what the upstream feed sends, and what
//! the state store keeps. Field names follow the wire format (`snake_case`), so every type
//! here is both the decode target of the classifier and the encode source of the feed server.

/// Video metadata (`video_info`).
pub mod video;
/// Comments and sentiment labels (`new_comments`).
pub mod comment;
/// Aggregated analytics (`analytics_update`).
pub mod analytics;
/// Generic records for unrecognized message kinds.
pub mod event;
/// Wire envelope and typed outbound messages.
pub mod wire;

pub use analytics::{AnalyticsSnapshot, TrendPoint, WordCount};
pub use comment::{Comment, SentimentLabel};
pub use event::EventRecord;
pub use video::VideoMetadata;
pub use wire::{Envelope, FeedMessage};
