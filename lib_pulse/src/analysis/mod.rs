//! # Analysis
//!
//! Producer-side helpers used by the feed server: keyword sentiment, analytics aggregation
//! and video id extraction. The ingestion client never calls these; it takes analytics as
//! delivered.

pub mod aggregate;
pub mod sentiment;
pub mod video_id;

pub use aggregate::AnalyticsAggregator;
pub use sentiment::{Emotion, SentimentAnalyzer, SentimentResult};
pub use video_id::VideoIdExtractor;
