use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::comment::SentimentLabel;

/// `(word, count)` pair; encoded as a two element array, e.g. `["analysis", 25]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount(pub String, pub u64);

/// One sample of the sentiment time trend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendPoint {
    pub timestamp: String,
    pub sentiment: f64,
}

/// Aggregated view computed by the producer. The client never merges these; each
/// `analytics_update` replaces the previous snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSnapshot {
    pub total_comments: u64,
    pub avg_sentiment: f64,
    pub weighted_sentiment: f64,
    pub sentiment_distribution: BTreeMap<SentimentLabel, u64>,
    pub positive_percentage: f64,
    pub negative_percentage: f64,
    pub neutral_percentage: f64,
    pub engagement_score: f64,
    /// Ranked, no duplicate words.
    pub top_words: Vec<WordCount>,
    pub time_trend: Vec<TrendPoint>,
}

fn clamp_percentage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

impl AnalyticsSnapshot {
    /// Clamps percentages into `[0, 100]` and drops repeated words, keeping the first
    /// (highest ranked) occurrence.
    pub fn normalized(mut self) -> Self {
        self.positive_percentage = clamp_percentage(self.positive_percentage);
        self.negative_percentage = clamp_percentage(self.negative_percentage);
        self.neutral_percentage = clamp_percentage(self.neutral_percentage);

        let mut seen = HashSet::new();
        self.top_words.retain(|WordCount(word, _)| seen.insert(word.clone()));
        self
    }
}
