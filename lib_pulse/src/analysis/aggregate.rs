//! Builds an [`AnalyticsSnapshot`] from a comment history.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;

use crate::error::IngestError;
use crate::models::{AnalyticsSnapshot, Comment, SentimentLabel, TrendPoint, WordCount};

const TOP_WORDS: usize = 20;
const TREND_BATCH: usize = 10;

#[derive(Debug, Clone)]
pub struct AnalyticsAggregator {
    word: Regex,
}

impl AnalyticsAggregator {
    pub fn new() -> Result<Self, IngestError> {
        Ok(Self {
            word: Regex::new(r"\b\w+\b")?,
        })
    }

    /// Summarizes top-level comments (replies are skipped). `history` is newest first.
    ///
    /// Returns `None` when there is nothing to summarize.
    pub fn summarize(&self, history: &[Comment]) -> Option<AnalyticsSnapshot> {
        let comments: Vec<&Comment> = history.iter().filter(|c| !c.is_reply).collect();
        if comments.is_empty() {
            return None;
        }
        let n = comments.len() as f64;

        let total_likes: u64 = comments.iter().map(|c| c.likes).sum();
        let avg_sentiment = comments.iter().map(|c| c.sentiment_score).sum::<f64>() / n;
        let weighted_sentiment = if total_likes > 0 {
            comments
                .iter()
                .map(|c| c.sentiment_score * c.likes as f64)
                .sum::<f64>()
                / total_likes as f64
        } else {
            0.0
        };

        let mut distribution: BTreeMap<SentimentLabel, u64> = BTreeMap::new();
        for c in &comments {
            *distribution.entry(c.sentiment_label).or_default() += 1;
        }
        let percentage = |label: SentimentLabel| {
            distribution.get(&label).copied().unwrap_or(0) as f64 / n * 100.0
        };

        Some(AnalyticsSnapshot {
            total_comments: comments.len() as u64,
            avg_sentiment,
            weighted_sentiment,
            positive_percentage: percentage(SentimentLabel::Positive),
            negative_percentage: percentage(SentimentLabel::Negative),
            neutral_percentage: percentage(SentimentLabel::Neutral),
            engagement_score: total_likes as f64 / n,
            top_words: self.top_words(&comments),
            time_trend: time_trend(&comments),
            sentiment_distribution: distribution,
        })
    }

    /// Most frequent words; ties keep the order in which words were first seen.
    fn top_words(&self, comments: &[&Comment]) -> Vec<WordCount> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<WordCount> = Vec::new();

        for c in comments {
            let text = c.text.to_lowercase();
            for m in self.word.find_iter(&text) {
                match index.get(m.as_str()) {
                    Some(&i) => counts[i].1 += 1,
                    None => {
                        index.insert(m.as_str().to_string(), counts.len());
                        counts.push(WordCount(m.as_str().to_string(), 1));
                    }
                }
            }
        }

        // stable: equal counts stay in first-seen order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(TOP_WORDS);
        counts
    }
}

/// Batches of up to ten, starting every `max(1, n / 10)` comments. Each point takes the
/// timestamp of its first comment.
fn time_trend(comments: &[&Comment]) -> Vec<TrendPoint> {
    let step = (comments.len() / TREND_BATCH).max(1);
    (0..comments.len())
        .step_by(step)
        .map(|start| {
            let batch = &comments[start..(start + TREND_BATCH).min(comments.len())];
            let sentiment =
                batch.iter().map(|c| c.sentiment_score).sum::<f64>() / batch.len() as f64;
            TrendPoint {
                timestamp: batch[0].timestamp.clone(),
                sentiment,
            }
        })
        .collect()
}
