//! Keyword based sentiment scoring for comment text.

use regex::Regex;
use serde::Serialize;

use crate::error::IngestError;
use crate::models::SentimentLabel;

const POSITIVE: [&str; 12] = [
    "great", "excellent", "amazing", "fantastic", "wonderful", "brilliant", "outstanding",
    "perfect", "love", "awesome", "incredible", "superb",
];

const NEGATIVE: [&str; 12] = [
    "terrible", "awful", "horrible", "disgusting", "pathetic", "waste", "stupid", "ridiculous",
    "hate", "worst", "trash", "garbage",
];

/// Checked in this order; the first emotion with a matching keyword wins.
const EMOTIONS: [(Emotion, &[&str]); 5] = [
    (
        Emotion::Anger,
        &["angry", "mad", "furious", "outraged", "livid", "pissed", "rage"],
    ),
    (
        Emotion::Joy,
        &["happy", "excited", "thrilled", "delighted", "ecstatic", "cheerful", "joyful"],
    ),
    (
        Emotion::Fear,
        &["scared", "afraid", "worried", "anxious", "concerned", "nervous"],
    ),
    (
        Emotion::Sadness,
        &["sad", "disappointed", "depressed", "upset", "heartbroken", "miserable"],
    ),
    (
        Emotion::Surprise,
        &["surprised", "shocked", "amazed", "astonished", "stunned", "wow"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anger,
    Joy,
    Fear,
    Sadness,
    Surprise,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    /// In `[-0.8, 0.8]`.
    pub score: f64,
    pub label: SentimentLabel,
    /// Keyword balance per word, `(positive - negative) / words`.
    pub political_score: f64,
    pub confidence: f64,
    pub emotion: Emotion,
}

/// Scores text by counting positive and negative keywords.
///
/// One more positive than negative word gives `0.4`, each further one adds `0.1`, capped at
/// `0.8`; the negative side mirrors it. A tie is neutral with score `0`.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    links: Regex,
    tags: Regex,
    punctuation: Regex,
}

impl SentimentAnalyzer {
    pub fn new() -> Result<Self, IngestError> {
        Ok(Self {
            links: Regex::new(r"https?\S+|www\S+")?,
            tags: Regex::new(r"[@#]\w+")?,
            punctuation: Regex::new(r"[^\w\s]")?,
        })
    }

    /// Removes links, mentions and hashtags, replaces punctuation with spaces and lowercases.
    pub fn clean_text(&self, text: &str) -> String {
        let text = self.links.replace_all(text, "");
        let text = self.tags.replace_all(&text, "");
        let text = self.punctuation.replace_all(&text, " ");
        text.trim().to_lowercase()
    }

    pub fn analyze(&self, text: &str) -> SentimentResult {
        let cleaned = self.clean_text(text);
        let words: Vec<&str> = cleaned.split_whitespace().collect();

        let positive = words.iter().filter(|w| POSITIVE.contains(*w)).count() as i64;
        let negative = words.iter().filter(|w| NEGATIVE.contains(*w)).count() as i64;
        let diff = positive - negative;

        let (label, score) = match diff {
            d if d > 0 => (SentimentLabel::Positive, (0.3 + d as f64 * 0.1).min(0.8)),
            d if d < 0 => (SentimentLabel::Negative, (-0.3 + d as f64 * 0.1).max(-0.8)),
            _ => (SentimentLabel::Neutral, 0.0),
        };

        let political_score = if words.is_empty() {
            0.0
        } else {
            diff as f64 / words.len() as f64
        };

        SentimentResult {
            score,
            label,
            political_score,
            confidence: score.abs(),
            emotion: detect_emotion(&cleaned),
        }
    }
}

/// Substring match on already cleaned text, so "madness" counts as anger.
fn detect_emotion(cleaned: &str) -> Emotion {
    EMOTIONS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| cleaned.contains(k)))
        .map(|(emotion, _)| *emotion)
        .unwrap_or(Emotion::Neutral)
}
