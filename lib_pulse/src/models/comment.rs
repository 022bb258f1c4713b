use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical sentiment attached to a comment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// A single viewer comment.
///
/// `comment_id` is assigned by whoever produced the comment (the upstream source or the
/// synthetic generator) and is the only required field on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "id")]
    pub comment_id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "like_count")]
    pub likes: u64,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub sentiment_label: SentimentLabel,
    /// Creation instant as sent by the source; never used for ordering.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub is_reply: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

impl Comment {
    /// Clamps the sentiment score into `[-1, 1]`.
    pub fn normalized(mut self) -> Self {
        self.sentiment_score = if self.sentiment_score.is_finite() {
            self.sentiment_score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Parses `timestamp` as RFC 3339, or as a naive `YYYY-MM-DD HH:MM:SS[.f]` taken as UTC.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&self.timestamp, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_producer_shape_with_aliases() {
        let comment: Comment = serde_json::from_value(json!({
            "id": "c1",
            "author": "Viewer1",
            "text": "great",
            "like_count": 4,
            "sentiment_score": 0.4,
            "sentiment_label": "positive",
            "timestamp": "2024-05-01 10:00:00.250000"
        }))
        .unwrap();
        assert_eq!(comment.comment_id, "c1");
        assert_eq!(comment.likes, 4);
        assert_eq!(comment.sentiment_label, SentimentLabel::Positive);
        assert!(comment.published_at().is_some());
    }

    #[test]
    fn id_is_required() {
        assert!(serde_json::from_value::<Comment>(json!({"author": "a"})).is_err());
    }

    #[test]
    fn normalized_clamps_score() {
        let comment: Comment =
            serde_json::from_value(json!({"comment_id": "x", "sentiment_score": 3.5})).unwrap();
        assert_eq!(comment.normalized().sentiment_score, 1.0);
    }

    #[test]
    fn published_at_understands_rfc3339() {
        let comment: Comment = serde_json::from_value(
            json!({"comment_id": "x", "timestamp": "2024-05-01T10:00:00+02:00"}),
        )
        .unwrap();
        let ts = comment.published_at().unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T08:00:00+00:00");
    }

    #[test]
    fn unknown_label_is_rejected() {
        let res = serde_json::from_value::<Comment>(
            json!({"comment_id": "x", "sentiment_label": "ecstatic"}),
        );
        assert!(res.is_err());
    }
}
