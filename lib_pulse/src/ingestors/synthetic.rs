//! # Synthetic Comment Ingestor
//!
//! A self-scheduling producer that stands in for the live feed once the connection manager
//! has given up (or could never be built).
//!
//! ## Key Design Principles:
//! - **Same path as live data**: every generated item is wrapped in the same [`Envelope`]
//!   the WebSocket client produces and goes through the classifier, so views cannot tell the
//!   two sources apart.
//! - **One-time seed**: [`SyntheticGenerator::seed_messages`] yields video metadata, an
//!   analytics snapshot and five comments. The content is fixed; only timestamps move.
//! - **Comments only afterwards**: [`SyntheticFeed`] emits exactly one new comment per tick
//!   and never touches analytics again.
//! - **Independent label**: the sentiment label of a generated comment is drawn separately
//!   from its score, so the two can disagree. Consumers must not assume they match.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::SourceEvent;
use crate::models::{
    AnalyticsSnapshot, Comment, FeedMessage, SentimentLabel, TrendPoint, VideoMetadata, WordCount,
};

const AUTHOR_HANDLES: [&str; 8] = [
    "Viewer", "User", "Analyst", "Citizen", "Student", "Researcher", "Voter", "Watcher",
];

const PHRASES: [&str; 12] = [
    "Excellent analysis! This really breaks down the complex issues clearly.",
    "I disagree with some of the conclusions drawn here. More research needed.",
    "Thank you for explaining this so well. Very informative content.",
    "This perspective is interesting but there are other factors to consider.",
    "I'm not convinced by this argument. What about the opposing viewpoint?",
    "The data presented here seems incomplete. Can you provide sources?",
    "Finally, someone who explains this without bias. Refreshing!",
    "Some good points, but you're missing the bigger picture.",
    "This analysis helps me understand the complexity of the situation.",
    "Looking forward to your take on the upcoming changes.",
    "The graphics make complex topics accessible. Thank you!",
    "Terrible take, the numbers do not support this at all.",
];

/// Seed comments: (author, text, likes, score, label, minutes ago).
const SEED_COMMENTS: [(&str, &str, u64, f64, SentimentLabel, i64); 5] = [
    (
        "Viewer1",
        "Excellent analysis! This really breaks down the complex issues clearly.",
        42,
        0.8,
        SentimentLabel::Positive,
        3,
    ),
    (
        "Viewer2",
        "I disagree with some of the conclusions drawn here. More research needed.",
        7,
        -0.4,
        SentimentLabel::Negative,
        12,
    ),
    (
        "Viewer3",
        "Looking forward to your take on the upcoming changes.",
        3,
        0.0,
        SentimentLabel::Neutral,
        27,
    ),
    (
        "Viewer4",
        "Thank you for explaining this so well. Very informative content.",
        19,
        0.6,
        SentimentLabel::Positive,
        41,
    ),
    (
        "Viewer5",
        "The data presented here seems incomplete. Can you provide sources?",
        5,
        -0.2,
        SentimentLabel::Negative,
        58,
    ),
];

fn rfc3339_minutes_ago(minutes: i64) -> String {
    (Utc::now() - chrono::Duration::minutes(minutes)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Source of plausible video, analytics and comment data.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    rng: StdRng,
    sequence: u64,
}

impl SyntheticGenerator {
    /// A generator with a fixed seed is fully reproducible apart from timestamps.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng, sequence: 0 }
    }

    pub fn seed_video() -> VideoMetadata {
        VideoMetadata {
            video_id: "synthetic".to_string(),
            title: "Political Analysis & Current Events".to_string(),
            description: "In-depth analysis of current political developments.".to_string(),
            channel_name: "Pulse Demo Channel".to_string(),
            view_count: 45_230,
            like_count: 1_820,
            comment_count: 342,
            upload_date: rfc3339_minutes_ago(3 * 24 * 60),
            duration: "PT12M45S".to_string(),
            tags: vec!["politics".into(), "analysis".into(), "current events".into()],
        }
    }

    pub fn seed_analytics() -> AnalyticsSnapshot {
        let distribution: BTreeMap<SentimentLabel, u64> = [
            (SentimentLabel::Positive, 2),
            (SentimentLabel::Negative, 2),
            (SentimentLabel::Neutral, 1),
        ]
        .into_iter()
        .collect();

        AnalyticsSnapshot {
            total_comments: SEED_COMMENTS.len() as u64,
            avg_sentiment: 0.16,
            weighted_sentiment: 0.42,
            sentiment_distribution: distribution,
            positive_percentage: 40.0,
            negative_percentage: 40.0,
            neutral_percentage: 20.0,
            engagement_score: 15.2,
            top_words: [
                ("analysis", 25),
                ("great", 20),
                ("political", 18),
                ("excellent", 15),
                ("good", 12),
                ("interesting", 10),
                ("helpful", 8),
                ("thanks", 7),
                ("policy", 6),
                ("insightful", 5),
            ]
            .into_iter()
            .map(|(word, count)| WordCount(word.to_string(), count))
            .collect(),
            time_trend: (1..=10)
                .rev()
                .zip([0.1, 0.3, 0.2, -0.1, 0.4, 0.5, 0.2, 0.0, 0.3, 0.16])
                .map(|(hours, sentiment)| TrendPoint {
                    timestamp: rfc3339_minutes_ago(hours * 60),
                    sentiment,
                })
                .collect(),
        }
    }

    /// The five seed comments, newest first, in one batch.
    pub fn seed_comments() -> Vec<Comment> {
        SEED_COMMENTS
            .iter()
            .enumerate()
            .map(|(i, &(author, text, likes, score, label, minutes))| Comment {
                comment_id: format!("seed_{}", i + 1),
                author: author.to_string(),
                text: text.to_string(),
                likes,
                sentiment_score: score,
                sentiment_label: label,
                timestamp: rfc3339_minutes_ago(minutes),
                ..Default::default()
            })
            .collect()
    }

    /// Seed set in application order: metadata, analytics, then the comments.
    pub fn seed_messages() -> Vec<FeedMessage> {
        vec![
            FeedMessage::VideoInfo(Self::seed_video()),
            FeedMessage::AnalyticsUpdate(Self::seed_analytics()),
            FeedMessage::NewComments(Self::seed_comments()),
        ]
    }

    /// One randomized comment.
    pub fn next_comment(&mut self) -> Comment {
        self.sequence += 1;
        let handle = AUTHOR_HANDLES[self.rng.random_range(0..AUTHOR_HANDLES.len())];
        let text = PHRASES[self.rng.random_range(0..PHRASES.len())];
        let score: f64 = self.rng.random_range(-1.0..=1.0);
        // Drawn on its own; it may contradict the score.
        let label = SentimentLabel::ALL[self.rng.random_range(0..SentimentLabel::ALL.len())];

        Comment {
            comment_id: format!("synthetic_{}", self.sequence),
            author: format!("{}{}", handle, self.rng.random_range(100..10_000)),
            text: text.to_string(),
            likes: self.rng.random_range(0..=50),
            sentiment_score: (score * 100.0).round() / 100.0,
            sentiment_label: label,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            ..Default::default()
        }
    }

    /// Message for one generator tick: exactly one new comment.
    pub fn tick(&mut self) -> FeedMessage {
        FeedMessage::NewComments(vec![self.next_comment()])
    }
}

/// Recurring timer that feeds generated comments into the reactor.
pub struct SyntheticFeed {
    generator: SyntheticGenerator,
    period: Duration,
    sink: mpsc::Sender<SourceEvent>,
    cancel: CancellationToken,
}

impl SyntheticFeed {
    pub fn new(
        generator: SyntheticGenerator,
        period: Duration,
        sink: mpsc::Sender<SourceEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generator,
            period,
            sink,
            cancel,
        }
    }

    /// # Main Execution Loop
    ///
    /// Sleeps one full period before the first comment, then emits one per period until the
    /// token is cancelled or the reactor goes away. Cancellation wins over a due tick.
    pub async fn run(mut self) {
        log::info!("Synthetic comment feed started, period {:?}.", self.period);

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let message = self.generator.tick();
            log::debug!("Generated synthetic {}", message.kind());

            let event = SourceEvent::Message(message.into_envelope());
            if self.sink.send(event).await.is_err() {
                log::debug!("Reactor gone, stopping synthetic feed.");
                break;
            }
        }

        log::info!("Synthetic comment feed stopped.");
    }
}
