use crate::feed_logic::config::Config;
use crate::feed_logic::state::FeedState;
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use lib_pulse::analysis::{AnalyticsAggregator, SentimentAnalyzer, VideoIdExtractor};
use lib_pulse::{AnalyticsSnapshot, Comment, FeedMessage, SentimentLabel, TrendPoint, VideoMetadata, WordCount};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

const BASE_COMMENTS: [&str; 12] = [
    "Excellent analysis! This really breaks down the complex issues clearly.",
    "I disagree with some of the conclusions drawn here. More research needed.",
    "Thank you for explaining this so well. Very informative content.",
    "Great work! Your insights are always spot on.",
    "I'm not convinced by this argument. What about the opposing viewpoint?",
    "The data presented here seems incomplete. Can you provide sources?",
    "Finally, someone who explains this without bias. Refreshing!",
    "Some good points, but I think you're missing the bigger picture.",
    "Your research is thorough and your presentation is clear. Well done!",
    "This is a waste of time, terrible reasoning throughout.",
    "Brilliant breakdown of the policy implications step by step.",
    "Honestly the worst take I have seen on this topic.",
];

const PROFESSIONS: [&str; 6] = ["teacher", "student", "researcher", "journalist", "analyst", "voter"];
const VERDICTS: [&str; 5] = [
    "very insightful",
    "somewhat problematic",
    "quite helpful",
    "rather concerning",
    "extremely valuable",
];
const TOPICS: [&str; 5] = ["policy", "governance", "democracy", "legislation", "reform"];
const EVALUATIONS: [&str; 5] = ["spot on", "questionable", "well researched", "needs more context", "brilliant"];

/// Produces believable comments with analyzed sentiment.
pub struct MockCommentSource {
    rng: StdRng,
    analyzer: SentimentAnalyzer,
    video_id: String,
    sequence: u64,
}

impl MockCommentSource {
    pub fn new(video_id: &str, seed: Option<u64>) -> anyhow::Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            rng,
            analyzer: SentimentAnalyzer::new()?,
            video_id: video_id.to_string(),
            sequence: 0,
        })
    }

    pub fn video_info(&mut self) -> VideoMetadata {
        let days_ago = self.rng.random_range(1..=14);
        VideoMetadata {
            video_id: self.video_id.clone(),
            title: "Political Analysis & Current Events".to_string(),
            description: "In-depth analysis of current political developments and their implications.".to_string(),
            channel_name: "Pulse Demo Channel".to_string(),
            view_count: self.rng.random_range(15_000..=75_000),
            like_count: self.rng.random_range(800..=3_000),
            comment_count: self.rng.random_range(100..=800),
            upload_date: (Utc::now() - chrono::Duration::days(days_ago)).to_rfc3339_opts(SecondsFormat::Secs, true),
            duration: "PT12M45S".to_string(),
            tags: ["politics", "analysis", "current events", "news", "discussion"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    fn text(&mut self) -> String {
        if self.rng.random_bool(0.5) {
            return BASE_COMMENTS[self.rng.random_range(0..BASE_COMMENTS.len())].to_string();
        }
        match self.rng.random_range(0..2) {
            0 => format!(
                "As a {}, I find this analysis {}.",
                PROFESSIONS[self.rng.random_range(0..PROFESSIONS.len())],
                VERDICTS[self.rng.random_range(0..VERDICTS.len())]
            ),
            _ => format!(
                "The point you made about {} is {}.",
                TOPICS[self.rng.random_range(0..TOPICS.len())],
                EVALUATIONS[self.rng.random_range(0..EVALUATIONS.len())]
            ),
        }
    }

    /// One batch, oldest first.
    pub fn batch(&mut self, size: usize) -> Vec<Comment> {
        (0..size)
            .map(|_| {
                self.sequence += 1;
                let text = self.text();
                let sentiment = self.analyzer.analyze(&text);
                let minutes_ago = self.rng.random_range(0..=5);
                Comment {
                    comment_id: format!("mock_{}_{}", self.video_id, self.sequence),
                    author: format!("User{}", self.rng.random_range(100..10_000)),
                    text,
                    likes: self.rng.random_range(0..=50),
                    sentiment_score: sentiment.score,
                    sentiment_label: sentiment.label,
                    timestamp: (Utc::now() - chrono::Duration::minutes(minutes_ago))
                        .to_rfc3339_opts(SecondsFormat::Secs, true),
                    reply_count: self.rng.random_range(0..=5),
                    ..Default::default()
                }
            })
            .collect()
    }
}

impl MockCommentSource {
    /// Plausible analytics for when the history has nothing to summarize.
    pub fn mock_analytics(&mut self) -> AnalyticsSnapshot {
        let distribution: BTreeMap<SentimentLabel, u64> = [
            (SentimentLabel::Positive, self.rng.random_range(20..=60)),
            (SentimentLabel::Negative, self.rng.random_range(10..=40)),
            (SentimentLabel::Neutral, self.rng.random_range(15..=45)),
        ]
        .into_iter()
        .collect();
        let now = Utc::now();
        let time_trend = (1..=10)
            .rev()
            .map(|hours| TrendPoint {
                timestamp: (now - chrono::Duration::hours(hours)).to_rfc3339_opts(SecondsFormat::Secs, true),
                sentiment: round_to(self.rng.random_range(-0.5..=0.8), 2),
            })
            .collect();

        AnalyticsSnapshot {
            total_comments: self.rng.random_range(50..=200),
            avg_sentiment: round_to(self.rng.random_range(-0.5..=0.7), 3),
            weighted_sentiment: round_to(self.rng.random_range(-0.3..=0.8), 3),
            sentiment_distribution: distribution,
            positive_percentage: round_to(self.rng.random_range(35.0..=65.0), 1),
            negative_percentage: round_to(self.rng.random_range(15.0..=35.0), 1),
            neutral_percentage: round_to(self.rng.random_range(20.0..=40.0), 1),
            engagement_score: round_to(self.rng.random_range(3.0..=15.0), 1),
            top_words: MOCK_TOP_WORDS
                .iter()
                .map(|&(word, count)| WordCount(word.to_string(), count))
                .collect(),
            time_trend,
        }
        .normalized()
    }
}

const MOCK_TOP_WORDS: [(&str, u64); 10] = [
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
];

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Video id from the configured URL, or a placeholder when it has none.
pub fn video_id(config: &Config) -> anyhow::Result<String> {
    let extractor = VideoIdExtractor::new()?;
    let video_url = config.video_url.clone().unwrap_or_default();
    Ok(match extractor.extract(&video_url) {
        Ok(id) => id,
        Err(e) => {
            log::warn!("{}. Using a placeholder id.", e);
            "unknown".to_string()
        }
    })
}

/// The last `n` comments of a batch.
pub fn newest(batch: &[Comment], n: usize) -> Vec<Comment> {
    batch[batch.len().saturating_sub(n)..].to_vec()
}

/// # Producer Loop
///
/// Broadcasts `video_info` once, then every scrape interval: a batch of comments goes into the
/// history, the newest few are broadcast as `new_comments`, followed by fresh analytics
/// computed over the whole history.
pub async fn run(config: Config, state: FeedState, cancel: CancellationToken) -> anyhow::Result<()> {
    let video_id = video_id(&config)?;
    log::info!("Starting comment producer for video: {}", video_id);

    let mut source = MockCommentSource::new(&video_id, config.seed)?;
    let aggregator = AnalyticsAggregator::new()?;

    state.publish(FeedMessage::VideoInfo(source.video_info())).await;

    let period = config.scrape_interval();
    let mut ticker = interval_at(Instant::now(), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let batch = source.batch(config.batch_size());
        let history = state.record_comments(&batch).await;

        let reached = state
            .publish(FeedMessage::NewComments(newest(&batch, config.broadcast_newest())))
            .await;
        let analytics = aggregator
            .summarize(&history)
            .unwrap_or_else(|| source.mock_analytics());
        state.publish(FeedMessage::AnalyticsUpdate(analytics)).await;

        log::info!(
            "Broadcast {} new comments to {} clients, history {}",
            batch.len(),
            reached,
            history.len()
        );
    }

    log::info!("Comment producer stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn batch_labels_follow_analyzed_score() {
        let mut source = MockCommentSource::new("vid", Some(1)).unwrap();
        let batch = source.batch(50);
        assert_eq!(batch.len(), 50);
        assert_eq!(batch[0].comment_id, "mock_vid_1");
        for c in &batch {
            assert!((-0.8..=0.8).contains(&c.sentiment_score));
            let expected = SentimentAnalyzer::new().unwrap().analyze(&c.text).label;
            assert_eq!(c.sentiment_label, expected);
        }
    }

    #[test]
    fn newest_takes_batch_tail() {
        let mut source = MockCommentSource::new("vid", Some(2)).unwrap();
        let batch = source.batch(8);
        let tail = newest(&batch, 5);
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[4].comment_id, batch[7].comment_id);
        assert_eq!(newest(&batch[..2], 5).len(), 2);
    }

    #[test]
    fn mock_analytics_stay_in_range() {
        let mut source = MockCommentSource::new("vid", Some(4)).unwrap();
        let analytics = source.mock_analytics();
        assert!((50..=200).contains(&analytics.total_comments));
        assert!((35.0..=65.0).contains(&analytics.positive_percentage));
        assert_eq!(analytics.time_trend.len(), 10);
        assert!(analytics.time_trend[0].timestamp < analytics.time_trend[9].timestamp);
        assert_eq!(analytics.top_words[0], WordCount("analysis".to_string(), 25));
        assert_eq!(analytics.sentiment_distribution.len(), 3);
    }

    #[test]
    fn placeholder_id_for_unusable_url() {
        let config = Config {
            video_url: Some("https://example.com/".to_string()),
            ..Config::defaults()
        };
        assert_eq!(video_id(&config).unwrap(), "unknown");
        assert_eq!(video_id(&Config::defaults()).unwrap(), "dQw4w9WgXcQ");
    }

    #[tokio::test(start_paused = true)]
    async fn producer_broadcasts_video_then_batches() {
        let state = FeedState::new(500);
        let mut rx = state.data_tx.subscribe();
        let cancel = CancellationToken::new();
        let config = Config {
            seed: Some(3),
            ..Config::defaults()
        };
        let handle = tokio::spawn(run(config, state.clone(), cancel.clone()));

        let mut kinds = Vec::new();
        for _ in 0..5 {
            let frame = rx.recv().await.unwrap();
            let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
            kinds.push(value["type"].as_str().unwrap().to_string());
        }
        assert_eq!(
            kinds,
            vec!["video_info", "new_comments", "analytics_update", "new_comments", "analytics_update"]
        );
        assert_eq!(state.history_len().await, 100);

        cancel.cancel();
        handle.await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
    }
}
