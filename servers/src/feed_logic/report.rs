use crate::feed_logic::config::Config;
use crate::feed_logic::producer::{self, MockCommentSource};
use lib_pulse::analysis::AnalyticsAggregator;
use lib_pulse::{AnalyticsSnapshot, Comment, VideoMetadata};
use serde::Serialize;

/// Comments scraped for a one-shot analysis.
const SCRAPE_LIMIT: usize = 100;
/// Comments kept in the report.
const RECENT: usize = 10;
/// Comments printed as a sample.
const SAMPLE: usize = 5;

/// # Video Report
///
/// Result of a single analysis run: metadata, analytics over the scraped comments and the
/// most recent ones.
#[derive(Debug, Clone, Serialize)]
pub struct VideoReport {
    pub video_info: VideoMetadata,
    pub analytics: AnalyticsSnapshot,
    pub recent_comments: Vec<Comment>,
}

/// Scrapes one batch for the configured video and summarizes it.
pub fn analyze_video(config: &Config) -> anyhow::Result<VideoReport> {
    let video_id = producer::video_id(config)?;
    log::info!("Analyzing video: {}", video_id);

    let mut source = MockCommentSource::new(&video_id, config.seed)?;
    let video_info = source.video_info();
    let comments = source.batch(SCRAPE_LIMIT);
    Ok(build_report(&mut source, &AnalyticsAggregator::new()?, video_info, comments))
}

/// `comments` is in scrape order, oldest first. Analytics fall back to mock values when there
/// is nothing to summarize.
pub fn build_report(
    source: &mut MockCommentSource,
    aggregator: &AnalyticsAggregator,
    video_info: VideoMetadata,
    comments: Vec<Comment>,
) -> VideoReport {
    let history: Vec<Comment> = comments.iter().rev().cloned().collect();
    let analytics = match aggregator.summarize(&history) {
        Some(analytics) => analytics,
        None => {
            log::warn!("No comments to summarize for {}. Using mock analytics.", video_info.video_id);
            source.mock_analytics()
        }
    };
    VideoReport {
        video_info,
        analytics,
        recent_comments: comments.into_iter().take(RECENT).collect(),
    }
}

/// Human readable lines for the log.
pub fn render(report: &VideoReport) -> Vec<String> {
    let video = &report.video_info;
    let analytics = &report.analytics;
    let mut lines = vec![
        format!("Title: {}", video.title),
        format!("Channel: {}", video.channel_name),
        format!(
            "Views: {} Likes: {} Comments: {}",
            video.view_count, video.like_count, video.comment_count
        ),
        format!("Total comments analyzed: {}", analytics.total_comments),
        format!("Average sentiment: {:.3}", analytics.avg_sentiment),
        format!(
            "Positive: {:.1}% Negative: {:.1}% Neutral: {:.1}%",
            analytics.positive_percentage, analytics.negative_percentage, analytics.neutral_percentage
        ),
        format!("Engagement score: {:.1}", analytics.engagement_score),
    ];

    let keywords: Vec<String> = analytics
        .top_words
        .iter()
        .take(10)
        .map(|w| format!("{} ({})", w.0, w.1))
        .collect();
    lines.push(format!("Top keywords: {}", keywords.join(", ")));

    for (i, c) in report.recent_comments.iter().take(SAMPLE).enumerate() {
        lines.push(format!(
            "{}. @{} \"{}\" {} ({:.2}) likes {}",
            i + 1,
            c.author,
            truncate(&c.text, 80),
            c.sentiment_label.as_str().to_uppercase(),
            c.sentiment_score,
            c.likes
        ));
    }
    lines
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
