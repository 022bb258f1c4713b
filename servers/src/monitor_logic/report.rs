use lib_pulse::{IngestStatus, Snapshot, SourceMode};
use std::time::Duration;
use tokio::time::Instant;

/// One-line summary of the current view.
pub fn summarize(snapshot: &Snapshot, status: &IngestStatus) -> String {
    let mode = match status.mode {
        SourceMode::Live => "live",
        SourceMode::Synthetic => "synthetic",
    };
    let title = snapshot
        .video_info
        .as_ref()
        .map(|v| v.title.as_str())
        .unwrap_or("-");
    let newest = snapshot
        .comments
        .first()
        .map(|c| format!("{}: {}", c.author, truncate(&c.text, 48)))
        .unwrap_or_else(|| "-".to_string());
    let analytics = snapshot
        .analytics
        .as_ref()
        .map(|a| {
            format!(
                "avg {:+.2} pos {:.1}% neg {:.1}%",
                a.avg_sentiment, a.positive_percentage, a.negative_percentage
            )
        })
        .unwrap_or_else(|| "-".to_string());

    format!(
        "connected={} source={} connection={:?} video=\"{}\" comments={} events={} analytics=[{}] newest=\"{}\"",
        snapshot.connected,
        mode,
        status.connection,
        title,
        snapshot.comments.len(),
        snapshot.events.len(),
        analytics,
        newest
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Lets at most one report through per interval.
#[derive(Debug)]
pub struct ReportThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ReportThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_pulse::{Comment, ConnectionState, VideoMetadata};

    #[test]
    fn summary_mentions_source_and_counts() {
        let snapshot = Snapshot {
            connected: true,
            video_info: Some(VideoMetadata {
                title: "Demo".into(),
                ..Default::default()
            }),
            comments: vec![Comment {
                comment_id: "1".into(),
                author: "Viewer1".into(),
                text: "hello".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let status = IngestStatus {
            connection: ConnectionState::Exhausted,
            mode: SourceMode::Synthetic,
            generator_activations: 1,
        };
        let line = summarize(&snapshot, &status);
        assert!(line.contains("connected=true"));
        assert!(line.contains("source=synthetic"));
        assert!(line.contains("video=\"Demo\""));
        assert!(line.contains("comments=1"));
        assert!(line.contains("newest=\"Viewer1: hello\""));
        assert!(line.contains("analytics=[-]"));
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        assert_eq!(truncate("héllo wörld", 4), "héll…");
        assert_eq!(truncate("short", 10), "short");
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_allows_one_per_interval() {
        let mut throttle = ReportThrottle::new(Duration::from_secs(10));
        let start = Instant::now();
        assert!(throttle.ready(start));
        assert!(!throttle.ready(start + Duration::from_secs(5)));
        assert!(throttle.ready(start + Duration::from_secs(10)));
    }
}
