use lib_pulse::{AnalyticsSnapshot, Comment, FeedMessage, VideoMetadata};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock, broadcast};

/// Shared state of the feed server: the latest video/analytics for late joiners, the comment
/// history analytics are computed from, and the broadcast channel to connected clients.
#[derive(Clone)]
pub struct FeedState {
    video: Arc<RwLock<Option<VideoMetadata>>>,
    analytics: Arc<RwLock<Option<AnalyticsSnapshot>>>,
    // Newest first.
    history: Arc<Mutex<VecDeque<Comment>>>,
    history_capacity: usize,
    clients: Arc<AtomicUsize>,
    // Encoded JSON frames, shared by every client task.
    pub data_tx: broadcast::Sender<Arc<str>>,
}

impl FeedState {
    pub fn new(history_capacity: usize) -> Self {
        let (data_tx, _) = broadcast::channel(256);
        Self {
            video: Arc::new(RwLock::new(None)),
            analytics: Arc::new(RwLock::new(None)),
            history: Arc::new(Mutex::new(VecDeque::new())),
            history_capacity: history_capacity.max(1),
            clients: Arc::new(AtomicUsize::new(0)),
            data_tx,
        }
    }

    /// Remembers video/analytics messages for late joiners and broadcasts the message.
    /// Returns the number of clients it reached.
    pub async fn publish(&self, message: FeedMessage) -> usize {
        let encoded = match message.to_json() {
            Ok(json) => Arc::<str>::from(json),
            Err(e) => {
                log::error!("Failed to encode {} message: {}", message.kind(), e);
                return 0;
            }
        };

        match message {
            FeedMessage::VideoInfo(video) => *self.video.write().await = Some(video),
            FeedMessage::AnalyticsUpdate(analytics) => *self.analytics.write().await = Some(analytics),
            FeedMessage::NewComments(_) => {}
        }

        // No receivers is not an error here; nobody is connected yet.
        self.data_tx.send(encoded).unwrap_or(0)
    }

    /// Messages a client receives right after connecting: the current video, then analytics.
    pub async fn welcome_messages(&self) -> Vec<FeedMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(video) = self.video.read().await.clone() {
            messages.push(FeedMessage::VideoInfo(video));
        }
        if let Some(analytics) = self.analytics.read().await.clone() {
            messages.push(FeedMessage::AnalyticsUpdate(analytics));
        }
        messages
    }

    /// Adds a batch (oldest first) to the history and returns the history, newest first.
    pub async fn record_comments(&self, batch: &[Comment]) -> Vec<Comment> {
        let mut history = self.history.lock().await;
        for comment in batch {
            history.push_front(comment.clone());
        }
        history.truncate(self.history_capacity);
        history.iter().cloned().collect()
    }

    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    pub fn add_client(&self) -> usize {
        self.clients.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn remove_client(&self) -> usize {
        self.clients.fetch_sub(1, Ordering::Relaxed).saturating_sub(1)
    }

    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str) -> Comment {
        Comment {
            comment_id: id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn late_joiners_get_latest_video_and_analytics() {
        let state = FeedState::new(10);
        assert!(state.welcome_messages().await.is_empty());

        state.publish(FeedMessage::VideoInfo(VideoMetadata { title: "A".into(), ..Default::default() })).await;
        state.publish(FeedMessage::VideoInfo(VideoMetadata { title: "B".into(), ..Default::default() })).await;
        state.publish(FeedMessage::AnalyticsUpdate(AnalyticsSnapshot::default())).await;
        state.publish(FeedMessage::NewComments(vec![comment("c1")])).await;

        let welcome = state.welcome_messages().await;
        assert_eq!(welcome.len(), 2);
        match &welcome[0] {
            FeedMessage::VideoInfo(video) => assert_eq!(video.title, "B"),
            other => panic!("unexpected {}", other.kind()),
        }
        assert_eq!(welcome[1].kind(), "analytics_update");
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let state = FeedState::new(10);
        let mut rx = state.data_tx.subscribe();
        assert_eq!(state.publish(FeedMessage::NewComments(vec![comment("c1")])).await, 1);
        let frame = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "new_comments");
        assert_eq!(value["data"][0]["comment_id"], "c1");
    }

    #[tokio::test]
    async fn history_is_bounded_newest_first() {
        let state = FeedState::new(3);
        state.record_comments(&[comment("1"), comment("2")]).await;
        let history = state.record_comments(&[comment("3"), comment("4")]).await;
        let ids: Vec<_> = history.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["4", "3", "2"]);
        assert_eq!(state.history_len().await, 3);
    }

    #[test]
    fn client_counter() {
        let state = FeedState::new(1);
        assert_eq!(state.add_client(), 1);
        assert_eq!(state.add_client(), 2);
        assert_eq!(state.remove_client(), 1);
        assert_eq!(state.client_count(), 1);
    }
}
