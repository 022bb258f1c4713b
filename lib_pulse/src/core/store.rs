use serde::Serialize;

use super::bounded::BoundedBuffer;
use super::classifier::Route;
use crate::models::{AnalyticsSnapshot, Comment, EventRecord, VideoMetadata};

/// Read-only aggregate handed to views.
///
/// Serializes to `{connected, videoInfo, comments, analytics, events}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub connected: bool,
    pub video_info: Option<VideoMetadata>,
    /// Newest first.
    pub comments: Vec<Comment>,
    pub analytics: Option<AnalyticsSnapshot>,
    /// Oldest first.
    pub events: Vec<EventRecord>,
}

/// Owner of the four state slices.
///
/// Every mutation is a whole-value replacement or a bounded insert, applied through
/// [`apply`](Self::apply). Only the reactor holds a `StateStore`; views see [`Snapshot`]s.
#[derive(Debug, Clone)]
pub struct StateStore {
    video: Option<VideoMetadata>,
    comments: BoundedBuffer<Comment>,
    analytics: Option<AnalyticsSnapshot>,
    events: BoundedBuffer<EventRecord>,
}

impl StateStore {
    pub fn new(comment_capacity: usize, event_capacity: usize) -> Self {
        Self {
            video: None,
            comments: BoundedBuffer::new(comment_capacity),
            analytics: None,
            events: BoundedBuffer::new(event_capacity),
        }
    }

    /// Applies one routing decision.
    pub fn apply(&mut self, route: Route) {
        match route {
            Route::VideoInfo(video) => self.video = Some(video),
            Route::Comments(batch) => {
                let evicted = self.comments.prepend_batch(batch);
                if evicted > 0 {
                    log::trace!("Comment buffer full, evicted {} oldest", evicted);
                }
            }
            Route::Analytics(analytics) => self.analytics = Some(analytics),
            Route::Event(record) => {
                self.events.push_back(record);
            }
        }
    }

    pub fn video(&self) -> Option<&VideoMetadata> {
        self.video.as_ref()
    }

    pub fn analytics(&self) -> Option<&AnalyticsSnapshot> {
        self.analytics.as_ref()
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn events(&self) -> impl Iterator<Item = &EventRecord> {
        self.events.iter()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn snapshot(&self, connected: bool) -> Snapshot {
        Snapshot {
            connected,
            video_info: self.video.clone(),
            comments: self.comments.to_vec(),
            analytics: self.analytics.clone(),
            events: self.events.to_vec(),
        }
    }
}
