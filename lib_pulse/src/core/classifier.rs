use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::wire::kinds;
use crate::models::{AnalyticsSnapshot, Comment, Envelope, EventRecord, VideoMetadata};

/// Routing decision for one decoded message: the target slice and its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Replace the video metadata.
    VideoInfo(VideoMetadata),
    /// Prepend to the comment buffer, in this order.
    Comments(Vec<Comment>),
    /// Replace the analytics snapshot.
    Analytics(AnalyticsSnapshot),
    /// Append to the event log.
    Event(EventRecord),
}

impl Route {
    pub fn slice_name(&self) -> &'static str {
        match self {
            Route::VideoInfo(_) => "video_info",
            Route::Comments(_) => "comments",
            Route::Analytics(_) => "analytics",
            Route::Event(_) => "events",
        }
    }
}

/// Maps a decoded message to exactly one slice.
///
/// Total: a known discriminator whose `data` does not fit the typed shape goes to the event
/// log like any unknown kind, so nothing decodable is ever dropped.
pub fn classify(envelope: Envelope) -> Route {
    let typed = match envelope.kind.as_deref() {
        Some(kinds::VIDEO_INFO) => decode_payload::<VideoMetadata>(&envelope).map(Route::VideoInfo),
        Some(kinds::NEW_COMMENTS) => decode_payload::<Vec<Comment>>(&envelope)
            .map(|comments| Route::Comments(comments.into_iter().map(Comment::normalized).collect())),
        Some(kinds::ANALYTICS_UPDATE) => decode_payload::<AnalyticsSnapshot>(&envelope)
            .map(|analytics| Route::Analytics(analytics.normalized())),
        _ => None,
    };

    typed.unwrap_or_else(|| Route::Event(EventRecord::stamp(envelope.kind, envelope.raw)))
}

fn decode_payload<T: DeserializeOwned>(envelope: &Envelope) -> Option<T> {
    // `data` may be absent for sparse messages; treat it like an empty object.
    let data = match &envelope.data {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    match serde_json::from_value(data) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::warn!(
                "Payload of '{}' does not match its schema ({}); keeping it as a generic event.",
                envelope.kind.as_deref().unwrap_or_default(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(value: Value) -> Envelope {
        Envelope::decode(&value.to_string()).unwrap()
    }

    #[test]
    fn video_info_routes_to_metadata() {
        let route = classify(env(json!({"type": "video_info", "data": {"title": "X", "view_count": 10}})));
        match route {
            Route::VideoInfo(video) => {
                assert_eq!(video.title, "X");
                assert_eq!(video.view_count, 10);
            }
            other => panic!("unexpected route {other:?}"),
        }
    }

    #[test]
    fn new_comments_preserve_payload_order() {
        let route = classify(env(json!({"type": "new_comments", "data": [
            {"comment_id": "a"}, {"comment_id": "b"}
        ]})));
        match route {
            Route::Comments(comments) => {
                let ids: Vec<_> = comments.iter().map(|c| c.comment_id.as_str()).collect();
                assert_eq!(ids, vec!["a", "b"]);
            }
            other => panic!("unexpected route {other:?}"),
        }
    }

    #[test]
    fn analytics_update_routes_to_snapshot() {
        let route = classify(env(json!({"type": "analytics_update", "data": {"total_comments": 12}})));
        assert!(matches!(route, Route::Analytics(a) if a.total_comments == 12));
    }

    #[test]
    fn unknown_kind_is_stamped_event() {
        let route = classify(env(json!({"type": "heartbeat", "data": {"n": 1}})));
        match route {
            Route::Event(record) => {
                assert_eq!(record.kind.as_deref(), Some("heartbeat"));
                assert_eq!(record.payload["data"]["n"], 1);
            }
            other => panic!("unexpected route {other:?}"),
        }
    }

    #[test]
    fn missing_type_is_event() {
        let route = classify(env(json!({"hello": "world"})));
        assert!(matches!(route, Route::Event(r) if r.kind.is_none()));
    }

    #[test]
    fn malformed_known_payload_falls_back_to_event() {
        let route = classify(env(json!({"type": "new_comments", "data": {"not": "a list"}})));
        assert_eq!(route.slice_name(), "events");

        let route = classify(env(json!({"type": "video_info", "data": {"view_count": "many"}})));
        assert_eq!(route.slice_name(), "events");
    }

    #[test]
    fn event_ids_are_local_and_unique() {
        let a = classify(env(json!({"type": "x", "id": "wire-id"})));
        let b = classify(env(json!({"type": "x", "id": "wire-id"})));
        match (a, b) {
            (Route::Event(a), Route::Event(b)) => assert_ne!(a.id, b.id),
            _ => panic!("expected events"),
        }
    }
}
