use serde::Serialize;
use serde_json::{Map, Value};

use super::{AnalyticsSnapshot, Comment, VideoMetadata};
use crate::error::IngestError;

/// Discriminator values of the known message kinds.
pub mod kinds {
    pub const VIDEO_INFO: &str = "video_info";
    pub const NEW_COMMENTS: &str = "new_comments";
    pub const ANALYTICS_UPDATE: &str = "analytics_update";
}

/// A decoded inbound record: the `type` discriminator, the `data` payload and the whole
/// message as received.
///
/// This is the single internal representation shared by every producer. Frames from the
/// live socket and ticks of the synthetic generator both become an `Envelope` before they
/// reach the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub kind: Option<String>,
    pub data: Value,
    pub raw: Value,
}

impl Envelope {
    /// Decodes one UTF-8 JSON frame. Anything that is not a JSON object is a decode error.
    pub fn decode(text: &str) -> Result<Self, IngestError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| IngestError::Decode(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(Self::from_object(map)),
            other => Err(IngestError::Decode(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Decodes a binary frame, which must hold UTF-8 JSON.
    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, IngestError> {
        let text = std::str::from_utf8(bytes).map_err(|e| IngestError::Decode(e.to_string()))?;
        Self::decode(text)
    }

    /// Builds an envelope around an explicit discriminator and payload.
    pub fn new(kind: &str, data: Value) -> Self {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(kind.to_string()));
        map.insert("data".to_string(), data);
        Self::from_object(map)
    }

    fn from_object(map: Map<String, Value>) -> Self {
        let kind = map.get("type").and_then(Value::as_str).map(str::to_string);
        let data = map.get("data").cloned().unwrap_or(Value::Null);
        Self {
            kind,
            data,
            raw: Value::Object(map),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Typed outbound messages, as produced by the feed server and the synthetic generator.
///
/// Encodes to `{"type": "<kind>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FeedMessage {
    VideoInfo(VideoMetadata),
    NewComments(Vec<Comment>),
    AnalyticsUpdate(AnalyticsSnapshot),
}

impl FeedMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedMessage::VideoInfo(_) => kinds::VIDEO_INFO,
            FeedMessage::NewComments(_) => kinds::NEW_COMMENTS,
            FeedMessage::AnalyticsUpdate(_) => kinds::ANALYTICS_UPDATE,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Converts into the internal envelope, exactly as if the JSON had come off the wire.
    pub fn into_envelope(self) -> Envelope {
        let data = match &self {
            FeedMessage::VideoInfo(video) => serde_json::to_value(video),
            FeedMessage::NewComments(comments) => serde_json::to_value(comments),
            FeedMessage::AnalyticsUpdate(analytics) => serde_json::to_value(analytics),
        };
        let data = data.unwrap_or_else(|e| {
            log::error!("Failed to encode {} payload: {}", self.kind(), e);
            Value::Null
        });
        Envelope::new(self.kind(), data)
    }
}
