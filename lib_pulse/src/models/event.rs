use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// A message of a kind the client does not model, kept verbatim in the event log.
///
/// `id` and `received_at` are assigned locally when the message is classified; nothing on
/// the wire is trusted for either.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub id: Uuid,
    #[serde(rename = "timestamp")]
    pub received_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "message")]
    pub payload: Value,
}

impl EventRecord {
    /// Stamps `payload` with a fresh id and the current time.
    pub fn stamp(kind: Option<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            kind,
            payload,
        }
    }
}
