use serde::{Deserialize, Serialize};

/// Metadata of the monitored video.
///
/// Every field defaults when absent, so a sparse `video_info` such as
/// `{"title": "X", "view_count": 10}` still decodes. The value is always replaced whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_name: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// Upload instant as sent by the source.
    pub upload_date: String,
    /// ISO-8601 style duration, e.g. `PT12M45S`.
    pub duration: String,
    pub tags: Vec<String>,
}
