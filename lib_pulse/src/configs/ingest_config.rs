use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Default upstream feed address.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";

/// Configuration of one ingestion facade.
///
/// Serialized in camelCase, every field optional in the source document:
///
/// ```json
/// { "endpoint": "ws://feed:8765", "maxReconnectAttempts": 5, "baseBackoffMs": 3000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngestConfig {
    /// WebSocket address of the live feed.
    pub endpoint: String,
    /// Reconnect ceiling; reaching it switches to the synthetic stream.
    pub max_reconnect_attempts: u32,
    /// Backoff unit; retry `n` waits `n * base_backoff_ms` (the first retry waits zero).
    pub base_backoff_ms: u64,
    pub comment_buffer_capacity: usize,
    pub event_log_capacity: usize,
    /// Period of the synthetic comment generator.
    pub generator_interval_ms: u64,
    /// Fixed RNG seed for the synthetic generator; random when unset.
    pub generator_seed: Option<u64>,
    /// Depth of the producer → reactor channel.
    pub channel_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_reconnect_attempts: 5,
            base_backoff_ms: 3000,
            comment_buffer_capacity: 100,
            event_log_capacity: 20,
            generator_interval_ms: 5000,
            generator_seed: None,
            channel_capacity: 256,
        }
    }
}

impl IngestConfig {
    /// Config with defaults and the given endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    /// Generator period, never shorter than one millisecond.
    pub fn generator_interval(&self) -> Duration {
        Duration::from_millis(self.generator_interval_ms.max(1))
    }

    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, IngestError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| IngestError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, IngestError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Rejects values that would break the buffers or timers.
    ///
    /// The endpoint is deliberately not checked here: a bad endpoint is a transport
    /// construction failure and sends the facade to the synthetic stream.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.comment_buffer_capacity == 0 {
            return Err(IngestError::Config("commentBufferCapacity must be > 0".into()));
        }
        if self.event_log_capacity == 0 {
            return Err(IngestError::Config("eventLogCapacity must be > 0".into()));
        }
        if self.generator_interval_ms == 0 {
            return Err(IngestError::Config("generatorIntervalMs must be > 0".into()));
        }
        if self.channel_capacity == 0 {
            return Err(IngestError::Config("channelCapacity must be > 0".into()));
        }
        Ok(())
    }
}
