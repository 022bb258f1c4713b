use thiserror::Error;

/// Errors produced by the ingestion client and its helpers.
///
/// None of these are fatal to the process: every variant has a degraded-but-working
/// continuation (fallback to the synthetic stream, dropping a frame, reconnecting).
#[derive(Debug, Error)]
pub enum IngestError {
    /// The transport could not even be constructed (bad endpoint, unsupported scheme).
    #[error("cannot construct transport for '{endpoint}': {reason}")]
    TransportConstruction { endpoint: String, reason: String },

    /// A received frame was not a well-formed structured record.
    #[error("malformed frame: {0}")]
    Decode(String),

    /// The transport closed or failed while connecting or reading.
    #[error("transport closed: {0}")]
    TransportClosed(String),

    /// The reconnect ceiling was reached.
    #[error("reconnection exhausted after {0} attempts")]
    ReconnectionExhausted(u32),

    /// Configuration could not be loaded or is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A video URL did not contain a recognizable video id.
    #[error("could not extract video id from URL: {0}")]
    InvalidVideoUrl(String),

    /// A built-in text pattern failed to compile.
    #[cfg(feature = "analysis")]
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IngestError {
    #[cfg_attr(not(feature = "ingest"), allow(dead_code))]
    pub(crate) fn construction(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::TransportConstruction {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
