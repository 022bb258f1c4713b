//! # Data Ingestors Module
//!
//! The producers of the ingestion pipeline. Each submodule turns one source of data into
//! [`SourceEvent`](crate::core::SourceEvent)s on the reactor channel; none of them touches
//! the state store.
//!
//! ## Contained Modules:
//! - **`transport`**: the `Transport` strategy and its WebSocket implementation.
//! - **`live_wss`**: the connection manager, a reconnecting client for the live feed.
//! - **`synthetic`**: a self-scheduling generator that stands in for the live feed.

/// Transport strategy and the tokio-tungstenite implementation.
pub mod transport;
/// Reconnecting WebSocket client for the live comment feed.
pub mod live_wss;
/// Synthetic comment stream used as fallback.
pub mod synthetic;

// --- Public API Re-exports ---
pub use live_wss::ConnectionManager;
pub use synthetic::{SyntheticFeed, SyntheticGenerator};
pub use transport::{Frame, FrameStream, Transport, WsTransport};
