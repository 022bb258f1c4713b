//! # Core Ingestion Engine
//!
//! Everything between a decoded frame and the snapshot a view reads.
//!
//! ## Contained Modules:
//! - **`bounded`**: fixed-capacity deque with head/tail eviction.
//! - **`classifier`**: maps a message to exactly one state slice.
//! - **`store`**: the four state slices and the read-only [`Snapshot`].
//! - **`reconnect`**: pure reconnect/backoff state machine.
//! - **`reactor`**: single-writer event handling and source switching.
//! - **`facade`**: the public entry point, [`IngestionFacade`].

pub mod bounded;
pub mod classifier;
pub mod facade;
pub mod reactor;
pub mod reconnect;
pub mod store;

// --- Public API Re-exports ---
pub use bounded::BoundedBuffer;
pub use classifier::{classify, Route};
pub use facade::IngestionFacade;
pub use reactor::{Directive, IngestCore, IngestStatus, SourceEvent, SourceMode};
pub use reconnect::{BackoffPolicy, CloseOutcome, ConnectionState, ReconnectMachine};
pub use store::{Snapshot, StateStore};
