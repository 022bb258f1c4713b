//! # Ingestion Reactor
//!
//! The single writer of the ingestion pipeline. Every producer (the live connection manager
//! and the synthetic feed) turns its output into a [`SourceEvent`]; the reactor task applies
//! those events to an [`IngestCore`] one at a time, in channel order. Nothing else ever holds
//! a mutable reference to the state store, so the buffer bounds hold without locks.

use serde::Serialize;

use super::classifier::classify;
use super::reconnect::ConnectionState;
use super::store::{Snapshot, StateStore};
use crate::configs::IngestConfig;
use crate::ingestors::SyntheticGenerator;
use crate::models::Envelope;

/// The common currency of all producers.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// The live connection changed state.
    Connection(ConnectionState),
    /// A decoded message, live or synthetic.
    Message(Envelope),
}

/// Which producer currently feeds the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    Live,
    Synthetic,
}

/// Operational view of the facade, next to the data [`Snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStatus {
    pub connection: ConnectionState,
    pub mode: SourceMode,
    /// How many times the synthetic stream was activated. Never more than one.
    pub generator_activations: u32,
}

/// Work the reactor task must perform after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Spawn the recurring synthetic feed.
    StartGenerator,
}

/// Pure state of the reactor: store, connection view and source mode.
#[derive(Debug, Clone)]
pub struct IngestCore {
    store: StateStore,
    connection: ConnectionState,
    mode: SourceMode,
    activations: u32,
}

impl IngestCore {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            store: StateStore::new(config.comment_buffer_capacity, config.event_log_capacity),
            connection: ConnectionState::Connecting,
            mode: SourceMode::Live,
            activations: 0,
        }
    }

    /// Applies one producer event.
    pub fn handle(&mut self, event: SourceEvent) -> Option<Directive> {
        match event {
            SourceEvent::Connection(state) => {
                self.connection = state;
                if state == ConnectionState::Exhausted && self.activate_synthetic() {
                    return Some(Directive::StartGenerator);
                }
                None
            }
            SourceEvent::Message(envelope) => {
                let route = classify(envelope);
                log::trace!("Routing message to {}", route.slice_name());
                self.store.apply(route);
                None
            }
        }
    }

    /// Switches to the synthetic source and applies the seed set, in this same turn.
    ///
    /// Only the first call has an effect and returns `true`; there is no way back to live.
    pub fn activate_synthetic(&mut self) -> bool {
        if self.mode == SourceMode::Synthetic {
            return false;
        }
        self.mode = SourceMode::Synthetic;
        self.activations += 1;
        log::warn!("Live feed unavailable, switching to the synthetic comment stream.");

        for message in SyntheticGenerator::seed_messages() {
            self.store.apply(classify(message.into_envelope()));
        }
        true
    }

    /// Open transport, or synthetic stream active.
    pub fn connected(&self) -> bool {
        self.connection.is_open() || self.mode == SourceMode::Synthetic
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot(self.connected())
    }

    pub fn status(&self) -> IngestStatus {
        IngestStatus {
            connection: self.connection,
            mode: self.mode,
            generator_activations: self.activations,
        }
    }
}
