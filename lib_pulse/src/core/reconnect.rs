//! # Reconnect State Machine
//!
//! Pure transition logic of the live connection. The connection manager drives it from its
//! run loop and acts on the returned decisions (schedule a retry, give up); nothing here
//! touches a socket or a timer, which keeps every transition unit-testable.

use std::time::Duration;

use serde::Serialize;

use crate::configs::IngestConfig;

/// Lifecycle of the live transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// An open attempt is in flight.
    Connecting,
    /// Frames are flowing.
    Open,
    /// Stopped on request.
    Closed,
    /// Waiting `delay` before retry number `attempt`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Ceiling reached; no more automatic retries.
    Exhausted,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Exhausted)
    }
}

/// Linear backoff with an attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max_attempts: u32,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self { base, max_attempts }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.base_backoff(), config.max_reconnect_attempts)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the retry scheduled when `attempts` retries have already happened.
    ///
    /// The counter is read before it is incremented, so the first retry waits zero.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        self.base.saturating_mul(attempts)
    }
}

/// What the owner of the machine must do after a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Sleep `delay`, then call [`ReconnectMachine::on_retry_due`] and reconnect.
    Retry { attempt: u32, delay: Duration },
    /// Give up; the ceiling is reached.
    Exhausted,
    /// Stale close (already closed, reconnecting or exhausted); nothing to do.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ReconnectMachine {
    state: ConnectionState,
    attempts: u32,
    policy: BackoffPolicy,
}

impl ReconnectMachine {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            state: ConnectionState::Connecting,
            attempts: 0,
            policy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn policy(&self) -> BackoffPolicy {
        self.policy
    }

    /// Retries scheduled since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Connecting → Open. Resets the attempt counter.
    pub fn on_open(&mut self) -> bool {
        if self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Open;
        self.attempts = 0;
        true
    }

    /// Open (or a failed Connecting) → Reconnecting / Exhausted.
    pub fn on_closed(&mut self) -> CloseOutcome {
        if !matches!(self.state, ConnectionState::Open | ConnectionState::Connecting) {
            return CloseOutcome::Ignored;
        }
        if self.attempts >= self.policy.max_attempts {
            self.state = ConnectionState::Exhausted;
            return CloseOutcome::Exhausted;
        }
        let delay = self.policy.delay_for(self.attempts);
        self.attempts += 1;
        self.state = ConnectionState::Reconnecting {
            attempt: self.attempts,
            delay,
        };
        CloseOutcome::Retry {
            attempt: self.attempts,
            delay,
        }
    }

    /// Reconnecting → Connecting, once the retry timer fired.
    pub fn on_retry_due(&mut self) -> bool {
        if !matches!(self.state, ConnectionState::Reconnecting { .. }) {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// Any live state → Closed. Exhausted stays Exhausted.
    pub fn on_stop(&mut self) {
        if self.state != ConnectionState::Exhausted {
            self.state = ConnectionState::Closed;
        }
    }
}
