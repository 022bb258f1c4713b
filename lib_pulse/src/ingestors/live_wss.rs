//! # Live WSS Ingestor
//!
//! Reconnecting WebSocket client for the live comment feed.
//!
//! The manager owns the connection lifecycle: it opens the transport, forwards every decoded
//! frame to the reactor in arrival order, and on close either schedules a retry (linear
//! backoff) or, at the ceiling, reports `Exhausted` and stops for good. All transitions go
//! through [`ReconnectMachine`]; the run loop only performs the side effects.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::transport::{Frame, FrameStream, Transport};
use crate::core::reconnect::{BackoffPolicy, CloseOutcome, ConnectionState, ReconnectMachine};
use crate::core::SourceEvent;
use crate::error::IngestError;
use crate::models::Envelope;

pub struct ConnectionManager {
    endpoint: Url,
    transport: Arc<dyn Transport>,
    policy: BackoffPolicy,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Validates the endpoint and builds an idle manager.
    ///
    /// Fails synchronously with [`IngestError::TransportConstruction`] when the transport
    /// rejects the endpoint.
    pub fn new(
        endpoint: &str,
        policy: BackoffPolicy,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, IngestError> {
        let endpoint = transport.prepare(endpoint)?;
        let (state_tx, _) = watch::channel(ConnectionState::Connecting);
        Ok(Self {
            endpoint,
            transport,
            policy,
            state_tx,
            cancel: CancellationToken::new(),
            handle: None,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Spawns the connection loop. Decoded messages and state changes go to `sink`.
    ///
    /// Calling it again, or after [`stop`](Self::stop), does nothing.
    pub fn start(&mut self, sink: mpsc::Sender<SourceEvent>) {
        if self.handle.is_some() || self.cancel.is_cancelled() {
            return;
        }
        let worker = Worker {
            endpoint: self.endpoint.clone(),
            transport: Arc::clone(&self.transport),
            machine: ReconnectMachine::new(self.policy),
            sink,
            state_tx: self.state_tx.clone(),
            cancel: self.cancel.clone(),
        };
        self.handle = Some(tokio::spawn(worker.run()));
    }

    /// Releases the transport and cancels any pending reconnect timer. Idempotent.
    pub fn stop(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        log::info!("Stopping feed connection to {}", self.endpoint);
        self.cancel.cancel();
    }

    /// Waits for the connection loop to finish.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                log::error!("Feed connection task failed: {}", e);
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum Flow {
    Reconnect,
    Stop,
}

struct Worker {
    endpoint: Url,
    transport: Arc<dyn Transport>,
    machine: ReconnectMachine,
    sink: mpsc::Sender<SourceEvent>,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(mut self) {
        let max_attempts = self.machine.policy().max_attempts();
        if !self.publish().await {
            return self.finish();
        }

        loop {
            log::info!("Connecting to comment feed: {}", self.endpoint);

            let opened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                opened = self.transport.open(&self.endpoint) => opened,
            };

            match opened {
                Ok(frames) => {
                    self.machine.on_open();
                    log::info!("Connected to comment feed.");
                    if !self.publish().await {
                        break;
                    }
                    if let Flow::Stop = self.pump(frames).await {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Failed to connect to {}: {}", self.endpoint, e);
                }
            }

            match self.machine.on_closed() {
                CloseOutcome::Retry { attempt, delay } => {
                    log::warn!(
                        "Feed connection lost. Reconnect attempt {}/{} in {:?}",
                        attempt,
                        max_attempts,
                        delay
                    );
                    if !self.publish().await {
                        break;
                    }
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    self.machine.on_retry_due();
                    if !self.publish().await {
                        break;
                    }
                }
                CloseOutcome::Exhausted => {
                    log::error!("{}", IngestError::ReconnectionExhausted(max_attempts));
                    self.publish().await;
                    return;
                }
                CloseOutcome::Ignored => return,
            }
        }

        self.finish();
    }

    fn finish(&mut self) {
        self.machine.on_stop();
        self.state_tx.send_replace(self.machine.state());
        log::info!("Feed connection loop stopped.");
    }

    /// Reads frames until the connection ends or the manager is stopped.
    async fn pump(&mut self, mut frames: FrameStream) -> Flow {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Flow::Stop,
                next = frames.next() => next,
            };

            match next {
                Some(Ok(frame)) => {
                    let decoded = match &frame {
                        Frame::Text(text) => {
                            log::trace!("Received text frame: {}", text);
                            Envelope::decode(text)
                        }
                        Frame::Binary(bytes) => {
                            log::trace!("Received binary frame: {} bytes", bytes.len());
                            Envelope::decode_bytes(bytes)
                        }
                    };
                    match decoded {
                        Ok(envelope) => {
                            if !self.forward(SourceEvent::Message(envelope)).await {
                                return Flow::Stop;
                            }
                        }
                        Err(e) => log::warn!("Dropping frame from {}: {}", self.endpoint, e),
                    }
                }
                Some(Err(e)) => {
                    log::error!("Feed read error: {}", e);
                    return Flow::Reconnect;
                }
                None => {
                    log::warn!("Feed stream closed by remote host.");
                    return Flow::Reconnect;
                }
            }
        }
    }

    /// Publishes the machine's state to watchers and the reactor. `false` once the reactor
    /// is gone or the manager is stopped.
    async fn publish(&self) -> bool {
        let state = self.machine.state();
        self.state_tx.send_replace(state);
        self.forward(SourceEvent::Connection(state)).await
    }

    /// Sends to the reactor unless stopped first. A full channel never outlives `stop()`.
    async fn forward(&self, event: SourceEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.sink.send(event) => sent.is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestors::transport::scripted::{ScriptedTransport, Step};
    use std::time::Duration;

    const BASE: Duration = Duration::from_millis(3000);

    fn manager(transport: Arc<ScriptedTransport>, max: u32) -> ConnectionManager {
        ConnectionManager::new("ws://feed.test:8765", BackoffPolicy::new(BASE, max), transport)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn retries_with_linear_backoff_then_exhausts() {
        let transport = Arc::new(ScriptedTransport::refusing());
        let mut mgr = manager(Arc::clone(&transport), 5);
        let (tx, mut rx) = mpsc::channel(64);
        let started = tokio::time::Instant::now();
        mgr.start(tx);

        let mut delays = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                SourceEvent::Connection(ConnectionState::Reconnecting { delay, .. }) => {
                    delays.push(delay)
                }
                SourceEvent::Connection(ConnectionState::Exhausted) => break,
                _ => {}
            }
        }

        assert_eq!(delays, vec![Duration::ZERO, BASE, BASE * 2, BASE * 3, BASE * 4]);
        assert_eq!(transport.opens(), 6);
        assert_eq!(mgr.state(), ConnectionState::Exhausted);
        assert_eq!(started.elapsed(), BASE * 10);

        // exhausted: no further attempt
        tokio::time::sleep(BASE * 100).await;
        assert_eq!(transport.opens(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_frames_in_order_and_drops_malformed() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Hold(vec![
            Frame::Text(r#"{"type":"video_info","data":{"title":"A"}}"#.into()),
            Frame::Text("{broken".into()),
            Frame::Binary(br#"{"type":"ping"}"#.to_vec()),
        ])]));
        let mut mgr = manager(transport, 5);
        let (tx, mut rx) = mpsc::channel(64);
        mgr.start(tx);

        let mut kinds = Vec::new();
        while kinds.len() < 2 {
            if let Some(SourceEvent::Message(env)) = rx.recv().await {
                kinds.push(env.kind.unwrap_or_default());
            }
        }
        assert_eq!(kinds, vec!["video_info", "ping"]);
        assert_eq!(mgr.state(), ConnectionState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_open_resets_backoff() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Refuse,
            Step::Refuse,
            Step::Close(vec![]),
        ]));
        let mut mgr = manager(Arc::clone(&transport), 5);
        let (tx, mut rx) = mpsc::channel(64);
        mgr.start(tx);

        let mut delays = Vec::new();
        while delays.len() < 4 {
            if let Some(SourceEvent::Connection(ConnectionState::Reconnecting { delay, .. })) =
                rx.recv().await
            {
                delays.push(delay);
            }
        }
        // two failures, an open that closes (reset), then a fresh sequence
        assert_eq!(delays, vec![Duration::ZERO, BASE, Duration::ZERO, BASE]);
        mgr.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_cancels_pending_retry() {
        let transport = Arc::new(ScriptedTransport::refusing());
        let mut mgr = manager(Arc::clone(&transport), 5);
        let (tx, mut rx) = mpsc::channel(64);
        mgr.start(tx);

        // wait until the second retry (3s delay) is pending
        loop {
            if let Some(SourceEvent::Connection(ConnectionState::Reconnecting { attempt: 2, .. })) =
                rx.recv().await
            {
                break;
            }
        }
        mgr.stop();
        mgr.stop();
        mgr.join().await;

        let opens = transport.opens();
        tokio::time::sleep(BASE * 10).await;
        assert_eq!(transport.opens(), opens);
        assert_eq!(mgr.state(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_reaches_a_worker_blocked_on_a_full_sink() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Hold(vec![Frame::Text(
            r#"{"type":"ping"}"#.into(),
        )])]));
        let mut mgr = manager(transport, 5);
        // Room for `Connecting` only; nobody reads.
        let (tx, mut rx) = mpsc::channel(1);
        mgr.start(tx);
        tokio::time::sleep(Duration::from_millis(10)).await;

        mgr.stop();
        tokio::time::timeout(Duration::from_secs(60), mgr.join())
            .await
            .expect("join hung on a full sink");
        assert_eq!(mgr.state(), ConnectionState::Closed);

        let mut delivered = Vec::new();
        while let Some(event) = rx.recv().await {
            delivered.push(event);
        }
        assert_eq!(delivered, vec![SourceEvent::Connection(ConnectionState::Connecting)]);
    }

    #[test]
    fn bad_endpoint_fails_construction() {
        let res = ConnectionManager::new(
            "ftp://nowhere",
            BackoffPolicy::new(BASE, 5),
            Arc::new(ScriptedTransport::refusing()),
        );
        assert!(matches!(res, Err(IngestError::TransportConstruction { .. })));
    }
}
