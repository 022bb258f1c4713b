//! # Ingestion Facade
//!
//! The one entry point views use. `connect()` tries the live feed first and falls back to
//! the synthetic stream exactly once: immediately when the transport cannot even be built,
//! or later when the connection manager reports `Exhausted`. Either way the data flows
//! through the same reactor, so the published [`Snapshot`] looks the same.
//!
//! Views read the latest snapshot with [`IngestionFacade::snapshot`] or follow changes with
//! [`IngestionFacade::subscribe`]; they can never mutate it.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::reactor::{Directive, IngestCore, IngestStatus, SourceEvent, SourceMode};
use super::reconnect::{BackoffPolicy, ConnectionState};
use super::store::Snapshot;
use crate::configs::IngestConfig;
use crate::error::IngestError;
use crate::ingestors::{ConnectionManager, SyntheticFeed, SyntheticGenerator, Transport, WsTransport};

/// Watch channels owned by the reactor once `connect()` ran.
struct Publishers {
    snapshot: watch::Sender<Snapshot>,
    status: watch::Sender<IngestStatus>,
}

pub struct IngestionFacade {
    config: IngestConfig,
    transport: Arc<dyn Transport>,
    publishers: Option<Publishers>,
    snapshot_rx: watch::Receiver<Snapshot>,
    status_rx: watch::Receiver<IngestStatus>,
    cancel: CancellationToken,
    reactor: Option<JoinHandle<()>>,
}

impl IngestionFacade {
    /// Facade over the WebSocket transport.
    pub fn new(config: IngestConfig) -> Result<Self, IngestError> {
        Self::with_transport(config, Arc::new(WsTransport))
    }

    /// Facade over a caller-provided transport.
    pub fn with_transport(
        config: IngestConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, IngestError> {
        config.validate()?;
        let core = IngestCore::new(&config);
        let (snapshot, snapshot_rx) = watch::channel(core.snapshot());
        let (status, status_rx) = watch::channel(core.status());
        Ok(Self {
            config,
            transport,
            publishers: Some(Publishers { snapshot, status }),
            snapshot_rx,
            status_rx,
            cancel: CancellationToken::new(),
            reactor: None,
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Starts ingestion and returns the source it started with.
    ///
    /// Must be called inside a tokio runtime. A transport construction failure is not an
    /// error: the synthetic seed is visible in [`snapshot`](Self::snapshot) as soon as this
    /// returns. Later calls only report the current mode.
    pub fn connect(&mut self) -> SourceMode {
        let Some(publishers) = self.publishers.take() else {
            return self.status().mode;
        };
        if self.cancel.is_cancelled() {
            log::warn!("connect() called after shutdown; ignoring.");
            return self.status().mode;
        }

        let mut core = IngestCore::new(&self.config);
        let (sink, events) = mpsc::channel(self.config.channel_capacity);

        let manager = match ConnectionManager::new(
            &self.config.endpoint,
            BackoffPolicy::from_config(&self.config),
            Arc::clone(&self.transport),
        ) {
            Ok(mut manager) => {
                manager.start(sink.clone());
                Some(manager)
            }
            Err(e) => {
                log::error!("{}", e);
                core.activate_synthetic();
                None
            }
        };

        let mut reactor = Reactor {
            core,
            events,
            sink,
            manager,
            generator: None,
            config: self.config.clone(),
            publishers,
            cancel: self.cancel.child_token(),
        };
        if reactor.core.mode() == SourceMode::Synthetic {
            reactor.start_generator();
        }
        reactor.publish();

        let mode = reactor.core.mode();
        self.reactor = Some(tokio::spawn(reactor.run()));
        mode
    }

    /// Latest published aggregate.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    pub fn status(&self) -> IngestStatus {
        *self.status_rx.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<IngestStatus> {
        self.status_rx.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.snapshot_rx.borrow().connected
    }

    /// Stops every producer and waits for them. After this returns nothing mutates the
    /// snapshot any more. Idempotent.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.reactor.take() {
            if let Err(e) = handle.await {
                log::error!("Ingestion reactor failed: {}", e);
            }
            log::info!("Ingestion stopped.");
        }
    }
}

impl Drop for IngestionFacade {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The task that owns the core and all producer handles.
struct Reactor {
    core: IngestCore,
    events: mpsc::Receiver<SourceEvent>,
    /// Kept to hand to the synthetic feed when it starts.
    sink: mpsc::Sender<SourceEvent>,
    manager: Option<ConnectionManager>,
    generator: Option<(CancellationToken, JoinHandle<()>)>,
    config: IngestConfig,
    publishers: Publishers,
    cancel: CancellationToken,
}

impl Reactor {
    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if let SourceEvent::Connection(state) = &event {
                log::debug!("Connection state: {:?}", state);
            }
            if let Some(Directive::StartGenerator) = self.core.handle(event) {
                self.start_generator();
            }
            self.publish();
        }

        self.teardown().await;
    }

    fn start_generator(&mut self) {
        if self.generator.is_some() {
            return;
        }
        let token = self.cancel.child_token();
        let feed = SyntheticFeed::new(
            SyntheticGenerator::new(self.config.generator_seed),
            self.config.generator_interval(),
            self.sink.clone(),
            token.clone(),
        );
        self.generator = Some((token, tokio::spawn(feed.run())));
    }

    fn publish(&self) {
        self.publishers.snapshot.send_replace(self.core.snapshot());
        self.publishers.status.send_replace(self.core.status());
    }

    async fn teardown(&mut self) {
        // Producers blocked on a full channel fail fast instead of waiting for us.
        self.events.close();

        if let Some(mut manager) = self.manager.take() {
            manager.stop();
            manager.join().await;
        }
        if let Some((token, handle)) = self.generator.take() {
            token.cancel();
            if let Err(e) = handle.await {
                log::error!("Synthetic feed task failed: {}", e);
            }
        }

        if self.core.status().connection != ConnectionState::Exhausted {
            self.core.handle(SourceEvent::Connection(ConnectionState::Closed));
        }
        self.publish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestors::transport::scripted::{ScriptedTransport, Step};
    use crate::ingestors::Frame;
    use std::time::Duration;

    fn config() -> IngestConfig {
        IngestConfig {
            generator_seed: Some(42),
            ..IngestConfig::with_endpoint("ws://feed.test:8765")
        }
    }

    #[tokio::test]
    async fn construction_failure_seeds_immediately() {
        let mut facade = IngestionFacade::new(IngestConfig::with_endpoint("not a url")).unwrap();
        assert!(!facade.is_connected());

        assert_eq!(facade.connect(), SourceMode::Synthetic);

        let snapshot = facade.snapshot();
        assert!(snapshot.connected);
        assert!(snapshot.video_info.is_some());
        assert!(snapshot.analytics.is_some());
        assert_eq!(snapshot.comments.len(), 5);
        assert_eq!(facade.status().generator_activations, 1);
        facade.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn six_refusals_exhaust_and_activate_generator_once() {
        let transport = Arc::new(ScriptedTransport::refusing());
        let mut facade =
            IngestionFacade::with_transport(config(), Arc::clone(&transport) as Arc<dyn Transport>)
                .unwrap();
        assert_eq!(facade.connect(), SourceMode::Live);

        let mut status = facade.watch_status();
        status
            .wait_for(|s| s.mode == SourceMode::Synthetic)
            .await
            .unwrap();

        let status = facade.status();
        assert_eq!(status.connection, ConnectionState::Exhausted);
        assert_eq!(status.generator_activations, 1);
        assert_eq!(transport.opens(), 6);
        assert!(facade.is_connected());
        assert_eq!(facade.snapshot().comments.len(), 5);

        // no oscillation back to live
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(transport.opens(), 6);
        assert_eq!(facade.status().generator_activations, 1);
        facade.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn live_frames_reach_the_snapshot() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Hold(vec![
            Frame::Text(r#"{"type":"video_info","data":{"title":"Live","view_count":10}}"#.into()),
            Frame::Text(r#"{"type":"new_comments","data":[{"comment_id":"c1","text":"hi"}]}"#.into()),
            Frame::Text(r#"{"type":"status","data":{"ok":true}}"#.into()),
        ])]));
        let mut facade = IngestionFacade::with_transport(config(), transport).unwrap();
        facade.connect();

        let mut snapshots = facade.subscribe();
        snapshots.wait_for(|s| s.events.len() == 1).await.unwrap();

        let snapshot = facade.snapshot();
        assert!(snapshot.connected);
        assert_eq!(snapshot.video_info.unwrap().title, "Live");
        assert_eq!(snapshot.comments[0].comment_id, "c1");
        assert_eq!(facade.status().mode, SourceMode::Live);
        facade.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn generator_stops_ticking_after_shutdown() {
        let mut facade = IngestionFacade::new(IngestConfig {
            generator_interval_ms: 1000,
            ..IngestConfig::with_endpoint("bogus")
        })
        .unwrap();
        facade.connect();

        let mut snapshots = facade.subscribe();
        snapshots.wait_for(|s| s.comments.len() == 7).await.unwrap();
        assert_eq!(facade.snapshot().comments[0].comment_id, "synthetic_2");

        facade.shutdown().await;
        facade.shutdown().await;
        let frozen = facade.snapshot().comments.len();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(facade.snapshot().comments.len(), frozen);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let res = IngestionFacade::new(IngestConfig {
            comment_buffer_capacity: 0,
            ..IngestConfig::default()
        });
        assert!(matches!(res, Err(IngestError::Config(_))));
    }

    #[tokio::test]
    async fn connect_twice_reports_current_mode() {
        let mut facade = IngestionFacade::new(IngestConfig::with_endpoint("bogus")).unwrap();
        assert_eq!(facade.connect(), SourceMode::Synthetic);
        assert_eq!(facade.connect(), SourceMode::Synthetic);
        assert_eq!(facade.status().generator_activations, 1);
        facade.shutdown().await;
    }
}
