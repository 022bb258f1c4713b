//! # Test Harness
//!
//! An in-process WebSocket feed for integration tests. Every accepted client receives the
//! configured frames in order; what happens afterwards (hang up or stay) is up to the script.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;

/// What the mock feed does after sending its frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterFrames {
    /// Keep the connection open until the client goes away.
    Hold,
    /// Close the connection right away.
    Hangup,
}

pub struct MockFeed {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockFeed {
    /// Binds to an ephemeral localhost port and starts accepting.
    pub async fn start(frames: Vec<String>, after: AfterFrames) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        let frames = Arc::new(frames);

        let handle = tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let frames = Arc::clone(&frames);
                tokio::spawn(async move {
                    let mut ws = match accept_async(stream).await {
                        Ok(ws) => ws,
                        Err(e) => {
                            log::warn!("Handshake with {} failed: {}", peer, e);
                            return;
                        }
                    };
                    for frame in frames.iter() {
                        if ws.send(Message::Text(frame.as_str().into())).await.is_err() {
                            return;
                        }
                    }
                    match after {
                        AfterFrames::Hangup => {
                            let _ = ws.close(None).await;
                        }
                        AfterFrames::Hold => while let Some(Ok(_)) = ws.next().await {},
                    }
                });
            }
        });

        Ok(Self {
            addr,
            accepted,
            handle,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for MockFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A localhost address nobody listens on.
pub async fn closed_endpoint() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("ws://{}", addr))
}
