use futures_util::future::{self, BoxFuture};
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use crate::error::IngestError;

/// One payload-carrying frame from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Frames of one open connection. The stream ends when the peer closes; an `Err` item
/// means the connection broke.
pub type FrameStream = BoxStream<'static, Result<Frame, IngestError>>;

/// How the connection manager reaches the feed.
///
/// `prepare` runs synchronously at construction time; an error there is a transport
/// construction failure. `open` is attempted on every (re)connect.
pub trait Transport: Send + Sync + 'static {
    fn prepare(&self, endpoint: &str) -> Result<Url, IngestError>;

    fn open(&self, endpoint: &Url) -> BoxFuture<'static, Result<FrameStream, IngestError>>;
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    fn prepare(&self, endpoint: &str) -> Result<Url, IngestError> {
        let url = Url::parse(endpoint).map_err(|e| IngestError::construction(endpoint, e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(IngestError::construction(
                endpoint,
                format!("unsupported scheme '{other}', expected ws or wss"),
            )),
        }
    }

    fn open(&self, endpoint: &Url) -> BoxFuture<'static, Result<FrameStream, IngestError>> {
        let target = endpoint.to_string();
        async move {
            let (ws_stream, _response) = connect_async(target.as_str())
                .await
                .map_err(|e| IngestError::TransportClosed(e.to_string()))?;

            // Control frames are answered by tungstenite itself; only payloads go upstream.
            let frames = ws_stream
                .filter_map(|msg| {
                    future::ready(match msg {
                        Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
                        Ok(Message::Binary(bin)) => Some(Ok(Frame::Binary(bin.to_vec()))),
                        Ok(Message::Close(frame)) => {
                            log::debug!("Close frame received: {:?}", frame);
                            None
                        }
                        Ok(_) => None,
                        Err(e) => Some(Err(IngestError::TransportClosed(e.to_string()))),
                    })
                })
                .boxed();
            Ok(frames)
        }
        .boxed()
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    //! Scripted transport for driving the connection manager without sockets.

    use super::*;
    use futures_util::stream;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Outcome of one `open` call.
    pub(crate) enum Step {
        /// The open attempt fails.
        Refuse,
        /// Opens, yields the frames, then the peer closes.
        Close(Vec<Frame>),
        /// Opens, yields the frames, then stays open forever.
        Hold(Vec<Frame>),
    }

    /// Pops one step per `open`; refuses once the script runs out.
    pub(crate) struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        opens: AtomicUsize,
    }

    impl ScriptedTransport {
        pub(crate) fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                opens: AtomicUsize::new(0),
            }
        }

        pub(crate) fn refusing() -> Self {
            Self::new(Vec::new())
        }

        pub(crate) fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }
    }

    impl Transport for ScriptedTransport {
        fn prepare(&self, endpoint: &str) -> Result<Url, IngestError> {
            WsTransport.prepare(endpoint)
        }

        fn open(&self, _endpoint: &Url) -> BoxFuture<'static, Result<FrameStream, IngestError>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            let step = self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Step::Refuse);
            async move {
                match step {
                    Step::Refuse => Err(IngestError::TransportClosed("connection refused".into())),
                    Step::Close(frames) => Ok(stream::iter(frames.into_iter().map(Ok)).boxed()),
                    Step::Hold(frames) => Ok(stream::iter(frames.into_iter().map(Ok))
                        .chain(stream::pending())
                        .boxed()),
                }
            }
            .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_accepts_ws_schemes() {
        assert!(WsTransport.prepare("ws://localhost:8765").is_ok());
        assert!(WsTransport.prepare("wss://feed.example.com/stream").is_ok());
    }

    #[test]
    fn prepare_rejects_malformed_or_foreign_endpoints() {
        assert!(matches!(
            WsTransport.prepare("not a url"),
            Err(IngestError::TransportConstruction { .. })
        ));
        assert!(matches!(
            WsTransport.prepare("http://localhost:8765"),
            Err(IngestError::TransportConstruction { .. })
        ));
    }
}
