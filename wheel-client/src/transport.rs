//! Pluggable transport seam
//!
//! The connection manager talks to the wire through the [`Transport`]
//! trait rather than a concrete socket, so the reconnect state machine is
//! testable without a live device: production uses [`WsTransport`]
//! (tokio-tungstenite), tests inject an in-memory fake.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Depth of the per-connection frame channels
const CHANNEL_CAPACITY: usize = 32;

/// Errors raised while establishing a transport channel
#[derive(Error, Debug)]
pub enum TransportError {
    /// The connection attempt failed
    #[error("Failed to connect: {0}")]
    Connect(String),
}

/// Something that happened on an established channel
#[derive(Debug)]
pub enum TransportEvent {
    /// A complete text frame arrived
    Frame(String),
    /// The channel closed, with an optional reason
    Closed(Option<String>),
}

/// One established connection's pair of frame channels
///
/// Dropping the channel tears the underlying connection down.
pub struct TransportChannel {
    /// Frames to put on the wire
    pub outbound: mpsc::Sender<String>,
    /// Frames and lifecycle events coming off the wire
    pub inbound: mpsc::Receiver<TransportEvent>,
}

/// A factory for persistent bidirectional frame channels
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establish one connection to the device endpoint
    async fn connect(&self, url: &Url) -> Result<TransportChannel, TransportError>;
}

/// WebSocket transport over tokio-tungstenite
///
/// Each successful `connect` spawns a reader and a writer pump; both end
/// when the socket closes or the [`TransportChannel`] is dropped.
#[derive(Debug, Default)]
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &Url) -> Result<TransportChannel, TransportError> {
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

        // Writer pump: ends when the channel owner drops the sender side
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(frame)).await {
                    tracing::debug!("WebSocket write failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Reader pump: tungstenite answers pings internally; binary frames
        // are not part of the protocol and are skipped
        tokio::spawn(async move {
            loop {
                match source.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if inbound_tx.send(TransportEvent::Frame(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame.map(|f| f.reason.to_string());
                        let _ = inbound_tx.send(TransportEvent::Closed(reason)).await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let _ = inbound_tx
                            .send(TransportEvent::Closed(Some(e.to_string())))
                            .await;
                        break;
                    }
                    None => {
                        let _ = inbound_tx.send(TransportEvent::Closed(None)).await;
                        break;
                    }
                }
            }
        });

        Ok(TransportChannel {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory transport for exercising the connection state machine

    use super::*;
    use tokio::sync::Mutex;

    /// Test-side handles for one scripted connection
    pub struct FakeSession {
        /// Push frames/close events toward the client under test
        pub events: mpsc::Sender<TransportEvent>,
        /// Observe frames the client put on the wire
        pub sent: mpsc::Receiver<String>,
    }

    /// Transport whose connections are scripted by the test
    ///
    /// Each `connect` call consumes one queued session; when none is
    /// queued, `connect` waits (letting tests hold the manager in its
    /// connecting/backoff phase).
    pub struct FakeTransport {
        sessions: Mutex<mpsc::UnboundedReceiver<TransportChannel>>,
    }

    /// Feeds sessions to a [`FakeTransport`]
    pub struct SessionFeeder {
        tx: mpsc::UnboundedSender<TransportChannel>,
    }

    impl SessionFeeder {
        /// Queue one connection attempt's worth of channels
        pub fn accept(&self) -> FakeSession {
            let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
            let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
            let _ = self.tx.send(TransportChannel {
                outbound: outbound_tx,
                inbound: inbound_rx,
            });
            FakeSession {
                events: inbound_tx,
                sent: outbound_rx,
            }
        }
    }

    /// Build a scripted transport plus its feeder
    pub fn fake_transport() -> (FakeTransport, SessionFeeder) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            FakeTransport {
                sessions: Mutex::new(rx),
            },
            SessionFeeder { tx },
        )
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn connect(&self, _url: &Url) -> Result<TransportChannel, TransportError> {
            self.sessions
                .lock()
                .await
                .recv()
                .await
                .ok_or_else(|| TransportError::Connect("fake transport exhausted".to_string()))
        }
    }
}
