//! Connection lifecycle management
//!
//! Presents one logical, continuous channel to the device even though the
//! physical transport drops and reconnects underneath. The state machine
//! is explicit and all transitions go through a single dispatch point:
//!
//! ```text
//! Connecting → Open → Closed → (backoff) → Connecting → …
//!                 ↘ Stopped (explicit shutdown only)
//! ```
//!
//! On every connection loss the mirrored state is discarded; the device
//! re-leads each connection with a fresh `init` snapshot, so the client
//! never replays missed deltas. Outbound packets issued while not open
//! are dropped, not queued: a stale command replaying after reconnect
//! could apply to a different device state.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use url::Url;

use wheel_proto::Inbound;
use wheel_state::StateStore;

use crate::backoff::ReconnectBackoff;
use crate::transport::{Transport, TransportEvent};

/// Lifecycle state of the logical device connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Attempting to establish the transport (also the backoff wait)
    Connecting,
    /// Channel established; frames flow
    Open,
    /// Channel lost; a reconnect will follow
    Closed,
    /// Explicitly shut down; terminal
    Stopped,
}

/// Handle to the background connection task
///
/// Cheap to clone; all clones share the task. Constructing via
/// [`Connection::spawn`] *is* the connect operation — there is no
/// separate `connect` call to misuse, which makes connecting idempotent
/// by construction. The task retries forever until [`shutdown`]
/// (`Connection::shutdown`) is called.
pub struct Connection {
    status_rx: watch::Receiver<ConnectionStatus>,
    outbound: Arc<Mutex<Option<mpsc::Sender<String>>>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl Connection {
    /// Spawn the connection task against a transport
    ///
    /// Must be called within a tokio runtime. Inbound frames are parsed
    /// and applied to `store`; malformed or unknown frames are logged and
    /// dropped without disturbing it.
    pub fn spawn(
        transport: Arc<dyn Transport>,
        url: Url,
        store: StateStore,
        backoff: ReconnectBackoff,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let outbound = Arc::new(Mutex::new(None));

        tokio::spawn(run_loop(
            transport,
            url,
            store,
            backoff,
            status_tx,
            Arc::clone(&outbound),
            shutdown_rx,
        ));

        Self {
            status_rx,
            outbound,
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Watch channel carrying status transitions
    ///
    /// Used by UI layers for connectivity overlays and open/close toasts.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Status right now
    pub fn current_status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// Put a frame on the wire
    ///
    /// Fails silently (logged warning, `false` returned) when the
    /// connection is not open. Commands are never queued across
    /// connections.
    pub fn send(&self, frame: String) -> bool {
        let guard = self.outbound.lock();
        let Some(tx) = guard.as_ref() else {
            tracing::warn!("Dropping outbound packet: connection is not open");
            return false;
        };
        match tx.try_send(frame) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Dropping outbound packet: {}", e);
                false
            }
        }
    }

    /// Tear the connection down for good
    ///
    /// The task closes its socket, abandons any backoff wait, and settles
    /// in [`ConnectionStatus::Stopped`]. No state is mutated afterwards.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            status_rx: self.status_rx.clone(),
            outbound: Arc::clone(&self.outbound),
            shutdown_tx: Arc::clone(&self.shutdown_tx),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("status", &self.current_status())
            .finish()
    }
}

/// The single dispatch point for status transitions
fn transition(status_tx: &watch::Sender<ConnectionStatus>, to: ConnectionStatus) {
    if status_tx.send(to).is_ok() {
        tracing::debug!("Connection status -> {:?}", to);
    }
}

async fn run_loop(
    transport: Arc<dyn Transport>,
    url: Url,
    store: StateStore,
    mut backoff: ReconnectBackoff,
    status_tx: watch::Sender<ConnectionStatus>,
    outbound: Arc<Mutex<Option<mpsc::Sender<String>>>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        transition(&status_tx, ConnectionStatus::Connecting);

        let connected = tokio::select! {
            result = transport.connect(&url) => result,
            _ = wait_shutdown(&mut shutdown_rx) => break,
        };

        match connected {
            Ok(mut channel) => {
                backoff.reset();
                *outbound.lock() = Some(channel.outbound);
                transition(&status_tx, ConnectionStatus::Open);
                tracing::info!("Connected to {}", url);

                let stopped = pump(&store, &mut channel.inbound, &mut shutdown_rx).await;

                *outbound.lock() = None;
                store.reset();
                if stopped {
                    break;
                }
                transition(&status_tx, ConnectionStatus::Closed);
            }
            Err(e) => {
                tracing::warn!("Connection attempt failed: {}", e);
                transition(&status_tx, ConnectionStatus::Closed);
            }
        }

        let delay = backoff.next_delay();
        tracing::debug!("Reconnecting in {:?} (attempt {})", delay, backoff.attempt());
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wait_shutdown(&mut shutdown_rx) => break,
        }
    }

    *outbound.lock() = None;
    store.reset();
    transition(&status_tx, ConnectionStatus::Stopped);
    tracing::info!("Connection shut down");
}

/// Forward frames into the store until the channel closes or shutdown is
/// requested; returns whether shutdown was the cause
async fn pump(
    store: &StateStore,
    inbound: &mut mpsc::Receiver<TransportEvent>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> bool {
    loop {
        tokio::select! {
            _ = wait_shutdown(shutdown_rx) => return true,
            event = inbound.recv() => match event {
                Some(TransportEvent::Frame(text)) => apply_frame(store, &text),
                Some(TransportEvent::Closed(reason)) => {
                    tracing::info!(
                        "Connection closed by peer{}",
                        reason.map(|r| format!(": {}", r)).unwrap_or_default()
                    );
                    return false;
                }
                None => {
                    tracing::info!("Transport channel ended");
                    return false;
                }
            }
        }
    }
}

/// Apply one inbound frame; validation failures never reach the store
fn apply_frame(store: &StateStore, raw: &str) {
    match Inbound::parse(raw) {
        Ok(Inbound::Init(packet)) => {
            tracing::info!("Received init snapshot (device ts {:.3})", packet.ts);
            store.apply_init(packet.state, packet.info);
        }
        Ok(Inbound::Update(packet)) => {
            if let Err(e) = store.apply_update(packet.update) {
                tracing::warn!("Dropping update: {}", e);
            }
        }
        Ok(Inbound::Unknown { cmd }) => {
            tracing::debug!("Ignoring unknown command `{}`", cmd);
        }
        Err(e) => {
            tracing::warn!("Dropping malformed frame: {}", e);
        }
    }
}

/// Resolve once shutdown is requested (or the handle side is gone)
async fn wait_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
}
