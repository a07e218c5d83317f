//! Top-level client facade
//!
//! Wires the store, connection manager, and dispatcher together behind
//! one handle. Constructing a [`WheelClient`] *is* the connect
//! operation; the background task retries forever until
//! [`dispose`](WheelClient::dispose).

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use wheel_state::StateStore;

use crate::backoff::ReconnectBackoff;
use crate::connection::{Connection, ConnectionStatus};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::throttle::DEFAULT_THROTTLE_WINDOW;
use crate::transport::{Transport, WsTransport};

/// Tunables for a client session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Coalescing window for continuous controls (sliders)
    pub throttle_window: Duration,
    /// Reconnect backoff policy
    pub backoff: ReconnectBackoff,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            throttle_window: DEFAULT_THROTTLE_WINDOW,
            backoff: ReconnectBackoff::default(),
        }
    }
}

/// Handle to one device session
///
/// Cheap to clone; all clones share the same session.
///
/// # Example
///
/// ```rust,ignore
/// let client = WheelClient::connect("ws://wheel.local:8080/api/v1/ws")?;
///
/// let _sub = client.store().subscribe(|state| {
///     println!("theme is now {}", state.theme_id);
/// });
///
/// client.dispatcher().set_theme("neon");
/// ```
#[derive(Debug, Clone)]
pub struct WheelClient {
    store: StateStore,
    connection: Connection,
    dispatcher: Dispatcher,
}

impl WheelClient {
    /// Connect to a device over WebSocket with default tunables
    ///
    /// Must be called within a tokio runtime. Returns as soon as the
    /// background task is spawned; watch [`status`](WheelClient::status)
    /// for the actual open.
    pub fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, ClientConfig::default())
    }

    /// Connect with explicit tunables
    pub fn connect_with(url: &str, config: ClientConfig) -> Result<Self> {
        let url = Url::parse(url)?;
        Ok(Self::with_transport(
            Arc::new(WsTransport),
            url,
            config,
        ))
    }

    /// Build a client over a caller-supplied transport
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        url: Url,
        config: ClientConfig,
    ) -> Self {
        let store = StateStore::new();
        let connection = Connection::spawn(transport, url, store.clone(), config.backoff);
        let dispatcher =
            Dispatcher::new(store.clone(), connection.clone(), config.throttle_window);

        Self {
            store,
            connection,
            dispatcher,
        }
    }

    /// The mirrored device state
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// The command dispatch surface
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Watch channel carrying connection status transitions
    pub fn status(&self) -> tokio::sync::watch::Receiver<ConnectionStatus> {
        self.connection.status()
    }

    /// Connection status right now
    pub fn current_status(&self) -> ConnectionStatus {
        self.connection.current_status()
    }

    /// Tear the session down
    ///
    /// Closes the socket, abandons pending throttle timers and servo
    /// sequences, and settles in [`ConnectionStatus::Stopped`]. The
    /// handle is inert afterwards.
    pub fn dispose(&self) {
        self.dispatcher.dispose();
        self.connection.shutdown();
    }
}
