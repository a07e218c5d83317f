//! Wheel Device Client
//!
//! Connects a UI to a wheel device over a persistent WebSocket and keeps
//! a local mirror of the device state in sync:
//!
//! - [`connection`]: reconnecting transport lifecycle with exponential
//!   backoff; the device re-leads every connection with a fresh `init`
//!   snapshot.
//! - [`dispatcher`]: optimistic local mutation plus outbound `set_state`
//!   dispatch, with slider drags coalesced to one packet per window.
//! - [`sequence`]: timed multi-step servo procedures (mount/unmount).
//!
//! # Example
//!
//! ```rust,ignore
//! use wheel_client::{LoggingMode, WheelClient};
//!
//! wheel_client::logging::init_logging(LoggingMode::Development)?;
//!
//! let client = WheelClient::connect("ws://wheel.local:8080/api/v1/ws")?;
//! let _sub = client.store().subscribe(|state| {
//!     println!("sector under the pointer: {}", state.encoder.sector);
//! });
//! client.dispatcher().set_brightness(0.7);
//! ```

pub mod backoff;
pub mod client;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod sequence;
pub mod throttle;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;

pub use backoff::ReconnectBackoff;
pub use client::{ClientConfig, WheelClient};
pub use connection::{Connection, ConnectionStatus};
pub use dispatcher::Dispatcher;
pub use error::{ClientError, Result};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use sequence::{SequenceRunner, SequenceStep, ServoCommand};
pub use throttle::{CoalescingSender, DEFAULT_THROTTLE_WINDOW};
pub use transport::{Transport, TransportChannel, TransportError, TransportEvent, WsTransport};

// The state and schema layers are re-exported so UI code can depend on a
// single crate.
pub use wheel_proto as proto;
pub use wheel_state as state;
