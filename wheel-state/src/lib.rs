//! Wheel Device State Mirror
//!
//! A single canonical in-memory mirror of remote device state.
//!
//! # Reconciliation model
//!
//! The device is authoritative. The mirror is:
//!
//! - **populated** by the first `init` snapshot of each connection
//!   (atomic wholesale replacement of state and catalogs),
//! - **merged** with `update` deltas (shallow per-section replacement,
//!   applied atomically or rejected whole),
//! - **nudged** by optimistic local writes from the command dispatcher,
//! - **discarded** on every connection loss, so the next connection
//!   starts from a clean init and stale state is never served as truth.
//!
//! Subscribers are invoked synchronously after every successful
//! transition and only ever observe fully-applied states.

pub mod error;
pub mod store;

pub use error::{Result, StateError};
pub use store::{StateStore, SubscriptionId};
