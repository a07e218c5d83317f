//! Error types for wheel-state

use thiserror::Error;

/// Result type for wheel-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors raised while applying packets to the mirror
///
/// These are recoverable by construction: the offending delta is dropped
/// whole and the mirror keeps serving its previous state.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
    /// An update arrived before any init on this connection
    #[error("Update received before init; frame dropped")]
    OutOfOrder,

    /// A delta tried to change the physical sector count
    #[error("Delta would change sector count from {expected} to {got}; frame dropped")]
    SectorCountChanged {
        /// Sector count established by the init packet
        expected: usize,
        /// Sector count carried by the rejected delta
        got: usize,
    },
}
