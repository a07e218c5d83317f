//! Error types for wheel-proto

use thiserror::Error;

/// Result type for wheel-proto operations
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Errors raised while parsing or building wire packets
///
/// A `ProtoError` on an inbound frame is never fatal to the caller: the
/// offending frame is dropped and processing continues with the next one.
#[derive(Error, Debug)]
pub enum ProtoError {
    /// Frame is not valid JSON
    #[error("Malformed JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame has no string `cmd` field
    #[error("Frame is missing the `cmd` field")]
    MissingCommand,

    /// Frame announced a known command but its payload failed validation
    #[error("Invalid `{cmd}` payload: {source}")]
    Payload {
        cmd: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
