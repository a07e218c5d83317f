//! Error types for wheel-client

use thiserror::Error;

/// Result type for wheel-client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur in the client layer
#[derive(Error, Debug)]
pub enum ClientError {
    /// The configured device URL could not be parsed
    #[error("Invalid device URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A servo sequence was triggered while one is still running
    #[error("Servo sequence already in progress for motor `{0}`")]
    SequenceInProgress(String),

    /// A servo command referenced a motor with no calibration data
    #[error("No calibration for motor `{0}`")]
    UnknownMotor(String),

    /// A command needing session catalogs ran before the first init
    #[error("No device session established yet")]
    NotInitialized,

    /// Failed to serialize an outbound packet
    #[error("Failed to encode outbound packet: {0}")]
    Encode(#[from] wheel_proto::ProtoError),
}
