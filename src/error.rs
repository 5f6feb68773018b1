//! Error types for framelink.

use thiserror::Error;

/// Main error type for all framelink operations.
#[derive(Debug, Error)]
pub enum FramelinkError {
    /// Payload too large to encode into a single frame.
    ///
    /// The sending side writes a single length byte, so outgoing payloads
    /// are capped at 255 bytes per frame.
    #[error("payload of {0} bytes exceeds the 255 byte frame limit")]
    InvalidPayloadSize(usize),

    /// Operation requires an established connection.
    #[error("not connected")]
    NotConnected,

    /// A connection attempt is already in progress.
    #[error("connection attempt already in progress")]
    AlreadyConnecting,

    /// The link is already open.
    #[error("already connected")]
    AlreadyConnected,

    /// Reconnect requested before any connection parameters were supplied.
    #[error("no connection parameters recorded")]
    NotConfigured,

    /// Serial port error (open failure, port configuration).
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error during link reads/writes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection task has shut down and no longer accepts commands.
    #[error("connection task terminated")]
    Closed,
}

/// Result type alias using FramelinkError.
pub type Result<T> = std::result::Result<T, FramelinkError>;
