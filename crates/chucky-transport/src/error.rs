//! Transport error types.

use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Represents errors that can occur during transport operations.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TransportError {
    /// Failed to establish a connection, or the connection failed while reading.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to send a message.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive a message.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Failed to serialize or deserialize a message.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// A protocol-level error occurred.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// The operation did not complete within the configured timeout.
    #[error("Operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// The timeout duration that was exceeded
        timeout: Duration,
    },
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationFailed(err.to_string())
    }
}

impl From<TransportError> for chucky_protocol::Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectionFailed(msg) => Self::Connection(msg),
            TransportError::SendFailed(msg) => Self::Connection(format!("send failed: {msg}")),
            TransportError::ReceiveFailed(msg) => {
                Self::Connection(format!("receive failed: {msg}"))
            }
            TransportError::SerializationFailed(msg) => {
                Self::Protocol(format!("serialization failed: {msg}"))
            }
            TransportError::ProtocolError(msg) => Self::Protocol(msg),
            TransportError::Timeout { operation, timeout } => {
                Self::Timeout(format!("{operation} timed out after {timeout:?}"))
            }
        }
    }
}
