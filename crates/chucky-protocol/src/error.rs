//! Unified error type for the Chucky SDK.
//!
//! Every fallible public operation in the transport and client crates returns
//! [`Error`]. Each variant corresponds to one wire-level [`ErrorCode`], so a
//! remote `error` envelope can be mapped onto the same type that local failures
//! use.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ErrorPayload;

/// A specialized `Result` type for SDK operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Wire-compatible error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Dial, read or write failure on the underlying connection.
    ConnectionError,
    /// The service rejected the credential.
    AuthenticationError,
    /// The configured spending limit was reached.
    BudgetExceeded,
    /// Too many concurrent sessions for the credential.
    ConcurrencyLimit,
    /// Request rate limited by the service.
    RateLimit,
    /// Session-level failure (handshake, closed session, missing result).
    SessionError,
    /// A locally executed tool failed.
    ToolExecutionError,
    /// An operation did not finish in time.
    TimeoutError,
    /// Invalid caller-supplied input.
    ValidationError,
    /// Malformed or unexpected frame.
    ProtocolError,
    /// Anything else, including caller cancellation.
    UnknownError,
}

impl ErrorCode {
    /// The code as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::AuthenticationError => "AUTHENTICATION_ERROR",
            Self::BudgetExceeded => "BUDGET_EXCEEDED",
            Self::ConcurrencyLimit => "CONCURRENCY_LIMIT",
            Self::RateLimit => "RATE_LIMIT",
            Self::SessionError => "SESSION_ERROR",
            Self::ToolExecutionError => "TOOL_EXECUTION_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ProtocolError => "PROTOCOL_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Parse a wire code, returning `None` for codes this SDK does not know.
    pub fn parse(code: &str) -> Option<Self> {
        let code = match code {
            "CONNECTION_ERROR" => Self::ConnectionError,
            "AUTHENTICATION_ERROR" => Self::AuthenticationError,
            "BUDGET_EXCEEDED" => Self::BudgetExceeded,
            "CONCURRENCY_LIMIT" => Self::ConcurrencyLimit,
            "RATE_LIMIT" => Self::RateLimit,
            "SESSION_ERROR" => Self::SessionError,
            "TOOL_EXECUTION_ERROR" => Self::ToolExecutionError,
            "TIMEOUT_ERROR" => Self::TimeoutError,
            "VALIDATION_ERROR" => Self::ValidationError,
            "PROTOCOL_ERROR" => Self::ProtocolError,
            "UNKNOWN_ERROR" => Self::UnknownError,
            _ => return None,
        };
        Some(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by sessions, transports and the client registry.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Dial, read or write failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A frame could not be decoded or violated the protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An operation exceeded its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Session-level failure.
    #[error("Session error: {0}")]
    Session(String),

    /// A locally executed tool failed, timed out or was not registered.
    #[error("Tool execution error in '{tool_name}': {message}")]
    ToolExecution {
        /// Name of the tool that was called
        tool_name: String,
        /// Failure text, identical to the text sent back in the tool result
        message: String,
    },

    /// The service rejected the credential.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The configured spending limit was reached.
    #[error("Budget exceeded: {0}")]
    BudgetExceeded(String),

    /// Too many concurrent sessions.
    #[error("Concurrency limit reached: {0}")]
    ConcurrencyLimit(String),

    /// Request rate limited.
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Invalid caller input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller's cancellation token fired.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connection(_) => ErrorCode::ConnectionError,
            Self::Protocol(_) => ErrorCode::ProtocolError,
            Self::Timeout(_) => ErrorCode::TimeoutError,
            Self::Session(_) => ErrorCode::SessionError,
            Self::ToolExecution { .. } => ErrorCode::ToolExecutionError,
            Self::Authentication(_) => ErrorCode::AuthenticationError,
            Self::BudgetExceeded(_) => ErrorCode::BudgetExceeded,
            Self::ConcurrencyLimit(_) => ErrorCode::ConcurrencyLimit,
            Self::RateLimit(_) => ErrorCode::RateLimit,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Cancelled => ErrorCode::UnknownError,
        }
    }

    /// Build an error from a remote `error` envelope.
    ///
    /// Known codes map onto their variant; anything else becomes
    /// [`Error::Session`] carrying the remote message.
    pub fn from_remote(payload: &ErrorPayload) -> Self {
        let message = payload.message.clone();
        match payload.code.as_deref().and_then(ErrorCode::parse) {
            Some(ErrorCode::ConnectionError) => Self::Connection(message),
            Some(ErrorCode::AuthenticationError) => Self::Authentication(message),
            Some(ErrorCode::BudgetExceeded) => Self::BudgetExceeded(message),
            Some(ErrorCode::ConcurrencyLimit) => Self::ConcurrencyLimit(message),
            Some(ErrorCode::RateLimit) => Self::RateLimit(message),
            Some(ErrorCode::TimeoutError) => Self::Timeout(message),
            Some(ErrorCode::ValidationError) => Self::Validation(message),
            Some(ErrorCode::ProtocolError) => Self::Protocol(message),
            _ => Self::Session(message),
        }
    }

    /// Whether the error came from the connection rather than the session.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}
