//! Core transport types.

use std::fmt;

/// Lifecycle of a transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    /// Not connected.
    #[default]
    Disconnected,
    /// Dialing; sends are queued.
    Connecting,
    /// Connected and writable.
    Connected,
    /// Declared for completeness; no transport in this crate enters it.
    Reconnecting,
    /// The last connect failed or the connection broke.
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Reconnecting => write!(f, "reconnecting"),
            Self::Error => write!(f, "error"),
        }
    }
}
