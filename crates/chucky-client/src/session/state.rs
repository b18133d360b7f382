//! Session lifecycle state.

use std::fmt;

use chucky_protocol::Error;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Created, not yet connected
    #[default]
    Idle,
    /// Connecting and waiting for the handshake
    Initializing,
    /// Handshake complete, no turn in progress
    Ready,
    /// A user turn is being processed remotely
    Processing,
    /// A client-side tool is executing
    WaitingTool,
    /// The last turn produced its result
    Completed,
    /// Connecting failed
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::Processing => write!(f, "processing"),
            Self::WaitingTool => write!(f, "waiting_tool"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Fields read and written from both caller tasks and the reader task.
#[derive(Debug, Default)]
pub(crate) struct SharedState {
    pub(crate) state: SessionState,
    /// Empty until the service assigns one; never cleared afterwards
    pub(crate) session_id: String,
    pub(crate) connected: bool,
}

impl SharedState {
    /// Adopt `incoming` only if no identity has been assigned yet.
    pub(crate) fn assign_id(&mut self, incoming: &str) -> bool {
        if self.session_id.is_empty() && !incoming.is_empty() {
            self.session_id = incoming.to_string();
            true
        } else {
            false
        }
    }
}

/// Outcome of the connect handshake; the first non-pending value wins.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Handshake {
    Pending,
    Ready,
    Failed(Error),
}

impl Handshake {
    pub(crate) fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}
