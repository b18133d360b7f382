//! Event handler traits for sessions and clients.
//!
//! Handlers are invoked synchronously from the transport reader task, so they
//! must return quickly; spawn work onto the runtime for anything slow.

use chucky_protocol::{Error, IncomingMessage};

/// Observer of a single session.
///
/// All methods default to no-ops.
pub trait SessionEventHandler: Send + Sync {
    /// Called after a message has been forwarded to the session buffer.
    fn on_message(&self, message: &IncomingMessage) {
        let _ = message;
    }

    /// Called for faults that happen outside any caller operation.
    fn on_error(&self, error: &Error) {
        let _ = error;
    }

    /// Called once when the session closes.
    fn on_close(&self) {}
}

/// Observer of every session created by a client.
///
/// All methods default to no-ops.
pub trait ClientEventHandler: Send + Sync {
    /// A session completed its handshake. The identity may still be empty if
    /// the service signalled readiness before assigning one.
    fn on_session_start(&self, session_id: &str) {
        let _ = session_id;
    }

    /// A session closed and left the registry.
    fn on_session_end(&self, session_id: &str) {
        let _ = session_id;
    }

    /// A session reported an asynchronous fault.
    fn on_error(&self, error: &Error) {
        let _ = error;
    }
}
