//! Transport event delivery.
//!
//! A transport reports everything that happens on its connection to one
//! [`TransportEventHandler`]. All callbacks run on the transport's reader task,
//! so a slow handler applies back-pressure to the connection.

use async_trait::async_trait;
use chucky_protocol::IncomingMessage;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::types::ConnectionStatus;

/// Receiver of transport events.
#[async_trait]
pub trait TransportEventHandler: Send + Sync {
    /// A decoded inbound envelope.
    async fn on_message(&self, message: IncomingMessage);

    /// The connection closed, either by a peer close frame or abnormally (code 1006).
    async fn on_close(&self, code: u16, reason: String) {
        let _ = (code, reason);
    }

    /// The connection status changed.
    fn on_status_change(&self, status: ConnectionStatus) {
        let _ = status;
    }

    /// A background fault: malformed frame, read failure or keep-alive failure.
    fn on_error(&self, error: TransportError) {
        let _ = error;
    }
}

/// Represents events that occur within a transport's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// An inbound envelope was decoded.
    Message(IncomingMessage),
    /// The connection was closed.
    Closed {
        /// WebSocket close code
        code: u16,
        /// Close reason
        reason: String,
    },
    /// The connection status changed.
    StatusChanged(ConnectionStatus),
    /// A background fault occurred.
    Error(TransportError),
}

/// A handler that forwards every event into a bounded channel.
#[derive(Debug, Clone)]
pub struct TransportEventEmitter {
    sender: mpsc::Sender<TransportEvent>,
}

impl TransportEventEmitter {
    /// Creates a new event emitter and a corresponding receiver.
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<TransportEvent>) {
        let (sender, receiver) = mpsc::channel(500);
        (Self { sender }, receiver)
    }

    /// Emits an event, dropping it if the channel is full.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.sender.try_send(event);
    }
}

#[async_trait]
impl TransportEventHandler for TransportEventEmitter {
    async fn on_message(&self, message: IncomingMessage) {
        self.emit(TransportEvent::Message(message));
    }

    async fn on_close(&self, code: u16, reason: String) {
        self.emit(TransportEvent::Closed { code, reason });
    }

    fn on_status_change(&self, status: ConnectionStatus) {
        self.emit(TransportEvent::StatusChanged(status));
    }

    fn on_error(&self, error: TransportError) {
        self.emit(TransportEvent::Error(error));
    }
}
