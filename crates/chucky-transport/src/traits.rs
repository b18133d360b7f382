//! Core transport trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chucky_protocol::OutgoingMessage;

use crate::error::TransportResult;
use crate::events::TransportEventHandler;
use crate::types::ConnectionStatus;

/// A persistent, message-oriented connection to the service.
///
/// Sessions drive a transport exclusively through this trait, so tests and
/// alternative connections can stand in for [`WebSocketTransport`](crate::WebSocketTransport).
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Returns the current connection status.
    fn status(&self) -> ConnectionStatus;

    /// Establishes the connection and flushes queued messages.
    fn connect(&self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Closes the connection; idempotent.
    fn disconnect(&self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Sends an envelope, queueing it while the connection is being established.
    fn send(
        &self,
        message: OutgoingMessage,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Installs the receiver of inbound messages and connection events.
    fn set_event_handler(&self, handler: Arc<dyn TransportEventHandler>);

    /// Waits until the connection is established, bounded by the transport's timeout.
    fn wait_for_ready(&self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Returns `true` if the transport is currently in the `Connected` state.
    fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Returns the endpoint address for this transport, if applicable.
    fn endpoint(&self) -> Option<String> {
        None
    }
}
