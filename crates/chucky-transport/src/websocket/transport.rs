//! [`Transport`] implementation for [`WebSocketTransport`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chucky_protocol::OutgoingMessage;

use super::types::WebSocketTransport;
use crate::error::TransportResult;
use crate::events::TransportEventHandler;
use crate::traits::Transport;
use crate::types::ConnectionStatus;

impl Transport for WebSocketTransport {
    fn status(&self) -> ConnectionStatus {
        self.inner.status()
    }

    fn connect(&self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move { self.inner.connect().await })
    }

    fn disconnect(&self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move { self.inner.disconnect().await })
    }

    fn send(
        &self,
        message: OutgoingMessage,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move { self.inner.send(message).await })
    }

    fn set_event_handler(&self, handler: Arc<dyn TransportEventHandler>) {
        *self.inner.handler.write() = Some(handler);
    }

    fn wait_for_ready(&self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move { self.inner.wait_for_ready().await })
    }

    fn endpoint(&self) -> Option<String> {
        Some(self.inner.config.base_url.clone())
    }
}
