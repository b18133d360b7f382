//! State shared between the WebSocket transport handle and its background tasks.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use futures::stream::{SplitSink, SplitStream};
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, broadcast, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::trace;

use crate::config::WebSocketTransportConfig;
use crate::error::TransportError;
use crate::events::TransportEventHandler;
use crate::types::ConnectionStatus;

/// Type alias for the client WebSocket stream
pub(crate) type WebSocketConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Type alias for the write half of the connection
pub(crate) type WebSocketWriter = SplitSink<WebSocketConnection, Message>;

/// Type alias for the read half of the connection
pub(crate) type WebSocketReader = SplitStream<WebSocketConnection>;

/// WebSocket transport for a single session.
///
/// Cloning is cheap and every clone drives the same connection.
#[derive(Clone)]
pub struct WebSocketTransport {
    pub(crate) inner: Arc<TransportInner>,
}

pub(crate) struct TransportInner {
    /// Connection settings
    pub(crate) config: WebSocketTransportConfig,

    /// Identifier used to correlate log lines
    pub(crate) connection_id: String,

    /// Current status; changes are reported to the handler
    pub(crate) status: RwLock<ConnectionStatus>,

    /// Write half, present while a connection is established
    pub(crate) writer: Mutex<Option<WebSocketWriter>>,

    /// Serialized envelopes waiting for the connection, in send order
    pub(crate) queue: Mutex<VecDeque<String>>,

    /// Receiver of inbound events
    pub(crate) handler: RwLock<Option<Arc<dyn TransportEventHandler>>>,

    /// Becomes `true` once the connection is established
    pub(crate) ready_tx: watch::Sender<bool>,

    /// Stops the reader and keep-alive tasks
    pub(crate) shutdown_tx: broadcast::Sender<()>,

    /// Set while a local disconnect is in progress, so the reader does not
    /// report the resulting stream end as a failure
    pub(crate) closing: AtomicBool,
}

impl WebSocketTransport {
    /// Creates a disconnected transport.
    pub fn new(config: WebSocketTransportConfig) -> Self {
        let (ready_tx, _) = watch::channel(false);
        let (shutdown_tx, _) = broadcast::channel(4);

        Self {
            inner: Arc::new(TransportInner {
                config,
                connection_id: uuid::Uuid::new_v4().to_string(),
                status: RwLock::new(ConnectionStatus::Disconnected),
                writer: Mutex::new(None),
                queue: Mutex::new(VecDeque::new()),
                handler: RwLock::new(None),
                ready_tx,
                shutdown_tx,
                closing: AtomicBool::new(false),
            }),
        }
    }

    /// Transport configuration.
    pub fn config(&self) -> &WebSocketTransportConfig {
        &self.inner.config
    }

    /// Number of envelopes waiting for the connection.
    pub async fn queued_len(&self) -> usize {
        self.inner.queue.lock().await.len()
    }
}

impl TransportInner {
    pub(crate) fn status(&self) -> ConnectionStatus {
        *self.status.read()
    }

    /// Update the status, notifying the handler only when it actually changes.
    pub(crate) fn set_status(&self, status: ConnectionStatus) {
        let previous = {
            let mut current = self.status.write();
            std::mem::replace(&mut *current, status)
        };

        if previous != status {
            trace!(
                "Connection {} status {} -> {}",
                self.connection_id, previous, status
            );
            if let Some(handler) = self.handler() {
                handler.on_status_change(status);
            }
        }
    }

    pub(crate) fn handler(&self) -> Option<Arc<dyn TransportEventHandler>> {
        self.handler.read().clone()
    }

    pub(crate) fn report_error(&self, error: TransportError) {
        if let Some(handler) = self.handler() {
            handler.on_error(error);
        }
    }
}

impl fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("connection_id", &self.inner.connection_id)
            .field("base_url", &self.inner.config.base_url)
            .field("status", &self.inner.status())
            .finish()
    }
}
