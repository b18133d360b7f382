//! Background tasks: the frame reader and the keep-alive pinger.
//!
//! Both tasks subscribe to the shutdown broadcast before they are spawned and
//! exit as soon as it fires. Neither is ever aborted, because handler callbacks
//! running on the reader may themselves trigger a disconnect.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chucky_protocol::{IncomingMessage, OutgoingMessage};
use futures::StreamExt as _;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use super::types::{TransportInner, WebSocketReader};
use crate::error::TransportError;
use crate::types::ConnectionStatus;

/// Close code reported when the connection ends without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code reported when the peer's close frame carries no status.
const NO_STATUS_RECEIVED: u16 = 1005;

impl TransportInner {
    /// Spawn the single consumer of the read half.
    pub(crate) fn spawn_reader(self: &Arc<Self>, mut reader: WebSocketReader) {
        let inner = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            debug!("Reader task started for {}", inner.connection_id);

            loop {
                let frame = tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        debug!("Reader for {} received shutdown signal", inner.connection_id);
                        break;
                    }
                    frame = reader.next() => frame,
                };

                match frame {
                    Some(Ok(Message::Text(text))) => inner.handle_text(text.as_str()).await,
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => inner.handle_text(text).await,
                        Err(e) => {
                            warn!("Non UTF-8 binary frame on {}: {}", inner.connection_id, e);
                            inner.report_error(TransportError::ProtocolError(format!(
                                "failed to parse message: {e}"
                            )));
                        }
                    },
                    Some(Ok(Message::Ping(_))) => {
                        trace!("Ping frame on {}", inner.connection_id);
                    }
                    Some(Ok(Message::Pong(_))) => {
                        trace!("Pong frame on {}", inner.connection_id);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                            .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                        info!(
                            "Peer closed {} with code {}: {}",
                            inner.connection_id, code, reason
                        );
                        inner.set_status(ConnectionStatus::Disconnected);
                        if let Some(handler) = inner.handler() {
                            handler.on_close(code, reason).await;
                        }
                        break;
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        inner
                            .fail_connection(TransportError::ReceiveFailed(e.to_string()))
                            .await;
                        break;
                    }
                    None => {
                        inner
                            .fail_connection(TransportError::ConnectionFailed(
                                "connection closed without close frame".to_string(),
                            ))
                            .await;
                        break;
                    }
                }
            }

            debug!("Reader task stopped for {}", inner.connection_id);
        });
    }

    /// Spawn the periodic ping sender; a zero interval disables it.
    pub(crate) fn spawn_keep_alive(self: &Arc<Self>) {
        let period = self.config.keep_alive_interval;
        if period.is_zero() {
            return;
        }

        let inner = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        debug!("Keep-alive for {} received shutdown signal", inner.connection_id);
                        break;
                    }
                    _ = ticker.tick() => {
                        trace!("Sending keep-alive ping on {}", inner.connection_id);
                        if let Err(e) = inner.send(OutgoingMessage::ping()).await {
                            warn!("Keep-alive ping failed on {}: {}", inner.connection_id, e);
                            inner.report_error(e);
                        }
                    }
                }
            }
        });
    }

    async fn handle_text(&self, text: &str) {
        if self.config.debug {
            debug!(target: "chucky_transport::wire", connection = %self.connection_id, "<- {}", text);
        }

        match IncomingMessage::from_json(text) {
            Ok(message) => {
                trace!(
                    "Received {} envelope on {}",
                    message.message_type(),
                    self.connection_id
                );
                if let Some(handler) = self.handler() {
                    handler.on_message(message).await;
                }
            }
            Err(e) => {
                warn!("Dropping malformed frame on {}: {}", self.connection_id, e);
                self.report_error(TransportError::ProtocolError(format!(
                    "failed to parse message: {e}"
                )));
            }
        }
    }

    /// Report a broken connection unless a local disconnect caused it.
    async fn fail_connection(&self, error: TransportError) {
        if self.closing.load(Ordering::SeqCst) {
            debug!("Reader for {} stopped during disconnect", self.connection_id);
            return;
        }

        warn!("Connection {} lost: {}", self.connection_id, error);
        self.set_status(ConnectionStatus::Error);
        if let Some(handler) = self.handler() {
            let reason = error.to_string();
            handler.on_error(error);
            handler.on_close(ABNORMAL_CLOSURE, reason).await;
        }
    }
}
