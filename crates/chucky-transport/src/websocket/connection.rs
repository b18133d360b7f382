//! Connection lifecycle and the outbound send path.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chucky_protocol::OutgoingMessage;
use futures::{SinkExt as _, StreamExt as _};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info, trace, warn};

use super::types::{TransportInner, WebSocketWriter};
use crate::error::{TransportError, TransportResult};
use crate::types::ConnectionStatus;

impl TransportInner {
    /// Dial the endpoint, flush the send queue and start the background tasks.
    pub(crate) async fn connect(self: &Arc<Self>) -> TransportResult<()> {
        if self.status() == ConnectionStatus::Connected {
            return Ok(());
        }

        let url = match self.config.connection_url() {
            Ok(url) => url,
            Err(e) => {
                self.set_status(ConnectionStatus::Error);
                return Err(e);
            }
        };

        self.closing.store(false, Ordering::SeqCst);
        self.set_status(ConnectionStatus::Connecting);
        info!(
            "Connecting {} to {}",
            self.connection_id, self.config.base_url
        );

        let dial = tokio::time::timeout(self.config.timeout, connect_async(url.as_str())).await;
        let stream = match dial {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                return Err(self.fail_connect(format!(
                    "failed to connect to {}: {}",
                    self.config.base_url, e
                )));
            }
            Err(_) => {
                return Err(self.fail_connect(format!(
                    "handshake with {} timed out after {:?}",
                    self.config.base_url, self.config.timeout
                )));
            }
        };

        let (writer, reader) = stream.split();

        // Hold the queue across the flush so concurrent sends land after it.
        {
            let mut queue = self.queue.lock().await;
            let mut slot = self.writer.lock().await;

            if self.closing.load(Ordering::SeqCst) {
                drop(slot);
                drop(queue);
                info!(
                    "Disconnect requested while dialing {}, dropping new connection",
                    self.connection_id
                );
                self.close_writer(writer).await;
                self.set_status(ConnectionStatus::Disconnected);
                return Err(closed_while_connecting());
            }

            let writer = slot.insert(writer);

            let pending = queue.len();
            while let Some(text) = queue.pop_front() {
                if let Err(e) = writer.send(Message::text(text)).await {
                    warn!(
                        "Failed to flush queued message on {}: {}",
                        self.connection_id, e
                    );
                    self.report_error(TransportError::SendFailed(format!(
                        "failed to flush queued message: {e}"
                    )));
                }
            }
            if pending > 0 {
                debug!(
                    "Flushed {} queued messages on {}",
                    pending, self.connection_id
                );
            }

            self.set_status(ConnectionStatus::Connected);
        }

        self.ready_tx.send_replace(true);
        self.spawn_reader(reader);
        self.spawn_keep_alive();

        // A disconnect that slipped in before the tasks subscribed to the
        // shutdown broadcast has to be repeated.
        if self.closing.load(Ordering::SeqCst) {
            self.disconnect().await?;
            return Err(closed_while_connecting());
        }

        info!("Connection {} established", self.connection_id);
        Ok(())
    }

    fn fail_connect(&self, reason: String) -> TransportError {
        warn!("Connection {} failed: {}", self.connection_id, reason);
        self.set_status(ConnectionStatus::Error);
        TransportError::ConnectionFailed(reason)
    }

    /// Stop the background tasks and close the socket. Safe to call repeatedly.
    pub(crate) async fn disconnect(&self) -> TransportResult<()> {
        self.closing.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());

        let writer = self.writer.lock().await.take();
        if let Some(writer) = writer {
            self.close_writer(writer).await;
            info!("Connection {} closed", self.connection_id);
        }

        self.ready_tx.send_replace(false);
        self.set_status(ConnectionStatus::Disconnected);
        Ok(())
    }

    /// Send a normal close frame and shut the sink.
    async fn close_writer(&self, mut writer: WebSocketWriter) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: String::new().into(),
        };
        if let Err(e) = writer.send(Message::Close(Some(frame))).await {
            debug!(
                "Close frame not delivered on {}: {}",
                self.connection_id, e
            );
        }
        if let Err(e) = writer.close().await {
            trace!("Sink close on {} failed: {}", self.connection_id, e);
        }
    }

    /// Serialize and write an envelope, or queue it while no connection is usable.
    pub(crate) async fn send(&self, message: OutgoingMessage) -> TransportResult<()> {
        let text = message.to_json()?;
        if self.config.debug {
            debug!(target: "chucky_transport::wire", connection = %self.connection_id, "-> {}", text);
        }

        let mut queue = self.queue.lock().await;
        let mut writer = self.writer.lock().await;
        let connecting = self.status() == ConnectionStatus::Connecting;

        let Some(sink) = writer.as_mut().filter(|_| !connecting) else {
            trace!(
                "Queueing {} envelope on {}",
                message.message_type(),
                self.connection_id
            );
            queue.push_back(text);
            return Ok(());
        };
        drop(queue);

        sink.send(Message::text(text))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    /// Resolve once connected, or fail after the configured timeout.
    pub(crate) async fn wait_for_ready(&self) -> TransportResult<()> {
        let mut ready_rx = self.ready_tx.subscribe();
        let outcome = tokio::time::timeout(self.config.timeout, async move {
            ready_rx.wait_for(|ready| *ready).await.map(|_| ())
        })
        .await;

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(TransportError::ConnectionFailed(
                "transport dropped before becoming ready".to_string(),
            )),
            Err(_) => Err(TransportError::Timeout {
                operation: "wait_for_ready".to_string(),
                timeout: self.config.timeout,
            }),
        }
    }
}

fn closed_while_connecting() -> TransportError {
    TransportError::ConnectionFailed("connection closed while connecting".to_string())
}
