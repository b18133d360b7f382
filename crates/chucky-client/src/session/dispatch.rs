//! Inbound routing: handshake signals, identity assignment, tool calls and
//! forwarding into the session buffer. Runs on the transport reader task.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chucky_protocol::{Error, IncomingMessage, OutgoingMessage, SystemSubtype, ToolCallPayload};
use chucky_transport::{ConnectionStatus, TransportError, TransportEventHandler};
use tracing::{debug, info, trace};

use super::SessionInner;
use super::state::{Handshake, SessionState};
use crate::tools::failure_result;

/// Bridges transport events into a session without keeping it alive.
pub(crate) struct SessionTransportHandler {
    session: Weak<SessionInner>,
}

impl SessionTransportHandler {
    pub(crate) fn new(session: Weak<SessionInner>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl TransportEventHandler for SessionTransportHandler {
    async fn on_message(&self, message: IncomingMessage) {
        if let Some(session) = self.session.upgrade() {
            session.dispatch(message).await;
        }
    }

    async fn on_close(&self, code: u16, reason: String) {
        if let Some(session) = self.session.upgrade() {
            info!(
                "Session {} transport closed ({}): {}",
                session.local_id, code, reason
            );
            session.close().await;
        }
    }

    fn on_status_change(&self, status: ConnectionStatus) {
        if let Some(session) = self.session.upgrade() {
            trace!("Session {} transport is {}", session.local_id, status);
        }
    }

    fn on_error(&self, error: TransportError) {
        if let Some(session) = self.session.upgrade() {
            session.handle_error(error.into());
        }
    }
}

impl SessionInner {
    pub(crate) async fn dispatch(self: &Arc<Self>, message: IncomingMessage) {
        let connected = self.shared.lock().connected;

        match &message {
            IncomingMessage::Control(control) if !connected && control.signals_ready() => {
                debug!("Session {} handshake ready via control", self.local_id);
                self.signal_handshake(Handshake::Ready);
                return;
            }
            IncomingMessage::System(system) if system.subtype == SystemSubtype::Init => {
                if self.shared.lock().assign_id(&system.session_id) {
                    info!(
                        "Session {} assigned id '{}'",
                        self.local_id, system.session_id
                    );
                }
                self.signal_handshake(Handshake::Ready);
            }
            IncomingMessage::Error(payload) if !connected => {
                self.signal_handshake(Handshake::Failed(Error::from_remote(payload)));
            }
            IncomingMessage::ToolCall(call) => {
                self.execute_tool_call(call).await;
                return;
            }
            _ => {}
        }

        self.forward(message).await;
    }

    /// Hand the message to the session buffer, then to the session observer.
    async fn forward(&self, message: IncomingMessage) {
        let handler = self.handler();
        let observed = handler.as_ref().map(|_| message.clone());

        tokio::select! {
            result = self.inbound_tx.send(message) => {
                if result.is_err() {
                    debug!("Session {} buffer closed, dropping message", self.local_id);
                }
            }
            _ = self.closed.cancelled() => {
                trace!("Session {} closed while forwarding", self.local_id);
                return;
            }
        }

        if let (Some(handler), Some(message)) = (handler, observed) {
            handler.on_message(&message);
        }
    }

    /// Run a client-side tool and always answer with a result for its call id.
    async fn execute_tool_call(&self, call: &ToolCallPayload) {
        self.set_state(SessionState::WaitingTool);

        let result = match self.tools.execute(call, self.tool_timeout).await {
            Ok(result) => {
                if result.is_error {
                    self.handle_error(Error::ToolExecution {
                        tool_name: call.tool_name.clone(),
                        message: result.text_content(),
                    });
                }
                result
            }
            Err(error) => {
                let result = failure_result(&error);
                self.handle_error(error);
                result
            }
        };

        let reply = OutgoingMessage::tool_result(call.call_id.clone(), result);
        if let Err(e) = self.transport.send(reply).await {
            self.handle_error(e.into());
        }
        self.set_state(SessionState::Processing);
    }
}
