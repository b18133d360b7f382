//! Session factory and registry.

use std::fmt;
use std::sync::Arc;

use chucky_protocol::{Error, IncomingMessage, Result, SessionOptions, SessionResult};
use chucky_transport::{Transport, WebSocketTransport};
use dashmap::DashMap;
use futures::StreamExt as _;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ClientOptions;
use crate::handlers::ClientEventHandler;
use crate::session::Session;

/// Entry point of the SDK: creates sessions and tracks the live ones.
///
/// Cloning is cheap; clones share the registry.
///
/// ```rust,no_run
/// use chucky_client::{Client, ClientOptions};
/// use chucky_protocol::SessionOptions;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new(ClientOptions::new("ak_live_..."));
/// let result = client
///     .prompt("What is 2 + 2?", SessionOptions::default(), &CancellationToken::new())
///     .await?;
/// println!("{}", result.result.unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    options: ClientOptions,
    /// Live sessions keyed by their client-local id
    sessions: DashMap<String, Session>,
    handler: RwLock<Option<Arc<dyn ClientEventHandler>>>,
}

impl Client {
    /// Client with the given options.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                options,
                sessions: DashMap::new(),
                handler: RwLock::new(None),
            }),
        }
    }

    /// Options shared by every session.
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Install the client observer.
    pub fn set_event_handler(&self, handler: Arc<dyn ClientEventHandler>) {
        *self.inner.handler.write() = Some(handler);
    }

    /// Create and register a session over a new WebSocket transport.
    pub fn create_session(&self, options: SessionOptions) -> Session {
        let transport = WebSocketTransport::new(self.inner.options.transport_config());
        self.create_session_with_transport(Arc::new(transport), options)
    }

    /// Create and register a session over a caller-supplied transport.
    pub fn create_session_with_transport(
        &self,
        transport: Arc<dyn Transport>,
        options: SessionOptions,
    ) -> Session {
        let session = Session::attach(
            transport,
            options,
            self.inner.options.tool_timeout,
            Some(Arc::downgrade(&self.inner)),
        );
        self.inner
            .sessions
            .insert(session.local_id().to_string(), session.clone());
        debug!("Registered session {}", session.local_id());
        session
    }

    /// Live session by client-local id.
    pub fn session(&self, local_id: &str) -> Option<Session> {
        self.inner
            .sessions
            .get(local_id)
            .map(|entry| entry.value().clone())
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    /// One-shot prompt: open a session, send `message`, wait for the result
    /// and close the session again.
    ///
    /// # Errors
    ///
    /// Any [`Session::send`] error, [`Error::Cancelled`] if `cancel` fires, or
    /// [`Error::Session`] if the stream ends without a result.
    pub async fn prompt(
        &self,
        message: &str,
        options: SessionOptions,
        cancel: &CancellationToken,
    ) -> Result<SessionResult> {
        let session = self.create_session(options);
        let outcome = run_prompt(&session, message, cancel).await;
        session.close().await;
        outcome
    }

    /// Close every live session.
    pub async fn close(&self) {
        let sessions: Vec<Session> = self
            .inner
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        info!("Closing {} sessions", sessions.len());
        for session in sessions {
            session.close().await;
        }
    }
}

async fn run_prompt(
    session: &Session,
    message: &str,
    cancel: &CancellationToken,
) -> Result<SessionResult> {
    session.send(cancel, message).await?;

    let mut stream = Box::pin(session.stream(cancel.clone()));
    while let Some(message) = stream.next().await {
        if let IncomingMessage::Result(result) = message {
            return Ok(result.into());
        }
    }

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Err(Error::Session("no result received".to_string()))
}

impl ClientInner {
    pub(crate) fn remove_session(&self, local_id: &str, session_id: &str) {
        if self.sessions.remove(local_id).is_some() {
            debug!("Unregistered session {}", local_id);
            if let Some(handler) = self.handler() {
                handler.on_session_end(session_id);
            }
        }
    }

    pub(crate) fn notify_session_start(&self, session_id: &str) {
        if let Some(handler) = self.handler() {
            handler.on_session_start(session_id);
        }
    }

    pub(crate) fn notify_error(&self, error: &Error) {
        if let Some(handler) = self.handler() {
            handler.on_error(error);
        }
    }

    fn handler(&self) -> Option<Arc<dyn ClientEventHandler>> {
        self.handler.read().clone()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.inner.options)
            .field("sessions", &self.inner.sessions.len())
            .finish()
    }
}
