//! A single conversation with the service over one transport.
//!
//! ```text
//! Idle --connect()--> Initializing --handshake ready--> Ready
//! Initializing --failure, cancellation or close--> Error
//! Ready --send()--> Processing
//! Processing --tool_call--> WaitingTool --tool_result sent--> Processing
//! Processing --result pulled by stream()--> Completed
//! ```
//!
//! The handshake completes on whichever arrives first: a `control` envelope
//! with action `ready`/`session_info`, or a `system`/`init` envelope. The
//! session identity is only ever taken from `system`/`init`.

mod dispatch;
mod state;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chucky_protocol::{
    ControlAction, Error, IncomingMessage, InitPayload, OutgoingMessage, Result, SessionOptions,
    UNKNOWN_SESSION_ID,
};
use chucky_transport::{ConnectionStatus, Transport};
use futures::Stream;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::ClientInner;
use crate::config::DEFAULT_TOOL_TIMEOUT;
use crate::handlers::SessionEventHandler;
use crate::tools::ToolRegistry;

pub use state::SessionState;

use dispatch::SessionTransportHandler;
use state::{Handshake, SharedState};

/// Capacity of the inbound message buffer.
const INBOUND_CAPACITY: usize = 100;

/// Capacity of the asynchronous error slot.
const ERROR_CAPACITY: usize = 10;

/// A conversation with the service.
///
/// Cloning is cheap; all clones share one connection, buffer and state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    /// Registry key inside the owning client
    local_id: String,
    transport: Arc<dyn Transport>,
    options: SessionOptions,
    tools: ToolRegistry,
    tool_timeout: Duration,
    shared: Mutex<SharedState>,
    /// Serializes concurrent `connect` calls
    connect_lock: tokio::sync::Mutex<()>,
    handshake: watch::Sender<Handshake>,
    inbound_tx: mpsc::Sender<IncomingMessage>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<IncomingMessage>>,
    error_tx: mpsc::Sender<Error>,
    error_rx: Mutex<mpsc::Receiver<Error>>,
    /// Cancelled exactly once, when the session closes
    closed: CancellationToken,
    close_started: AtomicBool,
    handler: RwLock<Option<Arc<dyn SessionEventHandler>>>,
    client: Option<Weak<ClientInner>>,
}

impl Session {
    /// Session over `transport` with the default tool timeout.
    ///
    /// Nothing is sent until [`connect`](Self::connect) or [`send`](Self::send).
    pub fn new(transport: Arc<dyn Transport>, options: SessionOptions) -> Self {
        Self::attach(transport, options, DEFAULT_TOOL_TIMEOUT, None)
    }

    /// Session whose client-side tools are limited to `tool_timeout` per call.
    pub fn with_tool_timeout(
        transport: Arc<dyn Transport>,
        options: SessionOptions,
        tool_timeout: Duration,
    ) -> Self {
        Self::attach(transport, options, tool_timeout, None)
    }

    pub(crate) fn attach(
        transport: Arc<dyn Transport>,
        options: SessionOptions,
        tool_timeout: Duration,
        client: Option<Weak<ClientInner>>,
    ) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(ERROR_CAPACITY);
        let (handshake, _) = watch::channel(Handshake::Pending);
        let tools = ToolRegistry::from_servers(&options.mcp_servers);

        let inner = Arc::new(SessionInner {
            local_id: uuid::Uuid::new_v4().to_string(),
            transport,
            options,
            tools,
            tool_timeout,
            shared: Mutex::new(SharedState::default()),
            connect_lock: tokio::sync::Mutex::new(()),
            handshake,
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            error_tx,
            error_rx: Mutex::new(error_rx),
            closed: CancellationToken::new(),
            close_started: AtomicBool::new(false),
            handler: RwLock::new(None),
            client,
        });

        inner
            .transport
            .set_event_handler(Arc::new(SessionTransportHandler::new(Arc::downgrade(
                &inner,
            ))));

        debug!(
            "Session {} created with {} client-side tools",
            inner.local_id,
            inner.tools.len()
        );
        Self { inner }
    }

    /// Identity assigned by the service; empty until then.
    pub fn id(&self) -> String {
        self.inner.shared.lock().session_id.clone()
    }

    /// Client-local handle, stable from creation.
    pub fn local_id(&self) -> &str {
        &self.inner.local_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.shared.lock().state
    }

    /// Whether the handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.inner.shared.lock().connected
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Number of tools this session executes locally.
    pub fn tool_count(&self) -> usize {
        self.inner.tools.len()
    }

    /// Status of the underlying transport.
    pub fn transport_status(&self) -> ConnectionStatus {
        self.inner.transport.status()
    }

    /// Install the session observer.
    pub fn set_event_handler(&self, handler: Arc<dyn SessionEventHandler>) {
        *self.inner.handler.write() = Some(handler);
    }

    /// Take the oldest asynchronous error, if any.
    ///
    /// At most ten errors are retained; later ones are dropped until the slot
    /// is drained.
    pub fn try_recv_error(&self) -> Option<Error> {
        self.inner.error_rx.lock().try_recv().ok()
    }

    /// Connect and complete the handshake. Does nothing when already connected.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the transport cannot connect
    /// - [`Error::Timeout`] if the transport never becomes ready
    /// - the remote error if the service answers the handshake with an `error` envelope
    /// - [`Error::Cancelled`] if `cancel` fires first
    /// - [`Error::Session`] if the session is, or becomes, closed
    pub async fn connect(&self, cancel: &CancellationToken) -> Result<()> {
        let inner = &self.inner;
        let _guard = inner.connect_lock.lock().await;

        if inner.shared.lock().connected {
            return Ok(());
        }
        if inner.closed.is_cancelled() {
            return Err(Error::Session("session is closed".to_string()));
        }

        inner.set_state(SessionState::Initializing);
        inner.handshake.send_replace(Handshake::Pending);
        info!("Session {} connecting", inner.local_id);

        if let Err(e) = self.establish(cancel).await {
            warn!("Session {} failed to connect: {}", inner.local_id, e);
            inner.set_state(SessionState::Error);
            return Err(e);
        }

        let session_id = {
            let mut shared = inner.shared.lock();
            shared.connected = true;
            shared.state = SessionState::Ready;
            shared.session_id.clone()
        };
        info!(
            "Session {} ready (id '{}')",
            inner.local_id, session_id
        );

        if let Some(client) = inner.client() {
            client.notify_session_start(&session_id);
        }
        Ok(())
    }

    async fn establish(&self, cancel: &CancellationToken) -> Result<()> {
        let inner = &self.inner;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = inner.closed.cancelled() => return Err(closed_during_initialization()),
            result = async {
                inner.transport.connect().await?;
                inner.transport.wait_for_ready().await
            } => result?,
        }

        // close() may have run its disconnect while the dial was in flight.
        if inner.closed.is_cancelled() {
            if let Err(e) = inner.transport.disconnect().await {
                debug!("Session {} disconnect failed: {}", inner.local_id, e);
            }
            return Err(closed_during_initialization());
        }

        let init = OutgoingMessage::Init {
            payload: InitPayload::from_options(&inner.options),
        };
        inner.transport.send(init).await?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = inner.closed.cancelled() => Err(closed_during_initialization()),
            outcome = wait_for_handshake(inner.handshake.subscribe()) => outcome,
        }
    }

    /// Send a user turn, connecting first if needed. Does not wait for a reply.
    ///
    /// # Errors
    ///
    /// Any [`connect`](Self::connect) error, [`Error::Session`] on a closed
    /// session, or [`Error::Connection`] if the write fails.
    pub async fn send(&self, cancel: &CancellationToken, message: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Session("session is closed".to_string()));
        }
        if !self.is_connected() {
            self.connect(cancel).await?;
        }

        let session_id = {
            let mut shared = self.inner.shared.lock();
            shared.state = SessionState::Processing;
            if shared.session_id.is_empty() {
                UNKNOWN_SESSION_ID.to_string()
            } else {
                shared.session_id.clone()
            }
        };

        self.inner
            .transport
            .send(OutgoingMessage::user(session_id, message))
            .await?;
        Ok(())
    }

    /// Messages forwarded by the session, in arrival order.
    ///
    /// The stream ends when `cancel` fires, when the session closes, or right
    /// after yielding a `result` envelope (which also moves the session to
    /// [`SessionState::Completed`] but keeps the connection open). Concurrent
    /// streams share one buffer; each message goes to exactly one of them.
    pub fn stream(
        &self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = IncomingMessage> + Send + 'static {
        let inner = Arc::clone(&self.inner);

        futures::stream::unfold(Some((inner, cancel)), |state| async move {
            let (inner, cancel) = state?;

            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                _ = inner.closed.cancelled() => None,
                message = async { inner.inbound_rx.lock().await.recv().await } => message,
            }?;

            if message.is_result() {
                inner.set_state(SessionState::Completed);
                Some((message, None))
            } else {
                Some((message, Some((inner, cancel))))
            }
        })
    }

    /// Close the session. Only the first call has any effect.
    ///
    /// Sends a `control`/`close` envelope when connected, disconnects the
    /// transport, leaves the client registry and notifies the session handler.
    pub async fn close(&self) {
        self.inner.close().await;
    }
}

impl SessionInner {
    pub(crate) fn set_state(&self, state: SessionState) {
        self.shared.lock().state = state;
    }

    fn handler(&self) -> Option<Arc<dyn SessionEventHandler>> {
        self.handler.read().clone()
    }

    fn client(&self) -> Option<Arc<ClientInner>> {
        self.client.as_ref().and_then(Weak::upgrade)
    }

    /// Report a fault that no caller operation can return.
    pub(crate) fn handle_error(&self, error: Error) {
        warn!("Session {} error: {}", self.local_id, error);
        if self.error_tx.try_send(error.clone()).is_err() {
            debug!("Session {} error slot full, dropping error", self.local_id);
        }
        if let Some(client) = self.client() {
            client.notify_error(&error);
        }
        if let Some(handler) = self.handler() {
            handler.on_error(&error);
        }
    }

    /// Resolve the handshake unless it already has an outcome.
    pub(crate) fn signal_handshake(&self, outcome: Handshake) {
        self.handshake.send_if_modified(|current| {
            if current.is_pending() {
                *current = outcome;
                true
            } else {
                false
            }
        });
    }

    pub(crate) async fn close(&self) {
        if self.close_started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.closed.cancel();
        info!("Session {} closing", self.local_id);

        if self.transport.is_connected() {
            if let Err(e) = self
                .transport
                .send(OutgoingMessage::control(ControlAction::Close))
                .await
            {
                debug!("Session {} close notice not sent: {}", self.local_id, e);
            }
        }
        if let Err(e) = self.transport.disconnect().await {
            debug!("Session {} disconnect failed: {}", self.local_id, e);
        }

        let session_id = self.shared.lock().session_id.clone();
        if let Some(client) = self.client() {
            client.remove_session(&self.local_id, &session_id);
        }
        if let Some(handler) = self.handler() {
            handler.on_close();
        }
    }
}

fn closed_during_initialization() -> Error {
    Error::Session("session closed during initialization".to_string())
}

async fn wait_for_handshake(mut handshake: watch::Receiver<Handshake>) -> Result<()> {
    loop {
        {
            let current = handshake.borrow_and_update();
            match &*current {
                Handshake::Ready => return Ok(()),
                Handshake::Failed(error) => return Err(error.clone()),
                Handshake::Pending => {}
            }
        }
        if handshake.changed().await.is_err() {
            return Err(Error::Session("session dropped during initialization".to_string()));
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.inner.shared.lock();
        f.debug_struct("Session")
            .field("local_id", &self.inner.local_id)
            .field("session_id", &shared.session_id)
            .field("state", &shared.state)
            .field("connected", &shared.connected)
            .field("tools", &self.inner.tools)
            .finish()
    }
}
