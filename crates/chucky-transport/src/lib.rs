//! # Chucky Transport
//!
//! Persistent WebSocket transport for Chucky sessions.
//!
//! The [`Transport`] trait is the seam between a session and its connection;
//! [`WebSocketTransport`] is the production implementation. Inbound frames,
//! status changes, closes and background faults are delivered to a single
//! [`TransportEventHandler`] running on the transport's reader task.
//!
//! ## Features
//!
//! - **Send queue**: messages sent while connecting are queued and flushed in order
//! - **Keep-alive**: periodic `ping` envelopes on an idle connection
//! - **Lenient decoding**: malformed frames are reported and skipped, never fatal
//! - **Wire logging**: raw payloads logged on the `chucky_transport::wire` target in debug mode
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chucky_protocol::{ControlAction, OutgoingMessage};
//! use chucky_transport::{Transport, TransportEventEmitter, WebSocketTransport, WebSocketTransportConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WebSocketTransportConfig::new("wss://conjure.chucky.cloud/ws", "token");
//! let transport = WebSocketTransport::new(config);
//!
//! let (emitter, mut events) = TransportEventEmitter::new();
//! transport.set_event_handler(Arc::new(emitter));
//!
//! transport.connect().await?;
//! transport.send(OutgoingMessage::control(ControlAction::EndInput)).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! chucky-transport/
//! ├── config.rs        # Endpoint, credential and timing configuration
//! ├── error.rs         # TransportError and conversion into the SDK error
//! ├── events.rs        # Event handler capability and channel-backed emitter
//! ├── traits.rs        # Transport trait
//! ├── types.rs         # Connection status
//! └── websocket/
//!     ├── types.rs      # Transport state
//!     ├── connection.rs # Connect, disconnect, send queue
//!     ├── tasks.rs      # Reader and keep-alive tasks
//!     └── transport.rs  # Transport trait implementation
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;
pub mod websocket;

pub use config::WebSocketTransportConfig;
pub use error::{TransportError, TransportResult};
pub use events::{TransportEvent, TransportEventEmitter, TransportEventHandler};
pub use traits::Transport;
pub use types::ConnectionStatus;
pub use websocket::WebSocketTransport;
