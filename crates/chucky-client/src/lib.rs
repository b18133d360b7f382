//! # Chucky Client
//!
//! Sessions and the client registry for the Chucky assistant service.
//!
//! A [`Session`] is one conversation over one persistent connection. It sends
//! the `init` declaration, completes the handshake, forwards service messages
//! to a [`stream`](Session::stream), and answers `tool_call` requests by running
//! locally registered tools. A [`Client`] creates sessions from shared
//! [`ClientOptions`] and reports their start, end and background faults.
//!
//! ```rust,no_run
//! use chucky_client::{Client, ClientOptions};
//! use chucky_protocol::{IncomingMessage, SessionOptions};
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientOptions::from_env()?);
//! let session = client.create_session(SessionOptions::default().with_model("claude-sonnet-4-5"));
//! let cancel = CancellationToken::new();
//!
//! session.send(&cancel, "Summarise the README").await?;
//! let mut messages = Box::pin(session.stream(cancel.clone()));
//! while let Some(message) = messages.next().await {
//!     if let IncomingMessage::Assistant(reply) = &message {
//!         println!("{}", reply.text());
//!     }
//! }
//! session.close().await;
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod handlers;
pub mod session;
pub mod tools;

pub use client::Client;
pub use config::{ClientOptions, ConfigError};
pub use handlers::{ClientEventHandler, SessionEventHandler};
pub use session::{Session, SessionState};
pub use tools::ToolRegistry;
