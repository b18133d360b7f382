//! WebSocket implementation of [`Transport`](crate::Transport).

mod connection;
mod tasks;
mod transport;
mod types;

pub use types::WebSocketTransport;
