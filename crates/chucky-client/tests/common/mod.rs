//! Scripted single-connection service used by the session tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum Received {
    Json(Value),
    Closed,
}

pub struct MockService {
    pub url: String,
    query: Arc<Mutex<Option<String>>>,
    received: mpsc::UnboundedReceiver<Received>,
    outgoing: mpsc::UnboundedSender<Option<String>>,
}

impl MockService {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let query = Arc::new(Mutex::new(None));
        let (received_tx, received) = mpsc::unbounded_channel();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Option<String>>();

        let query_slot = Arc::clone(&query);
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                *query_slot.lock().unwrap() = req.uri().query().map(str::to_string);
                Ok(resp)
            };
            let ws = accept_hdr_async(stream, callback).await.unwrap();
            let (mut write, mut read) = ws.split();

            loop {
                tokio::select! {
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            let value = serde_json::from_str(text.as_str()).unwrap();
                            let _ = received_tx.send(Received::Json(value));
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                            let _ = received_tx.send(Received::Closed);
                            break;
                        }
                        Some(Ok(_)) => {}
                    },
                    outgoing = outgoing_rx.recv() => match outgoing {
                        Some(Some(text)) => {
                            let _ = write.send(Message::text(text)).await;
                        }
                        Some(None) | None => break,
                    },
                }
            }
        });

        Self {
            url: format!("ws://{}/ws", addr),
            query,
            received,
            outgoing,
        }
    }

    pub fn query(&self) -> Option<String> {
        self.query.lock().unwrap().clone()
    }

    pub fn send_json(&self, value: Value) {
        let _ = self.outgoing.send(Some(value.to_string()));
    }

    pub fn send_text(&self, text: &str) {
        let _ = self.outgoing.send(Some(text.to_string()));
    }

    /// Drop the socket without a close handshake.
    pub fn drop_connection(&self) {
        let _ = self.outgoing.send(None);
    }

    pub async fn next(&mut self) -> Received {
        tokio::time::timeout(WAIT, self.received.recv())
            .await
            .expect("service timed out waiting for a frame")
            .expect("service task ended")
    }

    pub async fn next_json(&mut self) -> Value {
        match self.next().await {
            Received::Json(value) => value,
            Received::Closed => panic!("connection closed while waiting for a frame"),
        }
    }

    /// Next frame of the given type, skipping keep-alive pings.
    pub async fn expect(&mut self, message_type: &str) -> Value {
        loop {
            let value = self.next_json().await;
            if value["type"] == "ping" {
                continue;
            }
            assert_eq!(value["type"], message_type, "unexpected frame: {value}");
            return value;
        }
    }

    /// Wait for `init` and answer with `control`/`ready`.
    pub async fn accept_init(&mut self) -> Value {
        let init = self.expect("init").await;
        self.send_json(json!({"type": "control", "payload": {"action": "ready"}}));
        init
    }

    /// Wait for the peer to close, returning every frame seen before it.
    pub async fn until_closed(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        loop {
            match self.next().await {
                Received::Json(value) => frames.push(value),
                Received::Closed => return frames,
            }
        }
    }
}

/// Wait until `condition` holds; handler callbacks run on the reader task.
pub async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub fn system_init(session_id: &str) -> Value {
    json!({
        "type": "system",
        "subtype": "init",
        "uuid": "sys-1",
        "session_id": session_id,
        "data": {"cwd": "/workspace", "tools": ["Read"], "model": "claude-sonnet-4-5"}
    })
}

pub fn assistant(session_id: &str, text: &str) -> Value {
    json!({
        "type": "assistant",
        "uuid": "asst-1",
        "session_id": session_id,
        "message": {"role": "assistant", "content": [{"type": "text", "text": text}]}
    })
}

pub fn success(session_id: &str, text: &str) -> Value {
    json!({
        "type": "result",
        "subtype": "success",
        "uuid": "res-1",
        "session_id": session_id,
        "duration_ms": 1200,
        "duration_api_ms": 900,
        "is_error": false,
        "num_turns": 1,
        "result": text,
        "total_cost_usd": 0.0021,
        "usage": {"input_tokens": 12, "output_tokens": 5}
    })
}

pub fn tool_call(call_id: &str, tool_name: &str, input: Value) -> Value {
    json!({
        "type": "tool_call",
        "payload": {"callId": call_id, "toolName": tool_name, "input": input}
    })
}
