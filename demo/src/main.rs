//! Chucky demo: one session, one client-side calculator tool.
//!
//! Reads `CHUCKY_TOKEN` (and optionally `CHUCKY_BASE_URL`) from the
//! environment, asks the assistant to do some arithmetic and prints the
//! streamed answer. Logs go to stderr; set `RUST_LOG=chucky_transport::wire=debug`
//! together with `CHUCKY_DEBUG=true` to see raw frames.

use chucky::prelude::*;
use futures::StreamExt;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn calculator() -> McpClientToolsServer {
    let multiply = ToolDefinition::new("multiply", "Multiply two numbers")
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "a": {"type": "number"},
                "b": {"type": "number"}
            },
            "required": ["a", "b"]
        }))
        .with_handler(|input: ToolInput| async move {
            let operand = |name: &str| {
                input
                    .get(name)
                    .and_then(|v| v.as_f64())
                    .ok_or_else(|| ToolError::InvalidInput(format!("missing number '{name}'")))
            };
            let product = operand("a")? * operand("b")?;
            info!("multiply -> {}", product);
            Ok::<_, ToolError>(ToolResult::text(product.to_string()))
        });

    McpClientToolsServer::new("calculator", "1.0.0").with_tool(multiply)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = Client::new(ClientOptions::from_env()?);
    let session = client.create_session(
        SessionOptions::default()
            .with_model("claude-sonnet-4-5")
            .with_max_turns(5)
            .with_mcp_server(calculator()),
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    session
        .send(&cancel, "Use the multiply tool to compute 6.5 times 7.")
        .await?;

    let mut messages = Box::pin(session.stream(cancel.clone()));
    while let Some(message) = messages.next().await {
        match message {
            IncomingMessage::Assistant(reply) => {
                let text = reply.text();
                if !text.is_empty() {
                    println!("{text}");
                }
            }
            IncomingMessage::Result(result) => {
                info!(
                    "Finished in {} turns, {} ms, ${:.4}",
                    result.num_turns, result.duration_ms, result.total_cost_usd
                );
                if result.is_error {
                    warn!("Prompt failed: {:?}", result.errors);
                }
            }
            IncomingMessage::Error(error) => warn!("Service error: {}", error.message),
            _ => {}
        }
    }

    while let Some(error) = session.try_recv_error() {
        warn!("Background error: {}", error);
    }
    client.close().await;
    Ok(())
}
