//! Line-delimited JSON-RPC server loop.
//!
//! Each input line is one request or notification; each request produces
//! exactly one response line. Stdout carries nothing but protocol frames.

use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use vvmcp_core::SpeechPort;

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
use crate::tools::{call_tool, tool_descriptors};

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "vvmcp";

/// Errors that end the server loop.
#[derive(Debug, Error)]
pub enum McpServerError {
    #[error("MCP transport IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// MCP server exposing the speech tools.
pub struct McpServer {
    port: Arc<dyn SpeechPort>,
}

impl McpServer {
    pub fn new(port: Arc<dyn SpeechPort>) -> Self {
        Self { port }
    }

    /// Serve until `reader` reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), McpServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut frame = serde_json::to_string(&response)?;
                frame.push('\n');
                writer.write_all(frame.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        tracing::info!("MCP client closed the connection");
        Ok(())
    }

    /// Handle one raw input line; `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable JSON-RPC frame");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(e),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::failure(id, JsonRpcError::invalid_request(e))),
        }
    }

    /// Handle a decoded request; `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification");
            return None;
        }

        let id = request.id.unwrap_or(Value::Null);
        tracing::debug!(method = %request.method, %id, "Request");

        let result = match request.method.as_str() {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_descriptors() })),
            "tools/call" => call_tool(self.port.as_ref(), request.params)
                .await
                .and_then(|result| serde_json::to_value(result).map_err(JsonRpcError::internal)),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": { "listChanged": false }
        }
    })
}

/// Serve on the process's stdin/stdout.
pub async fn serve_stdio(port: Arc<dyn SpeechPort>) -> Result<(), McpServerError> {
    tracing::info!(protocol = PROTOCOL_VERSION, "MCP server listening on stdio");
    McpServer::new(port)
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
