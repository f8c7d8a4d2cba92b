//! MCP Server protocol implementation
//!
//! This module handles the MCP JSON-RPC protocol over stdio: one request per
//! line in, one response per line out. Notifications (requests without an
//! `id`) are processed but never answered.

use monoliet_core::{Envelope, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::error::{McpError, McpResult};
use crate::{SERVER_INSTRUCTIONS, SERVER_NAME, SERVER_VERSION};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct MCPRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// MCP JSON-RPC response
#[derive(Debug, Serialize, Deserialize)]
pub struct MCPResponse {
    pub jsonrpc: String,
    /// `null` when the request id could not be read
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
}

impl MCPResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, err: &McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(MCPError {
                code: err.error_code(),
                message: err.to_string(),
            }),
        }
    }
}

/// MCP server over a tool registry
pub struct McpServer {
    tools: ToolRegistry,
}

impl McpServer {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the MCP server over stdio until EOF or `shutdown`
    pub async fn run_stdio(&self, shutdown: CancellationToken) -> McpResult<()> {
        tracing::info!("MCP server ready, listening on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout, shutdown).await
    }

    /// Serve newline-delimited JSON-RPC from `reader` to `writer`
    pub async fn serve<R, W>(&self, reader: R, mut writer: W, shutdown: CancellationToken) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, closing stdio transport");
                    break;
                }
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                tracing::info!("stdin closed");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one raw input line
    pub async fn handle_line(&self, line: &str) -> Option<MCPResponse> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable JSON-RPC line");
                return Some(MCPResponse::failure(Value::Null, &McpError::Parse(e.to_string())));
            }
        };

        let id = raw.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<MCPRequest>(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(MCPResponse::failure(id, &McpError::InvalidRequest(e.to_string()))),
        }
    }

    /// Handle an MCP request; `None` for notifications
    pub async fn handle_request(&self, request: MCPRequest) -> Option<MCPResponse> {
        tracing::debug!(method = %request.method, "MCP request");

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(request.params).await,
            method if method.starts_with("notifications/") => Ok(Value::Null),
            method => Err(McpError::MethodNotFound(method.to_string())),
        };

        let id = request.id?;
        Some(match result {
            Ok(value) => MCPResponse::success(id, value),
            Err(err) => MCPResponse::failure(id, &err),
        })
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            },
            "capabilities": {
                "tools": {}
            },
            "instructions": SERVER_INSTRUCTIONS
        })
    }

    fn handle_tools_list(&self) -> Value {
        json!({ "tools": self.tools.definitions() })
    }

    async fn handle_tools_call(&self, params: Value) -> McpResult<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::InvalidParams("missing tool name".to_string()))?
            .to_string();

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let Some(envelope) = self.tools.call(&name, arguments).await else {
            tracing::error!(tool = %name, "Unknown tool");
            return Ok(tool_content(format!("Error: Unknown tool: {}", name), true));
        };

        Ok(tool_content(render_envelope(&envelope)?, !envelope.success))
    }
}

/// Text shown to the agent for one tool outcome
pub fn render_envelope(envelope: &Envelope) -> McpResult<String> {
    match (&envelope.data, &envelope.error) {
        (_, Some(error)) => Ok(format!("Error ({}): {}", error.kind, error.message)),
        (Some(data), None) => Ok(serde_json::to_string_pretty(data)?),
        (None, None) => Ok("{}".to_string()),
    }
}

fn tool_content(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error
    })
}
