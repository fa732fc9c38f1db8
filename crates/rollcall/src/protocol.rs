//! MCP protocol layer.
//!
//! JSON-RPC 2.0 request/response types and the method dispatcher. Tool
//! failures are reported inside the result envelope, never as JSON-RPC
//! errors; JSON-RPC errors are reserved for protocol-level problems
//! (unknown method, unknown tool, unparseable input).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::tools::Registry;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC request wrapper. A missing id marks a notification.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response wrapper
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Handle one line from the transport.
/// Returns None for notifications - no response is owed.
pub fn handle_line(registry: &Registry, line: &str) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return Some(JsonRpcResponse::error(
                None,
                -32700,
                format!("Parse error: {e}"),
            ))
        }
    };

    if request.id.is_none() {
        debug!(method = %request.method, "notification");
        return None;
    }

    Some(handle_request(registry, request))
}

/// Dispatch a single JSON-RPC request.
pub fn handle_request(registry: &Registry, request: JsonRpcRequest) -> JsonRpcResponse {
    debug!("MCP request: {} {:?}", request.method, request.params);

    match request.method.as_str() {
        "initialize" => handle_initialize(request.id),
        "tools/list" => handle_tools_list(registry, request.id),
        "tools/call" => handle_tools_call(registry, request.id, request.params),
        "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),
        _ => JsonRpcResponse::error(
            request.id,
            -32601,
            format!("Method not found: {}", request.method),
        ),
    }
}

fn handle_initialize(id: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "rollcall",
                "version": env!("CARGO_PKG_VERSION"),
            }
        }),
    )
}

fn handle_tools_list(registry: &Registry, id: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse::success(id, serde_json::json!({ "tools": registry.tool_listing() }))
}

fn handle_tools_call(registry: &Registry, id: Option<Value>, params: Value) -> JsonRpcResponse {
    let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(Value::Object(Default::default()));

    info!(tool = %name, "Tool call");

    let envelope = match registry.call(name, &arguments) {
        Some(envelope) => envelope,
        None => {
            return JsonRpcResponse::error(id, -32602, format!("Unknown tool: {name}"));
        }
    };

    let is_error = !envelope.success;
    let text = serde_json::to_string_pretty(&envelope).unwrap_or_default();
    JsonRpcResponse::success(
        id,
        serde_json::json!({
            "content": [{
                "type": "text",
                "text": text,
            }],
            "isError": is_error,
        }),
    )
}
