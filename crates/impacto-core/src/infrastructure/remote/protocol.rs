//! Wire types for the documentation tool's stdio protocol
//!
//! One JSON-RPC style request is written per process; the response is read
//! from everything the process prints before exiting.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// Longest slice of raw output quoted in parse errors
const PREVIEW_LEN: usize = 200;

/// Request sent to the documentation tool
#[derive(Debug, Clone, Serialize)]
pub struct RemoteRequest {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl RemoteRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Uuid::new_v4().to_string(),
            method: method.into(),
            params,
        }
    }

    pub fn list_tools() -> Self {
        Self::new(METHOD_TOOLS_LIST, json!({}))
    }

    pub fn call_tool(tool: &str, query: &str) -> Self {
        Self::new(
            METHOD_TOOLS_CALL,
            json!({ "name": tool, "arguments": { "query": query } }),
        )
    }

    /// Serialize as a single newline-terminated line
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)
            .map_err(|e| Error::Other(format!("Failed to encode request: {e}")))?;
        line.push('\n');
        Ok(line)
    }
}

/// Error object of a rejected request
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RemoteErrorBody>,
}

impl RemoteResponse {
    fn is_envelope(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }

    fn answers(&self, request_id: &str) -> bool {
        matches!(&self.id, Some(Value::String(id)) if id == request_id)
    }

    /// The `result` payload, or the remote's rejection
    pub fn into_result(self) -> Result<Value> {
        if let Some(error) = self.error {
            return Err(Error::RemoteRejected {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| Error::RemoteParse("response has neither result nor error".into()))
    }
}

/// A documentation tool advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// Text one tool returned for a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    pub tool_name: String,
    pub content: String,
}

fn preview(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(PREVIEW_LEN) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Locate the response to `request_id` in the raw stdout of the tool
///
/// Tools may log to stdout before answering, so each line is tried in turn:
/// the line carrying the request id wins, then the first envelope-shaped
/// line, then the whole stream parsed as one document.
pub fn parse_response(raw: &str, request_id: &str) -> Result<RemoteResponse> {
    let mut envelopes: Vec<RemoteResponse> = raw
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .filter_map(|line| serde_json::from_str::<RemoteResponse>(line).ok())
        .filter(RemoteResponse::is_envelope)
        .collect();

    if let Some(index) = envelopes.iter().position(|r| r.answers(request_id)) {
        return Ok(envelopes.swap_remove(index));
    }
    if let Some(first) = envelopes.into_iter().next() {
        return Ok(first);
    }

    match serde_json::from_str::<RemoteResponse>(raw) {
        Ok(response) if response.is_envelope() => Ok(response),
        Ok(_) => Err(Error::RemoteParse(format!(
            "no result in response: {}",
            preview(raw)
        ))),
        Err(e) => Err(Error::RemoteParse(format!("{e}: {}", preview(raw)))),
    }
}

/// Decode the `tools/list` result: `{"tools": [...]}` or a bare array
pub fn parse_tools(result: Value) -> Result<Vec<Tool>> {
    let tools = match result {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map
            .remove("tools")
            .ok_or_else(|| Error::RemoteParse("tools/list result has no `tools` field".into()))?,
        other => {
            return Err(Error::RemoteParse(format!(
                "unexpected tools/list result: {other}"
            )));
        }
    };
    serde_json::from_value(tools).map_err(|e| Error::RemoteParse(format!("invalid tool list: {e}")))
}

/// Flatten a `tools/call` result into plain text
///
/// Accepts a bare string, an MCP content object, or an array of strings /
/// content items. A content object flagged `isError` is a rejection.
pub fn extract_text(result: &Value) -> Result<String> {
    match result {
        Value::String(text) => Ok(text.clone()),
        Value::Null => Ok(String::new()),
        Value::Array(items) => Ok(join_items(items)),
        Value::Object(map) => {
            let text = match map.get("content") {
                Some(Value::Array(items)) => join_items(items),
                Some(Value::String(text)) => text.clone(),
                _ => map
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            };
            if map.get("isError").and_then(Value::as_bool).unwrap_or(false) {
                return Err(Error::RemoteRejected {
                    code: 0,
                    message: text,
                });
            }
            Ok(text)
        }
        other => Ok(other.to_string()),
    }
}

fn join_items(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text.as_str()),
            Value::Object(map) => map.get("text").and_then(Value::as_str),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
