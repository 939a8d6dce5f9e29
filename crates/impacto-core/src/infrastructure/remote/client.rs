//! Per-call subprocess client for the documentation tool

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::RemoteConfig;
use crate::error::{Error, Result};

use super::KnowledgeSource;
use super::protocol::{self, DocEntry, RemoteRequest, Tool};

/// Default hard limit for one request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest stderr tail attached to a process error
const MAX_STDERR_CHARS: usize = 2000;

/// Answers containing this marker are tool-side failures
const TOOL_ERROR_MARKER: &str = "Error:";

/// Spawns the documentation tool once per request
///
/// The process is started as `command [args..] [tool_path]`, receives one
/// request line on stdin, and is expected to print its response and exit.
/// A process still running at the deadline is killed.
#[derive(Debug, Clone)]
pub struct RemoteKnowledgeClient {
    command: String,
    args: Vec<String>,
    tool_path: Option<PathBuf>,
    request_timeout: Duration,
}

impl RemoteKnowledgeClient {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            tool_path: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_config(config: &RemoteConfig) -> Self {
        let client = Self::new(config.command.clone())
            .with_args(config.args.clone())
            .with_timeout(Duration::from_millis(config.request_timeout_ms));
        match config.tool_path.as_deref() {
            Some(path) if !path.trim().is_empty() => client.with_tool_path(path),
            _ => client,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_tool_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tool_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Call one tool with a search query and return its text answer
    pub async fn call_tool(&self, tool: &str, query: &str) -> Result<String> {
        let result = self.send(RemoteRequest::call_tool(tool, query)).await?;
        protocol::extract_text(&result)
    }

    async fn send(&self, request: RemoteRequest) -> Result<Value> {
        let line = request.to_line()?;

        let mut command = Command::new(&self.command);
        command.args(&self.args);
        if let Some(path) = &self.tool_path {
            command.arg(path);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            method = %request.method,
            request_id = %request.id,
            command = %self.command,
            "Spawning documentation tool"
        );
        let mut child = command.spawn()?;

        let (Some(mut stdin), Some(mut stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(Error::Other(
                "Documentation tool started without piped stdio".into(),
            ));
        };

        let exchange = async {
            let write = async move {
                match stdin.write_all(line.as_bytes()).await {
                    // the tool may answer without reading its input
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            };
            let mut out = Vec::new();
            let mut err = Vec::new();
            let (written, read_out, read_err) = tokio::join!(
                write,
                stdout.read_to_end(&mut out),
                stderr.read_to_end(&mut err)
            );
            written?;
            read_out?;
            read_err?;
            let status = child.wait().await?;
            Ok::<(ExitStatus, Vec<u8>, Vec<u8>), std::io::Error>((status, out, err))
        };

        let outcome = timeout(self.request_timeout, exchange).await;
        let (status, out, err) = match outcome {
            Ok(finished) => finished?,
            Err(_) => {
                let millis = self.request_timeout.as_millis() as u64;
                warn!(
                    method = %request.method,
                    timeout_ms = millis,
                    "Documentation tool timed out; killing it"
                );
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill documentation tool");
                }
                return Err(Error::RemoteTimeout(millis));
            }
        };

        if !status.success() {
            return Err(Error::RemoteProcess {
                exit_code: status.code(),
                stderr: stderr_tail(&err),
            });
        }

        let raw = String::from_utf8_lossy(&out);
        let response = protocol::parse_response(&raw, &request.id)?;
        debug!(method = %request.method, request_id = %request.id, "Documentation tool answered");
        response.into_result()
    }
}

fn stderr_tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    let count = text.chars().count();
    if count <= MAX_STDERR_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - MAX_STDERR_CHARS).collect();
    format!("...{tail}")
}

#[async_trait]
impl KnowledgeSource for RemoteKnowledgeClient {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result = self.send(RemoteRequest::list_tools()).await?;
        let tools = protocol::parse_tools(result)?;
        debug!(count = tools.len(), "Discovered documentation tools");
        Ok(tools)
    }

    async fn search_documentation(&self, term: &str) -> Result<Vec<DocEntry>> {
        let tools = self.list_tools().await?;
        let mut entries = Vec::new();

        for tool in &tools {
            match self.call_tool(&tool.name, term).await {
                Ok(content) if content.trim().is_empty() => {
                    debug!(tool = %tool.name, term, "Tool returned no documentation");
                }
                Ok(content) if content.contains(TOOL_ERROR_MARKER) => {
                    warn!(tool = %tool.name, term, "Tool reported an error; skipping");
                }
                Ok(content) => entries.push(DocEntry {
                    tool_name: tool.name.clone(),
                    content,
                }),
                Err(e) => {
                    warn!(tool = %tool.name, term, error = %e, "Documentation tool failed; skipping");
                }
            }
        }

        info!(
            term,
            tools = tools.len(),
            entries = entries.len(),
            "Documentation search complete"
        );
        Ok(entries)
    }
}
