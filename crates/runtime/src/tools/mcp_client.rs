//! MCP (Model Context Protocol) client integration.
//!
//! This module provides MCP server management using the official rmcp SDK.
//!
//! # Example
//!
//! ```ignore
//! use runtime::McpClient;
//!
//! # async fn example() -> Result<(), runtime::ToolError> {
//! let client = McpClient::spawn_script("./target/release/skiff-reddit").await?;
//!
//! let tools = client.list_tools().await?;
//! for tool in &tools {
//!     println!("Tool: {}", tool.name);
//! }
//! # Ok(())
//! # }
//! ```

use super::ToolError;
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, CallToolResult, Tool},
    service::{RoleClient, RunningService},
    transport::{ConfigureCommandExt, IntoTransport, TokioChildProcess},
};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// An MCP client connected to a server process.
pub struct McpClient {
    service: RunningService<RoleClient, ()>,
}

impl McpClient {
    /// Spawn an MCP server and connect to it.
    ///
    /// # Arguments
    ///
    /// * `command` - The command to run (e.g., "skiff-reddit")
    /// * `args` - Arguments to pass to the command
    pub async fn spawn(
        command: impl AsRef<str>,
        args: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, ToolError> {
        let command_str = command.as_ref().to_string();
        let args_vec: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        debug!(command = %command_str, args = ?args_vec, "spawning MCP server");

        let transport = TokioChildProcess::new(Command::new(&command_str).configure(|cmd| {
            for arg in &args_vec {
                cmd.arg(arg);
            }
        }))
        .map_err(|e| ToolError::Transport(format!("failed to spawn {command_str}: {e}")))?;

        Self::connect(transport).await
    }

    /// Connect over an already-established transport.
    pub async fn connect<T, E, A>(transport: T) -> Result<Self, ToolError>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let service = ()
            .serve(transport)
            .await
            .map_err(|e| ToolError::Transport(format!("failed to initialize MCP session: {e}")))?;

        if let Some(info) = service.peer_info() {
            info!(server = %info.server_info.name, "connected to MCP server");
        }

        Ok(Self { service })
    }

    /// Spawn a server given the path to its executable or script.
    ///
    /// `.py` scripts run under `python`, `.js` scripts under `node`, and
    /// anything else is executed directly.
    pub async fn spawn_script(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        let (command, args) = server_command(path.as_ref());
        Self::spawn(command, args).await
    }

    /// List available tools from the server.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, ToolError> {
        let response = self
            .service
            .list_tools(Default::default())
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        Ok(response.tools)
    }

    /// Call a tool with the given name and arguments.
    pub async fn call_tool(
        &self,
        name: impl Into<String>,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<CallToolResult, ToolError> {
        let params = CallToolRequestParams {
            name: name.into().into(),
            arguments,
            meta: None,
            task: None,
        };

        self.service
            .call_tool(params)
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))
    }

    /// Shutdown the client and terminate the server process.
    pub async fn shutdown(self) -> Result<(), ToolError> {
        self.service
            .cancel()
            .await
            .map(|reason| debug!(?reason, "MCP client stopped"))
            .map_err(|e| ToolError::Transport(e.to_string()))
    }
}

/// Resolve the command line used to launch a server at `path`.
pub(crate) fn server_command(path: &Path) -> (String, Vec<String>) {
    let target = path.to_string_lossy().into_owned();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("py") => ("python".to_string(), vec![target]),
        Some("js") => ("node".to_string(), vec![target]),
        _ => (target, Vec::new()),
    }
}
