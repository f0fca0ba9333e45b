//! Skiff runtime: the conversation driver.
//!
//! This crate holds a conversation with an LLM provider and lets the model
//! call tools published by an MCP server.
//!
//! # Overview
//!
//! - **Session**: owns the message history and runs the tool-calling loop.
//! - **Backend**: a trait abstracting LLM providers (Anthropic, OpenAI). Each
//!   backend adapts the tool catalog, history and responses to its wire format.
//! - **ToolHost**: a trait for anything that lists and invokes tools;
//!   [`McpToolHost`] talks to an MCP server over a child process's stdio.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{AnthropicBackend, McpToolHost, Session};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = AnthropicBackend::builder("sk-ant-api01-...", "claude-sonnet-4-20250514").build();
//! let tools = McpToolHost::spawn("./target/release/skiff-reddit").await?;
//!
//! let mut session = Session::new(backend, tools).with_system("Be concise.");
//! let response = session.respond("What is r/rust saying about async traits?").await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
pub mod providers;
mod session;
pub mod tools;

pub use error::{Error, Result};
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolResult,
    ToolSpec, Usage,
};
pub use providers::{AnthropicBackend, OpenAiBackend};
pub use session::{DEFAULT_MAX_TOOL_ROUNDS, Session};
pub use tools::{McpClient, McpToolHost, ToolError, ToolHost};
