//! Conversation session and the tool-calling loop.

use crate::model::{Backend, Message, ModelRequest, Part, ToolResult, Usage};
use crate::tools::args::{check_required, decode_arguments, render_arguments};
use crate::tools::{ToolError, ToolHost};
use crate::{Error, Result};
use tracing::{debug, info};

/// Default cap on tool rounds per query.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 10;

/// A conversation session.
///
/// Owns the message history for the life of the process. History only grows;
/// a failed turn leaves whatever it appended in place.
pub struct Session<B, H> {
    backend: B,
    tools: H,
    system: Option<String>,
    messages: Vec<Message>,
    max_tool_rounds: u32,
    usage: Usage,
}

impl<B: Backend, H: ToolHost> Session<B, H> {
    /// Create a new session over the given backend and tool host.
    pub fn new(backend: B, tools: H) -> Self {
        Self {
            backend,
            tools,
            system: None,
            messages: Vec::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            usage: Usage::default(),
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the maximum number of tool rounds a single query may take.
    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Conversation history in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Token usage accumulated over the session.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn tool_host(&self) -> &H {
        &self.tools
    }

    /// Consume the session, returning its tool host.
    pub fn into_tool_host(self) -> H {
        self.tools
    }

    /// Answer a user query, running tool calls until the model stops
    /// requesting them.
    ///
    /// Returns every text fragment produced along the way, including one
    /// `[Calling tool <name> with args <args>]` line per tool call, joined by
    /// newlines in emission order.
    pub async fn respond(&mut self, query: &str) -> Result<String> {
        self.messages.push(Message::user(query));

        let specs = self.tools.list_tools().await?;
        debug!(tools = specs.len(), "fetched tool catalog");

        let mut fragments: Vec<String> = Vec::new();
        let mut rounds = 0u32;

        loop {
            let response = self
                .backend
                .call(ModelRequest {
                    system: self.system.as_deref(),
                    messages: &self.messages,
                    tools: &specs,
                })
                .await?;
            self.usage += response.usage;

            let mut message = response.message;
            message
                .parts
                .retain(|part| !matches!(part, Part::Text(text) if text.is_empty()));
            let calls = message.tool_calls();

            if !calls.is_empty() {
                rounds += 1;
                if rounds > self.max_tool_rounds {
                    return Err(Error::ToolLoopExceeded {
                        rounds: self.max_tool_rounds,
                    });
                }
            }

            fragments.extend(message.parts.iter().filter_map(|part| match part {
                Part::Text(text) => Some(text.clone()),
                _ => None,
            }));
            // Providers reject replayed assistant turns with no content.
            if !message.parts.is_empty() {
                self.messages.push(message);
            }

            if calls.is_empty() {
                break;
            }

            for call in calls {
                let arguments = decode_arguments(&call.name, &call.input)?;
                let spec = specs
                    .iter()
                    .find(|spec| spec.name == call.name)
                    .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
                check_required(spec, &arguments)?;

                let rendered = render_arguments(&arguments);
                info!(tool = %call.name, args = %rendered, round = rounds, "calling tool");

                let output = self.tools.call_tool(&call.name, arguments).await?;
                self.messages
                    .push(Message::tool_result(ToolResult::new(call.id, output)));
                fragments.push(format!("[Calling tool {} with args {rendered}]", call.name));
            }
        }

        Ok(fragments.join("\n"))
    }
}
