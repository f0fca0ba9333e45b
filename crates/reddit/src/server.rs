//! MCP server exposing the content tools.

use crate::api::ContentApi;
use crate::tools::{
    ContentTools, GetSubmissionCommentsArgs, SearchCommentsInPostsArgs, SearchPostsArgs,
};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

pub const SERVER_NAME: &str = "reddit";

#[derive(Clone)]
pub struct RedditServer {
    tools: ContentTools,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl RedditServer {
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self {
            tools: ContentTools::new(api),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Search Reddit posts. Returns id, title, selftext, url, score, \
                          num_comments and created_utc for each post.")]
    async fn search_posts(
        &self,
        Parameters(args): Parameters<SearchPostsArgs>,
    ) -> Result<CallToolResult, McpError> {
        into_result("search_posts", self.tools.search_posts(args).await)
    }

    #[tool(description = "Fetch the comments of a Reddit post, top-level comments first.")]
    async fn get_submission_comments(
        &self,
        Parameters(args): Parameters<GetSubmissionCommentsArgs>,
    ) -> Result<CallToolResult, McpError> {
        into_result(
            "get_submission_comments",
            self.tools.get_submission_comments(args).await,
        )
    }

    #[tool(description = "Search Reddit posts and return each post together with its comments.")]
    async fn search_comments_in_posts(
        &self,
        Parameters(args): Parameters<SearchCommentsInPostsArgs>,
    ) -> Result<CallToolResult, McpError> {
        into_result(
            "search_comments_in_posts",
            self.tools.search_comments_in_posts(args).await,
        )
    }
}

/// Tool failures are reported in-band so the caller sees the message.
fn into_result<T: Serialize>(
    tool: &str,
    outcome: crate::Result<T>,
) -> Result<CallToolResult, McpError> {
    match outcome {
        Ok(value) => Ok(CallToolResult::success(vec![Content::json(value)?])),
        Err(e) => {
            warn!(tool, error = %e, "tool failed");
            Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
        }
    }
}

#[tool_handler]
impl ServerHandler for RedditServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Read-only access to Reddit posts and comments.".into()),
            ..Default::default()
        }
    }
}
