//! Reddit content tools served over MCP.
//!
//! [`ContentTools`] implements the three read-only tools on top of any
//! [`ContentApi`]; [`RedditServer`] exposes them over MCP and
//! [`RedditClient`] talks to the real Reddit API.

pub mod api;
mod client;
mod config;
mod error;
pub mod records;
mod server;
mod time_filter;
mod tools;

pub use api::ContentApi;
pub use client::RedditClient;
pub use config::{CLIENT_ID_VAR, CLIENT_SECRET_VAR, Credentials, USER_AGENT_VAR};
pub use error::{RedditError, Result};
pub use server::{RedditServer, SERVER_NAME};
pub use time_filter::TimeFilter;
pub use tools::{
    ContentTools, GetSubmissionCommentsArgs, SearchCommentsInPostsArgs, SearchPostsArgs,
    run_blocking,
};
