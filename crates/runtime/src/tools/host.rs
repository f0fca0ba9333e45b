//! Tool host trait.

use crate::model::ToolSpec;
use crate::tools::ToolError;
use serde_json::{Map, Value};
use std::future::Future;

/// Trait for tool execution hosts.
///
/// Implementations publish a tool catalog and execute calls against it.
/// This is the boundary between the model loop and side effects.
pub trait ToolHost: Send + Sync {
    /// Get the current tool catalog.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolSpec>, ToolError>> + Send;

    /// Invoke a tool with already-decoded arguments.
    fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> impl Future<Output = Result<Value, ToolError>> + Send;
}
