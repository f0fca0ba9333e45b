use thiserror::Error;

/// Errors that can occur while listing or invoking tools.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ToolError {
    /// The connection to the tool server failed or the server misbehaved.
    #[error("transport: {0}")]
    Transport(String),
    #[error("tool not found: {0}")]
    NotFound(String),
    /// Arguments could not be decoded or do not satisfy the tool's schema.
    #[error("invalid input for {tool}: {reason}")]
    InvalidInput { tool: String, reason: String },
    /// The tool ran and reported a failure.
    #[error("execution failed: {0}")]
    Execution(String),
}
