//! Error types for the MCP server

use thiserror::Error;

use crate::tools::ToolResult;
use crate::validation::ValidationError;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during MCP server operations
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the native capture helper
    #[error("{0}")]
    Capture(#[from] peepit_capture::CaptureError),

    /// Error from an AI provider
    #[error("{0}")]
    Ai(#[from] peepit_ai::AiError),

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport used before `connect` or after `close`
    #[error("transport not connected")]
    NotConnected,
}

/// Every way a tool call can fail
///
/// This is the input to error translation: each variant maps to exactly one
/// `isError` result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolFailure {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Handler returned an error or panicked
    #[error("Tool execution failed: {0}")]
    Execution(String),
}

impl ToolFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            ToolFailure::UnknownTool(_) => "unknown_tool",
            ToolFailure::Validation(_) => "validation",
            ToolFailure::Execution(_) => "execution",
        }
    }

    /// The `isError` result sent back to the client
    pub fn into_tool_result(self) -> ToolResult {
        ToolResult::error(self.to_string())
    }
}

impl From<ValidationError> for ToolFailure {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnknownTool { name } => ToolFailure::UnknownTool(name),
            ValidationError::Invalid { issues } => ToolFailure::Validation(issues),
        }
    }
}

impl From<Error> for ToolFailure {
    fn from(err: Error) -> Self {
        ToolFailure::Execution(err.to_string())
    }
}
