//! MCP server for PeepIt
//!
//! Exposes screen capture, window enumeration and image analysis to AI
//! agents via the Model Context Protocol.
//!
//! # Architecture
//!
//! ```text
//! [ MCP Client (agent) ]
//!        | (JSON-RPC over stdio)
//!        v
//! [ transport ] -> [ server ] -> [ dispatcher ] -> [ validation ] -> [ handlers ]
//!                                                                      |
//!                                   +----------------------------------+
//!                                   |                                  |
//!                                   v                                  v
//!                      [ peepit-capture (helper CLI) ]     [ peepit-ai (providers) ]
//! ```
//!
//! # Tools
//!
//! - `image` - Capture screens, windows or applications, optionally analysing the result
//! - `analyze` - Ask a vision model a question about an image file
//! - `list` - List running applications, an application's windows, or server status
//!
//! Every tool call produces exactly one result. Unknown tools, invalid
//! arguments and handler failures all come back as results flagged with
//! `isError` rather than as protocol errors.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod status;
pub mod tools;
pub mod transport;
pub mod validation;

pub use config::{EnvSource, ProcessEnv, ServerConfig};
pub use dispatcher::{Dispatcher, ToolContext, ToolRequest};
pub use error::{Error, Result, ToolFailure};
pub use lifecycle::{Lifecycle, Outcome, ShutdownHandle, ShutdownReason};
pub use server::PeepItMcpServer;
pub use status::generate_status;
pub use tools::{ToolContent, ToolDefinition, ToolResult, tool_definitions};
pub use transport::{LineTransport, Transport};
pub use validation::{ToolArguments, ValidationError, validate};
