//! Tool catalog and result types
//!
//! # Tools
//!
//! - `image` - Capture a screen, window or application, optionally asking a
//!   vision model about the capture
//! - `analyze` - Ask a vision model about an existing image file
//! - `list` - Running applications, an application's windows, or server status
//!
//! Descriptions end with the current status line so agents can see which AI
//! providers are configured. They are rebuilt on every listing.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Tool definition for MCP protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Result from a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none", default)]
    pub is_error: Option<bool>,
}

/// Content types for tool results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image {
        /// Base64-encoded image bytes
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        ToolContent::Text { text: text.into() }
    }
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self::success(vec![ToolContent::text(content)])
    }

    pub fn success(content: Vec<ToolContent>) -> Self {
        Self {
            content,
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(message)],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of the first text item, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|item| match item {
            ToolContent::Text { text } => Some(text.as_str()),
            ToolContent::Image { .. } => None,
        })
    }
}

/// All tools, in listing order, with `status` folded into the descriptions
pub fn tool_definitions(status: &str) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "image".to_string(),
            description: format!(
                "Captures macOS screen content and optionally analyzes it. \
                 Targets can be every screen, one screen, the frontmost window, all windows \
                 of an application, or a single window matched by title or index (see app_target). \
                 Captures are saved to `path` or returned inline as Base64 when format is \"data\". \
                 When `question` is given, the capture is analyzed by the configured AI provider. {}",
                status
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "app_target": {
                        "type": "string",
                        "description": "Omit or \"\" for all screens; \"screen:N\" for one screen; \"frontmost\"; \"AppName\" for all its windows; \"AppName:WINDOW_TITLE:Title\" or \"AppName:WINDOW_INDEX:N\" for one window"
                    },
                    "path": {
                        "type": "string",
                        "description": "File or directory to save captures to"
                    },
                    "question": {
                        "type": "string",
                        "description": "If provided, the capture is analyzed and the answer returned"
                    },
                    "format": {
                        "type": "string",
                        "enum": ["png", "jpg", "data"],
                        "default": "png",
                        "description": "Output format; \"data\" returns the image inline. Unrecognized values fall back to png"
                    },
                    "capture_focus": {
                        "type": "string",
                        "enum": ["background", "auto", "foreground"],
                        "default": "auto",
                        "description": "Whether the target may be brought to the front before capturing"
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "analyze".to_string(),
            description: format!(
                "Analyzes an image file with a vision model (local Ollama, OpenAI) and returns \
                 the model's answer to the question. Provider choice and model defaults come from \
                 the server's PEEPIT_AI_PROVIDERS setting unless provider_config overrides them.\n{}",
                status
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "image_path": {
                        "type": "string",
                        "description": "Path to a .png, .jpg, .jpeg or .webp image"
                    },
                    "question": {
                        "type": "string",
                        "description": "Question to ask about the image"
                    },
                    "provider_config": {
                        "type": "object",
                        "properties": {
                            "type": {
                                "type": "string",
                                "enum": ["auto", "ollama", "openai"],
                                "default": "auto"
                            },
                            "model": {
                                "type": "string",
                                "description": "Model name, overriding the configured default"
                            }
                        }
                    }
                },
                "required": ["image_path", "question"]
            }),
        },
        ToolDefinition {
            name: "list".to_string(),
            description: format!(
                "Lists running applications, the windows of one application, or the server status. \
                 Window listings can include off-screen state, bounds and window IDs.\n{}",
                status
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "item_type": {
                        "type": "string",
                        "enum": ["running_applications", "application_windows", "server_status"],
                        "description": "Defaults to application_windows when app is given, otherwise running_applications"
                    },
                    "app": {
                        "type": "string",
                        "description": "Application name or bundle ID; required for application_windows"
                    },
                    "include_window_details": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "enum": ["off_screen", "bounds", "ids"]
                        },
                        "description": "Extra per-window details, only for application_windows"
                    }
                },
                "required": []
            }),
        },
    ]
}
