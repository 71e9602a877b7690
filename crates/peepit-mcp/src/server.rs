//! MCP server implementation
//!
//! Turns JSON-RPC lines into dispatcher calls and back.

use std::sync::Arc;

use peepit_ai::AiRouter;
use peepit_capture::PeepItCli;
use serde_json::{Value, json};

use crate::config::{EnvSource, ServerConfig};
use crate::dispatcher::{Dispatcher, ToolContext, ToolRequest};
use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeResult, JSONRPC_VERSION,
    JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
    SERVER_NAME, ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability,
};
use crate::tools::tool_definitions;
use crate::transport::Transport;
use crate::{Error, Result};

/// MCP server for PeepIt
///
/// Holds no per-call state: every message is handled independently and
/// responses come back in the order requests arrived.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use peepit_mcp::{PeepItMcpServer, ProcessEnv, ServerConfig};
///
/// let config = ServerConfig::from_env(&ProcessEnv);
/// let server = PeepItMcpServer::from_config(config, Arc::new(ProcessEnv))?;
/// let mut transport = peepit_mcp::transport::stdio();
/// server.serve(&mut transport).await?;
/// ```
pub struct PeepItMcpServer {
    dispatcher: Dispatcher,
}

impl PeepItMcpServer {
    pub fn new(context: ToolContext) -> Self {
        Self {
            dispatcher: Dispatcher::new(context),
        }
    }

    /// Build the production collaborators from configuration
    pub fn from_config(config: ServerConfig, env: Arc<dyn EnvSource>) -> Result<Self> {
        let capture = PeepItCli::new(config.cli_path.clone()).with_timeout(config.cli_timeout);
        let ai = AiRouter::new(&config.ai)?;
        Ok(Self::new(ToolContext {
            capture: Arc::new(capture),
            ai: Arc::new(ai),
            env,
            config: Arc::new(config),
        }))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serve messages until the peer closes the stream
    ///
    /// Returns `Ok(())` on end of input and the transport error otherwise.
    pub async fn serve<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<()> {
        while let Some(message) = transport.receive().await? {
            tracing::debug!(request = %message, "Received message");

            let response = match self.handle_message(&message).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to handle message");
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        INTERNAL_ERROR,
                        format!("Internal error: {}", e),
                    );
                    serde_json::to_string(&response)?
                }
            };

            if !response.is_empty() {
                transport.send(&response).await?;
            }
        }
        tracing::info!("Input closed");
        Ok(())
    }

    /// Handle a single JSON-RPC message
    ///
    /// Returns the serialized response, or an empty string for notifications.
    pub async fn handle_message(&self, message: &str) -> Result<String> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable message");
                return to_line(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return to_line(JsonRpcResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ));
            }
        };
        // Notifications are never answered, not even with an error
        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "Notification received");
            return Ok(String::new());
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return to_line(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: unsupported jsonrpc version '{}'", request.jsonrpc),
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id)?,
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id)?,
            "tools/call" => self.handle_tools_call(id, request.params).await?,
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        to_line(response)
    }

    fn handle_initialize(&self, id: Value) -> Result<JsonRpcResponse> {
        let config = &self.dispatcher.context().config;
        tracing::info!(version = %config.version, "Client initializing");

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: config.version.clone(),
            },
        };
        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    /// Tool descriptions carry the status line as of this listing
    fn handle_tools_list(&self, id: Value) -> Result<JsonRpcResponse> {
        let status = self.dispatcher.context().status();
        let tools = tool_definitions(&status);
        Ok(JsonRpcResponse::success(id, json!({ "tools": tools })))
    }

    async fn handle_tools_call(&self, id: Value, params: Value) -> Result<JsonRpcResponse> {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                ));
            }
        };

        let result = self
            .dispatcher
            .dispatch(ToolRequest {
                name: params.name,
                arguments: params.arguments,
            })
            .await;
        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }
}

fn to_line(response: JsonRpcResponse) -> Result<String> {
    serde_json::to_string(&response).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use peepit_capture::{
        ApplicationList, CaptureBridge, CaptureData, CaptureRequest, HelperOutput, WindowDetail,
        WindowList,
    };

    struct NoCapture;

    #[async_trait]
    impl CaptureBridge for NoCapture {
        async fn capture(
            &self,
            _request: &CaptureRequest,
        ) -> peepit_capture::Result<HelperOutput<CaptureData>> {
            Err(peepit_capture::CaptureError::InvalidOutput("unused".into()))
        }

        async fn list_applications(&self) -> peepit_capture::Result<HelperOutput<ApplicationList>> {
            Err(peepit_capture::CaptureError::InvalidOutput("unused".into()))
        }

        async fn list_windows(
            &self,
            _app: &str,
            _details: &[WindowDetail],
        ) -> peepit_capture::Result<HelperOutput<WindowList>> {
            Err(peepit_capture::CaptureError::InvalidOutput("unused".into()))
        }
    }

    fn server_with_env(vars: &[(&str, &str)]) -> PeepItMcpServer {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = ServerConfig::from_env(&env);
        PeepItMcpServer::new(ToolContext {
            capture: Arc::new(NoCapture),
            ai: Arc::new(AiRouter::with_providers(Vec::new())),
            env: Arc::new(env),
            config: Arc::new(config),
        })
    }

    async fn call(server: &PeepItMcpServer, message: &str) -> Value {
        serde_json::from_str(&server.handle_message(message).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server_with_env(&[]);
        let response = call(&server, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "peepit-mcp");
        assert_eq!(
            response["result"]["serverInfo"]["version"],
            env!("CARGO_PKG_VERSION")
        );
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = server_with_env(&[]);
        for message in [
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","method":"initialized"}"#,
            r#"{"jsonrpc":"2.0","method":"tools/list"}"#,
            r#"{"jsonrpc":"1.0","method":"notifications/initialized"}"#,
        ] {
            assert_eq!(server.handle_message(message).await.unwrap(), "");
        }
    }

    #[tokio::test]
    async fn test_ping() {
        let server = server_with_env(&[]);
        let response = call(&server, r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#).await;
        assert_eq!(response["result"], json!({}));
        assert_eq!(response["id"], "p");
    }

    #[tokio::test]
    async fn test_tools_list_reflects_provider_env() {
        let server = server_with_env(&[("PEEPIT_AI_PROVIDERS", "ollama/llava;openai/gpt-4o")]);
        let response = call(&server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let tools = response["result"]["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["image", "analyze", "list"]);
        let description = tools[0]["description"].as_str().unwrap();
        assert!(description.ends_with("using ollama/llava, openai/gpt-4o"));
        assert!(tools[0].get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let server = server_with_env(&[]);
        let response = call(&server, "{not json").await;
        assert_eq!(response["error"]["code"], -32700);
        assert_eq!(response["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_id() {
        let server = server_with_env(&[]);
        let response = call(&server, r#"{"jsonrpc":"2.0","id":9}"#).await;
        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["id"], 9);

        let response = call(&server, r#"{"jsonrpc":"1.0","id":10,"method":"ping"}"#).await;
        assert_eq!(response["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_tools_call_bad_params() {
        let server = server_with_env(&[]);
        let response = call(
            &server,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"arguments":{}}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_tools_call_server_status() {
        let server = server_with_env(&[]);
        let response = call(
            &server,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"list","arguments":{"item_type":"server_status"}}}"#,
        )
        .await;
        let result = &response["result"];
        assert!(result.get("isError").is_none());
        assert_eq!(
            result["content"][0]["text"],
            format!(
                "PeepIt MCP {} using None Configured. Set PEEPIT_AI_PROVIDERS ENV.",
                env!("CARGO_PKG_VERSION")
            )
        );
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server_with_env(&[]);
        let response = call(&server, r#"{"jsonrpc":"2.0","id":5,"method":"resources/list"}"#).await;
        assert_eq!(response["error"]["code"], -32601);
        assert!(
            response["error"]["message"]
                .as_str()
                .unwrap()
                .contains("resources/list")
        );
    }
}
