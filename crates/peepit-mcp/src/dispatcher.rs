//! Tool call dispatch
//!
//! [`Dispatcher::dispatch`] always produces exactly one [`ToolResult`]:
//!
//! ```text
//! request -> validate --(unknown / invalid)--------------------> error result
//!               |
//!               v
//!            handler --(Err / panic)---------------------------> error result
//!               |
//!               v
//!            success result
//! ```

use std::any::Any;
use std::sync::Arc;

use peepit_ai::{AiRouter, ProviderSpec, parse_provider_specs};
use peepit_capture::CaptureBridge;
use serde_json::Value;

use crate::config::{EnvSource, PEEPIT_AI_PROVIDERS, ServerConfig};
use crate::error::ToolFailure;
use crate::handlers;
use crate::status::generate_status;
use crate::tools::ToolResult;
use crate::validation::validate;

/// A single `tools/call` invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub name: String,
    pub arguments: Value,
}

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct ToolContext {
    pub capture: Arc<dyn CaptureBridge>,
    pub ai: Arc<AiRouter>,
    pub env: Arc<dyn EnvSource>,
    pub config: Arc<ServerConfig>,
}

impl ToolContext {
    /// Current `PEEPIT_AI_PROVIDERS` value
    pub fn raw_providers(&self) -> Option<String> {
        self.env.var(PEEPIT_AI_PROVIDERS)
    }

    pub fn configured_providers(&self) -> Vec<ProviderSpec> {
        self.raw_providers()
            .map(|raw| parse_provider_specs(&raw))
            .unwrap_or_default()
    }

    /// Status line built from the current provider configuration
    pub fn status(&self) -> String {
        generate_status(&self.config.version, self.raw_providers().as_deref())
    }
}

/// Routes tool calls to handlers
#[derive(Clone)]
pub struct Dispatcher {
    context: ToolContext,
}

impl Dispatcher {
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Validate and run a tool call
    ///
    /// Failures of any kind come back as `isError` results.
    pub async fn dispatch(&self, request: ToolRequest) -> ToolResult {
        tracing::debug!(
            tool_name = %request.name,
            arguments = %request.arguments,
            "Dispatching tool call"
        );

        match self.execute(&request).await {
            Ok(result) => result,
            Err(failure) => {
                tracing::error!(
                    tool_name = %request.name,
                    failure = failure.kind(),
                    error = %failure,
                    "Tool call failed"
                );
                failure.into_tool_result()
            }
        }
    }

    async fn execute(&self, request: &ToolRequest) -> Result<ToolResult, ToolFailure> {
        let args = validate(&request.name, &request.arguments)?;

        // Run on its own task so a panicking handler is contained
        let context = self.context.clone();
        let task = tokio::spawn(async move { handlers::run(args, &context).await });

        match task.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(e.into()),
            Err(join_error) if join_error.is_panic() => Err(ToolFailure::Execution(
                panic_message(join_error.into_panic()),
            )),
            Err(join_error) => Err(ToolFailure::Execution(join_error.to_string())),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(42_u8)), "tool handler panicked");
    }
}
