//! OpenAI chat-completions vision client

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{AiError, Result};
use crate::provider::{AnalysisRequest, VisionProvider};
use crate::providers::ProviderKind;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const MAX_TOKENS: u32 = 1000;

/// Client for the OpenAI API or a compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

fn chat_payload(request: &AnalysisRequest) -> Value {
    json!({
        "model": request.model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": request.question },
                {
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:{};base64,{}", request.mime_type, request.image_base64)
                    }
                }
            ]
        }],
        "max_tokens": MAX_TOKENS
    })
}

#[async_trait]
impl VisionProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::ProviderUnavailable {
                provider: ProviderKind::OpenAi.to_string(),
            })?;

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(url = %url, model = %request.model, "Sending image to OpenAI");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&chat_payload(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Http {
                provider: ProviderKind::OpenAi.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(|e| AiError::InvalidResponse {
            provider: ProviderKind::OpenAi.to_string(),
            reason: e.to_string(),
        })?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| AiError::InvalidResponse {
                provider: ProviderKind::OpenAi.to_string(),
                reason: "missing choices[0].message.content".to_string(),
            })
    }
}
