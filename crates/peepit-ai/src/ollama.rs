//! Ollama vision client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::provider::{AnalysisRequest, VisionProvider};
use crate::providers::ProviderKind;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Availability checks must not stall tool calls when Ollama is down
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: [&'a str; 1],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local or remote Ollama server
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VisionProvider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(AVAILABILITY_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Ollama is not reachable");
                false
            }
        }
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &request.model,
            prompt: &request.question,
            images: [request.image_base64.as_str()],
            stream: false,
        };

        tracing::debug!(url = %url, model = %request.model, "Sending image to Ollama");
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Http {
                provider: ProviderKind::Ollama.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| AiError::InvalidResponse {
                provider: ProviderKind::Ollama.to_string(),
                reason: e.to_string(),
            })?;
        Ok(parsed.response)
    }
}
