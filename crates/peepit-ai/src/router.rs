//! Provider selection

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AiError, Result};
use crate::image::EncodedImage;
use crate::ollama::{self, OllamaProvider};
use crate::openai::{self, OpenAiProvider};
use crate::provider::{AnalysisRequest, VisionProvider};
use crate::providers::{ProviderKind, ProviderSpec};

/// Connection settings for the built-in providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiSettings {
    pub ollama_base_url: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            ollama_base_url: ollama::DEFAULT_BASE_URL.to_string(),
            openai_base_url: openai::DEFAULT_BASE_URL.to_string(),
            openai_api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Which provider the caller wants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderChoice {
    /// First available entry of the configured list
    #[default]
    Auto,
    Specific(ProviderKind),
}

/// Outcome of a successful analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub provider: ProviderKind,
    pub model: String,
    pub text: String,
}

/// Routes analysis requests to a provider
pub struct AiRouter {
    providers: Vec<Arc<dyn VisionProvider>>,
}

impl AiRouter {
    /// Router over the built-in Ollama and OpenAI clients
    pub fn new(settings: &AiSettings) -> Result<Self> {
        let ollama = OllamaProvider::new(settings.ollama_base_url.clone(), settings.timeout)?;
        let openai = OpenAiProvider::new(
            settings.openai_base_url.clone(),
            settings.openai_api_key.clone(),
            settings.timeout,
        )?;
        Ok(Self::with_providers(vec![Arc::new(ollama), Arc::new(openai)]))
    }

    pub fn with_providers(providers: Vec<Arc<dyn VisionProvider>>) -> Self {
        Self { providers }
    }

    fn provider(&self, kind: ProviderKind) -> Option<&Arc<dyn VisionProvider>> {
        self.providers.iter().find(|p| p.kind() == kind)
    }

    /// Pick a provider and model for a request
    ///
    /// An explicit choice uses that provider with the requested model, else
    /// the model configured for it, else its default. `Auto` walks the
    /// configured entries in order and takes the first available one.
    pub async fn select(
        &self,
        configured: &[ProviderSpec],
        choice: ProviderChoice,
        model_override: Option<&str>,
    ) -> Result<(Arc<dyn VisionProvider>, String)> {
        if configured.is_empty() {
            return Err(AiError::NotConfigured);
        }
        let model_override = model_override.filter(|m| !m.trim().is_empty());

        match choice {
            ProviderChoice::Specific(kind) => {
                let provider = self
                    .provider(kind)
                    .ok_or_else(|| AiError::UnsupportedProvider(kind.to_string()))?;
                if !provider.is_available().await {
                    return Err(AiError::ProviderUnavailable {
                        provider: kind.to_string(),
                    });
                }
                let model = model_override
                    .map(String::from)
                    .or_else(|| {
                        configured
                            .iter()
                            .find(|spec| spec.kind() == Some(kind))
                            .map(|spec| spec.model.clone())
                    })
                    .unwrap_or_else(|| kind.default_model().to_string());
                Ok((Arc::clone(provider), model))
            }
            ProviderChoice::Auto => {
                let mut tried = Vec::new();
                for spec in configured {
                    tried.push(spec.provider.clone());
                    let Some(provider) = spec.kind().and_then(|kind| self.provider(kind)) else {
                        tracing::warn!(provider = %spec.provider, "Unsupported AI provider in configuration");
                        continue;
                    };
                    if provider.is_available().await {
                        let model = model_override.unwrap_or(&spec.model).to_string();
                        return Ok((Arc::clone(provider), model));
                    }
                    tracing::debug!(provider = %spec.provider, "AI provider unavailable, trying next");
                }
                Err(AiError::NoProviderAvailable { tried })
            }
        }
    }

    /// Analyse an image with the selected provider
    pub async fn analyze(
        &self,
        configured: &[ProviderSpec],
        choice: ProviderChoice,
        model_override: Option<&str>,
        image: &EncodedImage,
        question: &str,
    ) -> Result<Analysis> {
        let (provider, model) = self.select(configured, choice, model_override).await?;
        tracing::info!(provider = %provider.kind(), model = %model, "Analyzing image");

        let request = AnalysisRequest {
            model: model.clone(),
            image_base64: image.base64.clone(),
            mime_type: image.mime_type.to_string(),
            question: question.to_string(),
        };
        let text = provider.analyze(&request).await?;

        Ok(Analysis {
            provider: provider.kind(),
            model,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::parse_provider_specs;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct FakeProvider {
        kind: ProviderKind,
        available: bool,
    }

    #[async_trait]
    impl VisionProvider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn analyze(&self, request: &AnalysisRequest) -> Result<String> {
            Ok(format!("{} saw: {}", request.model, request.question))
        }
    }

    fn router(ollama: bool, openai: bool) -> AiRouter {
        AiRouter::with_providers(vec![
            Arc::new(FakeProvider {
                kind: ProviderKind::Ollama,
                available: ollama,
            }),
            Arc::new(FakeProvider {
                kind: ProviderKind::OpenAi,
                available: openai,
            }),
        ])
    }

    fn image() -> EncodedImage {
        EncodedImage {
            base64: "AAAA".into(),
            mime_type: "image/png",
        }
    }

    #[tokio::test]
    async fn test_empty_configuration_is_not_configured() {
        let err = router(true, true)
            .analyze(&[], ProviderChoice::Auto, None, &image(), "q")
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));
    }

    #[tokio::test]
    async fn test_auto_takes_first_available_in_order() {
        let configured = parse_provider_specs("ollama/llava:latest,openai/gpt-4o");
        let analysis = router(false, true)
            .analyze(&configured, ProviderChoice::Auto, None, &image(), "What?")
            .await
            .unwrap();
        assert_eq!(analysis.provider, ProviderKind::OpenAi);
        assert_eq!(analysis.model, "gpt-4o");
        assert_eq!(analysis.text, "gpt-4o saw: What?");
    }

    #[tokio::test]
    async fn test_auto_skips_unknown_providers() {
        let configured = parse_provider_specs("mystery/model;ollama/bakllava");
        let (provider, model) = router(true, false)
            .select(&configured, ProviderChoice::Auto, None)
            .await
            .unwrap();
        assert_eq!(provider.kind(), ProviderKind::Ollama);
        assert_eq!(model, "bakllava");
    }

    #[tokio::test]
    async fn test_auto_reports_every_provider_tried() {
        let configured = parse_provider_specs("ollama/llava,openai/gpt-4o");
        let err = router(false, false)
            .select(&configured, ProviderChoice::Auto, None)
            .await
            .err()
            .unwrap();
        match err {
            AiError::NoProviderAvailable { tried } => assert_eq!(tried, vec!["ollama", "openai"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_specific_uses_configured_model_then_default() {
        let configured = parse_provider_specs("ollama/bakllava");
        let r = router(true, true);

        let (_, model) = r
            .select(&configured, ProviderChoice::Specific(ProviderKind::Ollama), None)
            .await
            .unwrap();
        assert_eq!(model, "bakllava");

        let (_, model) = r
            .select(&configured, ProviderChoice::Specific(ProviderKind::OpenAi), None)
            .await
            .unwrap();
        assert_eq!(model, "gpt-4o");

        let (_, model) = r
            .select(
                &configured,
                ProviderChoice::Specific(ProviderKind::Ollama),
                Some("llava:13b"),
            )
            .await
            .unwrap();
        assert_eq!(model, "llava:13b");
    }

    #[tokio::test]
    async fn test_specific_unavailable_provider() {
        let configured = parse_provider_specs("openai/gpt-4o");
        let err = router(true, false)
            .select(&configured, ProviderChoice::Specific(ProviderKind::OpenAi), None)
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "AI provider 'openai' is not available");
    }
}
