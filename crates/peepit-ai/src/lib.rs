//! Image analysis through external vision providers
//!
//! Providers are configured as an ordered `provider/model` list
//! (`PEEPIT_AI_PROVIDERS`, e.g. `ollama/llava:latest,openai/gpt-4o`).
//! [`AiRouter`] picks a provider for each request, either the one the caller
//! asked for or the first available entry of that list, and forwards the
//! encoded image and question to it.

pub mod error;
pub mod image;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod providers;
pub mod router;

pub use error::{AiError, Result};
pub use image::{EncodedImage, load_image};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::{AnalysisRequest, VisionProvider};
pub use providers::{ProviderKind, ProviderSpec, parse_provider_list, parse_provider_specs};
pub use router::{AiRouter, AiSettings, Analysis, ProviderChoice};
