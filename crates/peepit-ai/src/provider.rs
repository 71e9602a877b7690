//! The provider seam

use async_trait::async_trait;

use crate::error::Result;
use crate::providers::ProviderKind;

/// A single analysis call
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub model: String,
    /// Base64-encoded image bytes
    pub image_base64: String,
    pub mime_type: String,
    pub question: String,
}

/// A vision-capable model endpoint
#[async_trait]
pub trait VisionProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether the provider can currently serve requests
    ///
    /// Never fails: an unreachable endpoint is reported as unavailable.
    async fn is_available(&self) -> bool;

    /// Ask `request.question` about the image and return the model's answer
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String>;
}
