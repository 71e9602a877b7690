//! Error types for provider selection and analysis

use std::path::PathBuf;

/// Errors that can occur while analysing an image
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error(
        "AI analysis not configured on this server. Set the PEEPIT_AI_PROVIDERS environment variable."
    )]
    NotConfigured,

    #[error("No configured AI providers are available (tried: {})", tried.join(", "))]
    NoProviderAvailable { tried: Vec<String> },

    #[error("AI provider '{provider}' is not available")]
    ProviderUnavailable { provider: String },

    #[error("Unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid provider entry '{0}', expected provider/model")]
    InvalidProviderSpec(String),

    /// Non-2xx response from a provider endpoint
    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Request to AI provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image format: {0}. Supported formats: .png, .jpg, .jpeg, .webp")]
    UnsupportedImageFormat(String),
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AiError>;
