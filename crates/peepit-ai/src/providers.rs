//! Provider list parsing

use std::fmt;
use std::str::FromStr;

use crate::error::AiError;

/// Split a raw provider list on `,` or `;`
///
/// Segments are trimmed and empty segments dropped; order is preserved.
pub fn parse_provider_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a raw provider list into `provider/model` entries
///
/// Malformed entries are skipped with a warning.
pub fn parse_provider_specs(raw: &str) -> Vec<ProviderSpec> {
    parse_provider_list(raw)
        .into_iter()
        .filter_map(|entry| match entry.parse::<ProviderSpec>() {
            Ok(spec) => Some(spec),
            Err(e) => {
                tracing::warn!(entry = %entry, error = %e, "Skipping provider entry");
                None
            }
        })
        .collect()
}

/// Providers this crate knows how to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Ollama,
    OpenAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Ollama, ProviderKind::OpenAi];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Model used when neither the request nor the configuration names one
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "llava:latest",
            ProviderKind::OpenAi => "gpt-4o",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AiError::UnsupportedProvider(s.to_string()))
    }
}

/// One configured `provider/model` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSpec {
    pub provider: String,
    pub model: String,
}

impl ProviderSpec {
    /// Known provider kind, if any
    pub fn kind(&self) -> Option<ProviderKind> {
        self.provider.parse().ok()
    }
}

impl FromStr for ProviderSpec {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((provider, model)) if !provider.trim().is_empty() && !model.trim().is_empty() => {
                Ok(ProviderSpec {
                    provider: provider.trim().to_lowercase(),
                    model: model.trim().to_string(),
                })
            }
            _ => Err(AiError::InvalidProviderSpec(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}
