//! Server status line

use peepit_ai::parse_provider_list;

const PRODUCT: &str = "PeepIt MCP";
const NO_PROVIDERS: &str = "None Configured. Set PEEPIT_AI_PROVIDERS ENV.";

/// One-line summary of the server version and configured AI providers
///
/// `raw_providers` is the unparsed `PEEPIT_AI_PROVIDERS` value.
pub fn generate_status(version: &str, raw_providers: Option<&str>) -> String {
    let providers = raw_providers.map(parse_provider_list).unwrap_or_default();
    let providers = if providers.is_empty() {
        NO_PROVIDERS.to_string()
    } else {
        providers.join(", ")
    };
    format!("{} {} using {}", PRODUCT, version, providers)
        .trim()
        .to_string()
}
