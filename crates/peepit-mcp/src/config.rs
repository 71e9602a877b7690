//! Server configuration
//!
//! All environment access goes through [`EnvSource`] so configuration can be
//! built from a plain map in tests. Everything except the AI provider list is
//! read once at startup into [`ServerConfig`]; the provider list is read on
//! demand so tool descriptions track changes without a restart.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use peepit_ai::AiSettings;

use crate::logging::LogTransportConfig;

pub const PEEPIT_AI_PROVIDERS: &str = "PEEPIT_AI_PROVIDERS";
pub const PEEPIT_LOG_LEVEL: &str = "PEEPIT_LOG_LEVEL";
pub const PEEPIT_LOG_FILE: &str = "PEEPIT_LOG_FILE";
pub const PEEPIT_CONSOLE_LOGGING: &str = "PEEPIT_CONSOLE_LOGGING";
pub const PEEPIT_CLI_PATH: &str = "PEEPIT_CLI_PATH";
pub const PEEPIT_CLI_TIMEOUT: &str = "PEEPIT_CLI_TIMEOUT";
pub const PEEPIT_DEFAULT_SAVE_PATH: &str = "PEEPIT_DEFAULT_SAVE_PATH";
pub const PEEPIT_OLLAMA_BASE_URL: &str = "PEEPIT_OLLAMA_BASE_URL";
pub const PEEPIT_AI_TIMEOUT: &str = "PEEPIT_AI_TIMEOUT";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

const DEFAULT_CLI_PATH: &str = "peepit";
const DEFAULT_CLI_TIMEOUT_SECS: u64 = 60;

/// Read access to environment variables
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    /// Like [`EnvSource::var`], treating blank values as unset
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|value| !value.trim().is_empty())
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Process-wide configuration, fixed after startup
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Version reported in `initialize` and the status line
    pub version: String,
    /// Native helper executable
    pub cli_path: PathBuf,
    pub cli_timeout: Duration,
    /// Where captures go when the caller gives no path
    pub default_save_path: Option<PathBuf>,
    pub log: LogTransportConfig,
    pub ai: AiSettings,
}

impl ServerConfig {
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let ai_defaults = AiSettings::default();

        let ai = AiSettings {
            ollama_base_url: env
                .non_empty(PEEPIT_OLLAMA_BASE_URL)
                .unwrap_or(ai_defaults.ollama_base_url),
            openai_base_url: env
                .non_empty(OPENAI_BASE_URL)
                .unwrap_or(ai_defaults.openai_base_url),
            openai_api_key: env.non_empty(OPENAI_API_KEY),
            timeout: parse_seconds(env, PEEPIT_AI_TIMEOUT).unwrap_or(ai_defaults.timeout),
        };

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            cli_path: env
                .non_empty(PEEPIT_CLI_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CLI_PATH)),
            cli_timeout: parse_seconds(env, PEEPIT_CLI_TIMEOUT)
                .unwrap_or(Duration::from_secs(DEFAULT_CLI_TIMEOUT_SECS)),
            default_save_path: env
                .non_empty(PEEPIT_DEFAULT_SAVE_PATH)
                .map(|path| expand_home(&path)),
            log: LogTransportConfig::from_env(env),
            ai,
        }
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(path),
        },
        _ => PathBuf::from(path),
    }
}

/// Positive whole seconds; anything else counts as unset
fn parse_seconds(env: &dyn EnvSource, key: &str) -> Option<Duration> {
    env.var(key)
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
