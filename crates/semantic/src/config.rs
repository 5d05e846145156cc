use serde::{Deserialize, Serialize};

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::retry::RetryConfig;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_DIMENSIONS: usize = 384;
pub const DEFAULT_MAX_INPUT_CHARS: usize = 8000;

/// Which provider [`crate::provider_from_config`] builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderMode {
    /// OpenAI-compatible HTTP API.
    #[default]
    Api,
    /// Deterministic hash-derived vectors, no network.
    Stub,
    /// Always unavailable; semantic searches fall back to fuzzy.
    Disabled,
}

/// Embedding provider settings.
///
/// ```
/// use semantic::{ProviderMode, SemanticConfig};
///
/// let cfg = SemanticConfig {
///     mode: ProviderMode::Stub,
///     ..Default::default()
/// };
/// assert_eq!(cfg.dimensions, 384);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    pub mode: ProviderMode,
    /// Embeddings endpoint.
    pub api_url: String,
    /// Inline API key. Takes precedence over [`api_key_env`](Self::api_key_env).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub model_name: String,
    /// Requested vector length; must match the store's vector column.
    pub dimensions: usize,
    /// Longer inputs are cut to this many characters before embedding.
    pub max_input_chars: usize,
    pub api_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Normalize vectors to unit length.
    pub normalize: bool,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: ProviderMode::Api,
            api_url: DEFAULT_API_URL.into(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.into(),
            model_name: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            api_timeout_secs: 30,
            connect_timeout_secs: 10,
            normalize: true,
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl SemanticConfig {
    /// Inline key, else the configured environment variable. Blank keys
    /// count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}
