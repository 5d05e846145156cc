use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiEmbeddingProvider;
use crate::config::{ProviderMode, SemanticConfig};
use crate::error::SemanticError;
use crate::stub::StubEmbeddingProvider;

/// Turns query text into a vector comparable with stored report embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Whether calls can be attempted at all. A `false` here lets callers
    /// skip straight to their fallback.
    fn is_available(&self) -> bool;

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, SemanticError>;
}

/// Provider that is never available.
#[derive(Debug, Clone, Default)]
pub struct UnavailableProvider;

#[async_trait]
impl EmbeddingProvider for UnavailableProvider {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn generate_embedding(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
        Err(SemanticError::Unavailable(
            "semantic search is disabled".into(),
        ))
    }
}

/// Build the provider selected by `cfg.mode`.
pub fn provider_from_config(
    cfg: &SemanticConfig,
) -> Result<Arc<dyn EmbeddingProvider>, SemanticError> {
    let provider: Arc<dyn EmbeddingProvider> = match cfg.mode {
        ProviderMode::Api => Arc::new(ApiEmbeddingProvider::new(cfg.clone())?),
        ProviderMode::Stub => Arc::new(StubEmbeddingProvider::new(cfg.dimensions, cfg.normalize)),
        ProviderMode::Disabled => Arc::new(UnavailableProvider),
    };
    tracing::info!(
        provider = provider.name(),
        available = provider.is_available(),
        "embedding provider ready"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_provider_errors() {
        let provider = UnavailableProvider;
        assert!(!provider.is_available());
        let err = provider.generate_embedding("anything").await.unwrap_err();
        assert!(matches!(err, SemanticError::Unavailable(_)));
    }

    #[test]
    fn builds_each_mode() {
        let stub = provider_from_config(&SemanticConfig {
            mode: ProviderMode::Stub,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(stub.name(), "stub");
        assert!(stub.is_available());

        let disabled = provider_from_config(&SemanticConfig {
            mode: ProviderMode::Disabled,
            ..Default::default()
        })
        .unwrap();
        assert!(!disabled.is_available());

        let api = provider_from_config(&SemanticConfig {
            mode: ProviderMode::Api,
            api_key: None,
            api_key_env: "FRAUDLENS_TEST_UNSET_KEY_VAR".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(api.name(), "openai");
        assert!(!api.is_available());
    }
}
