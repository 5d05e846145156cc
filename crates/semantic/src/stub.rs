use async_trait::async_trait;
use fxhash::hash64;

use crate::error::SemanticError;
use crate::normalize::{l2_normalize_in_place, prepare_query};
use crate::provider::EmbeddingProvider;

/// Deterministic offline provider.
///
/// Vectors are sinusoids seeded by a hash of the prepared query, so the same
/// text always maps to the same vector and nothing leaves the process.
#[derive(Debug, Clone)]
pub struct StubEmbeddingProvider {
    dimensions: usize,
    normalize: bool,
}

impl StubEmbeddingProvider {
    pub fn new(dimensions: usize, normalize: bool) -> Self {
        Self {
            dimensions,
            normalize,
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let prepared = prepare_query(text, usize::MAX);
        let h = hash64(prepared.as_bytes());
        let mut v: Vec<f32> = (0..self.dimensions)
            .map(|idx| ((h >> (idx % 32)) as f32 * 0.0001).sin())
            .collect();
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        v
    }
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DIMENSIONS, true)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        Ok(self.embed(text))
    }
}
