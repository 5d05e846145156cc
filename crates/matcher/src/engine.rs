use std::sync::Arc;
use std::time::Instant;

use semantic::{EmbeddingProvider, UnavailableProvider};
use store::ReportStore;

use crate::embedding::SemanticMatcher;
use crate::exact::ExactMatcher;
use crate::fuzzy::FuzzyMatcher;
use crate::metrics::{metrics_recorder, record_fallback};
use crate::types::{MatchConfig, MatchError, MatchOutcome, MatchRequest, MatchSource, SearchMode};
use crate::Matcher;


/// Picks and cascades matchers by search mode.
///
/// | mode       | behaviour                                             |
/// |------------|-------------------------------------------------------|
/// | `exact`    | exact matcher only                                    |
/// | `fuzzy`    | fuzzy matcher only                                    |
/// | `semantic` | semantic matcher, which itself falls back to fuzzy    |
/// | `auto`     | exact; fuzzy only when exact reports `total == 0`     |
///
/// Results from different matchers are never blended.
#[derive(Clone)]
pub struct SearchEngine {
    exact: ExactMatcher,
    fuzzy: FuzzyMatcher,
    semantic: SemanticMatcher,
}

impl SearchEngine {
    pub fn new(
        store: Arc<dyn ReportStore>,
        provider: Arc<dyn EmbeddingProvider>,
        config: &MatchConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        let fuzzy = FuzzyMatcher::new(store.clone(), config.fuzzy_substring_boost);
        Ok(Self {
            exact: ExactMatcher::new(store.clone()),
            semantic: SemanticMatcher::new(
                store,
                provider,
                fuzzy.clone(),
                config.semantic_min_similarity,
            ),
            fuzzy,
        })
    }

    /// Engine whose semantic mode always degrades to fuzzy.
    pub fn without_embeddings(store: Arc<dyn ReportStore>) -> Self {
        let fuzzy = FuzzyMatcher::new(store.clone(), MatchConfig::default_substring_boost());
        Self {
            exact: ExactMatcher::new(store.clone()),
            semantic: SemanticMatcher::new(
                store,
                Arc::new(UnavailableProvider),
                fuzzy.clone(),
                MatchConfig::default_min_similarity(),
            ),
            fuzzy,
        }
    }

    /// Run `req` under `mode`.
    pub async fn search(
        &self,
        mode: SearchMode,
        req: &MatchRequest,
    ) -> Result<MatchOutcome, MatchError> {
        let start = Instant::now();
        let outcome = match mode {
            SearchMode::Exact => self.exact.search(req).await?,
            SearchMode::Fuzzy => self.fuzzy.search(req).await?,
            SearchMode::Semantic => self.semantic.search(req).await?,
            SearchMode::Auto => {
                let exact = self.exact.search(req).await?;
                if exact.total > 0 {
                    exact
                } else {
                    record_fallback(MatchSource::Exact, MatchSource::Fuzzy, "no_exact_match");
                    self.fuzzy.search(req).await?
                }
            }
        };
        let latency = start.elapsed();

        tracing::info!(
            mode = %mode,
            source = %outcome.source,
            total = outcome.total,
            returned = outcome.results.len(),
            latency_ms = latency.as_millis() as u64,
            "search matched"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_match(mode, outcome.source, latency, outcome.total);
        }
        Ok(outcome)
    }
}
