use std::sync::Arc;

use async_trait::async_trait;
use semantic::EmbeddingProvider;
use store::{ReportFilters, ReportQuery, ReportStore};

use crate::fuzzy::FuzzyMatcher;
use crate::metrics::record_fallback;
use crate::types::{MatchError, MatchOutcome, MatchRequest, MatchSource, SearchResult};
use crate::Matcher;

/// Embedding similarity search that degrades to fuzzy name search whenever
/// the provider or the vector query cannot answer.
#[derive(Clone)]
pub struct SemanticMatcher {
    store: Arc<dyn ReportStore>,
    provider: Arc<dyn EmbeddingProvider>,
    fallback: FuzzyMatcher,
    min_similarity: f32,
}

impl SemanticMatcher {
    pub fn new(
        store: Arc<dyn ReportStore>,
        provider: Arc<dyn EmbeddingProvider>,
        fallback: FuzzyMatcher,
        min_similarity: f32,
    ) -> Self {
        Self {
            store,
            provider,
            fallback,
            min_similarity,
        }
    }

    async fn fall_back(
        &self,
        req: &MatchRequest,
        reason: &'static str,
    ) -> Result<MatchOutcome, MatchError> {
        tracing::warn!(
            provider = self.provider.name(),
            reason,
            "semantic search unavailable, falling back to fuzzy"
        );
        record_fallback(MatchSource::Semantic, MatchSource::Fuzzy, reason);
        self.fallback.search(req).await
    }
}

fn is_country_code(value: &str) -> bool {
    value.len() == 2 && value.bytes().all(|b| b.is_ascii_uppercase())
}

fn is_fraud_type(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_uppercase() || b == b'_')
}

/// Drop filter values that are malformed rather than failing the search.
pub fn sanitize_filters(filters: &ReportFilters) -> ReportFilters {
    ReportFilters {
        country: filters.country.clone().filter(|c| is_country_code(c)),
        fraud_type: filters.fraud_type.clone().filter(|t| is_fraud_type(t)),
        date_from: filters.date_from,
        date_to: filters.date_to,
        amount_min: filters.amount_min.filter(|v| v.is_finite()),
        amount_max: filters.amount_max.filter(|v| v.is_finite()),
    }
}

#[async_trait]
impl Matcher for SemanticMatcher {
    fn source(&self) -> MatchSource {
        MatchSource::Semantic
    }

    async fn search(&self, req: &MatchRequest) -> Result<MatchOutcome, MatchError> {
        if !self.provider.is_available() {
            return self.fall_back(req, "provider_unavailable").await;
        }

        let embedding = match self.provider.generate_embedding(&req.query).await {
            Ok(vector) if !vector.is_empty() => vector,
            Ok(_) => return self.fall_back(req, "empty_embedding").await,
            Err(err) => {
                tracing::warn!(error = %err, "query embedding failed");
                return self.fall_back(req, "embedding_failed").await;
            }
        };

        let filters = sanitize_filters(&req.filters);
        if filters != req.filters {
            tracing::debug!("dropped malformed filter values for semantic search");
        }
        let query = ReportQuery::Nearest {
            embedding,
            min_similarity: self.min_similarity,
        };
        let fetched = tokio::try_join!(
            self.store.count(&query, &filters),
            self.store.find(&query, &filters, req.sort, req.page),
        );
        let (total, rows) = match fetched {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(store = self.store.name(), error = %err, "vector query failed");
                return self.fall_back(req, "store_error").await;
            }
        };

        let results = rows
            .into_iter()
            .map(|row| {
                let score = row.similarity.unwrap_or(0.0).clamp(0.0, 1.0);
                SearchResult::from_record(row.record, score, MatchSource::Semantic)
            })
            .collect();
        Ok(MatchOutcome {
            results,
            total,
            source: MatchSource::Semantic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use semantic::{SemanticError, StubEmbeddingProvider, UnavailableProvider};
    use store::{InMemoryStore, Perpetrator, ReportRecord};

    const DIMS: usize = 8;

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn generate_embedding(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
            Err(SemanticError::Request("connection reset".into()))
        }
    }

    fn store() -> Arc<dyn ReportStore> {
        let stub = StubEmbeddingProvider::new(DIMS, true);
        Arc::new(
            InMemoryStore::with_records([
                ReportRecord {
                    country: Some("SK".into()),
                    perpetrator: Perpetrator {
                        full_name: Some("Crypto Guru".into()),
                        ..Perpetrator::default()
                    },
                    embedding: Some(stub.embed("fake crypto investment platform")),
                    ..ReportRecord::approved("r-crypto", "INVESTMENT", Utc::now())
                },
                ReportRecord {
                    perpetrator: Perpetrator {
                        full_name: Some("Crypto Guru Jr".into()),
                        ..Perpetrator::default()
                    },
                    ..ReportRecord::approved("r-no-embedding", "INVESTMENT", Utc::now())
                },
            ])
            .unwrap(),
        )
    }

    fn matcher(provider: Arc<dyn EmbeddingProvider>) -> SemanticMatcher {
        let store = store();
        SemanticMatcher::new(store.clone(), provider, FuzzyMatcher::new(store, 0.2), 0.3)
    }

    #[tokio::test]
    async fn nearest_hit_uses_similarity_as_score() {
        let matcher = matcher(Arc::new(StubEmbeddingProvider::new(DIMS, true)));
        let outcome = matcher
            .search(&MatchRequest::new("fake crypto investment platform"))
            .await
            .unwrap();
        assert_eq!(outcome.source, MatchSource::Semantic);
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.results[0].id, "r-crypto");
        assert!(outcome.results[0].score > 0.99);
    }

    #[tokio::test]
    async fn unavailable_provider_falls_back_to_fuzzy() {
        let matcher = matcher(Arc::new(UnavailableProvider));
        let outcome = matcher.search(&MatchRequest::new("crypto guru")).await.unwrap();
        assert_eq!(outcome.source, MatchSource::Fuzzy);
        assert_eq!(outcome.total, 2);
        assert!(outcome.results.iter().all(|r| r.source == MatchSource::Fuzzy));
    }

    #[tokio::test]
    async fn embedding_failure_falls_back() {
        let matcher = matcher(Arc::new(FailingProvider));
        let outcome = matcher.search(&MatchRequest::new("crypto guru")).await.unwrap();
        assert_eq!(outcome.source, MatchSource::Fuzzy);
    }

    #[tokio::test]
    async fn store_error_falls_back() {
        // wrong dimensionality makes the vector query fail
        let matcher = matcher(Arc::new(StubEmbeddingProvider::new(DIMS * 2, true)));
        let outcome = matcher.search(&MatchRequest::new("crypto guru")).await.unwrap();
        assert_eq!(outcome.source, MatchSource::Fuzzy);
        assert_eq!(outcome.total, 2);
    }

    #[test]
    fn malformed_filters_are_dropped() {
        let filters = ReportFilters {
            country: Some("sk".into()),
            fraud_type: Some("PHISHING; DROP".into()),
            amount_min: Some(f64::NAN),
            amount_max: Some(500.0),
            ..ReportFilters::default()
        };
        let clean = sanitize_filters(&filters);
        assert_eq!(clean.country, None);
        assert_eq!(clean.fraud_type, None);
        assert_eq!(clean.amount_min, None);
        assert_eq!(clean.amount_max, Some(500.0));

        let valid = ReportFilters {
            country: Some("SK".into()),
            fraud_type: Some("ROMANCE_SCAM".into()),
            ..ReportFilters::default()
        };
        assert_eq!(sanitize_filters(&valid), valid);
    }

    struct FixedProvider(Vec<f32>);

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn generate_embedding(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn identical_vectors_score_at_most_one() {
        let vector: Vec<f32> = (0..384).map(|i| ((i * 37 % 101) as f32 - 50.0) / 7.0).collect();
        let store: Arc<dyn ReportStore> = Arc::new(
            InMemoryStore::with_records([ReportRecord {
                embedding: Some(vector.clone()),
                ..ReportRecord::approved("r-same", "PHISHING", Utc::now())
            }])
            .unwrap(),
        );
        let matcher = SemanticMatcher::new(
            store.clone(),
            Arc::new(FixedProvider(vector)),
            FuzzyMatcher::new(store, 0.2),
            0.3,
        );
        let outcome = matcher.search(&MatchRequest::new("same text")).await.unwrap();
        assert_eq!(outcome.source, MatchSource::Semantic);
        let score = outcome.results[0].score;
        assert!((0.999..=1.0).contains(&score), "{score}");
    }
}
