use std::sync::Arc;
use std::time::Instant;

use masking::{DeterministicHasher, DisclosureEngine, MappingTable};
use matcher::{SearchEngine, SearchResult};
use semantic::{provider_from_config, EmbeddingProvider};
use serde::{Deserialize, Serialize};
use store::ReportStore;

use crate::config::{FraudlensConfig, MaskingYamlConfig, SearchYamlConfig};
use crate::disclosure::{Caller, ResultDiscloser};
use crate::error::PipelineError;
use crate::facets::{FacetAggregator, Facets};
use crate::query::{SearchParams, SearchQuery};

/// Position of the returned page within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number, `offset / limit + 1`.
    pub page: u64,
    /// `ceil(total / limit)`.
    pub pages: u64,
    pub limit: u32,
    pub offset: u32,
}

impl Pagination {
    pub fn new(total: u64, limit: u32, offset: u32) -> Self {
        let limit_wide = u64::from(limit.max(1));
        Self {
            page: u64::from(offset) / limit_wide + 1,
            pages: total.div_ceil(limit_wide),
            limit,
            offset,
        }
    }
}

/// Body of a successful search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total: u64,
    pub results: Vec<SearchResult>,
    pub facets: Facets,
    pub pagination: Pagination,
}

/// Validates, matches, aggregates facets and masks results for one caller.
#[derive(Clone)]
pub struct SearchPipeline {
    engine: SearchEngine,
    facets: FacetAggregator,
    discloser: ResultDiscloser,
    limits: SearchYamlConfig,
}

impl SearchPipeline {
    pub fn new(
        store: Arc<dyn ReportStore>,
        provider: Arc<dyn EmbeddingProvider>,
        disclosure: DisclosureEngine,
        limits: SearchYamlConfig,
    ) -> Result<Self, PipelineError> {
        let engine = SearchEngine::new(store.clone(), provider, &limits.match_config())?;
        Ok(Self {
            engine,
            facets: FacetAggregator::new(store),
            discloser: ResultDiscloser::new(disclosure),
            limits,
        })
    }

    /// Pipeline over `store` with no embedding provider and non-deterministic
    /// masking.
    pub fn in_memory(store: Arc<dyn ReportStore>) -> Self {
        Self {
            engine: SearchEngine::without_embeddings(store.clone()),
            facets: FacetAggregator::new(store),
            discloser: ResultDiscloser::default(),
            limits: SearchYamlConfig::default(),
        }
    }

    /// Connect the store, build the embedding provider and set up masking.
    pub async fn from_config(config: &FraudlensConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let store = config.store.connect().await?;
        let provider = provider_from_config(&config.semantic)?;
        let disclosure = disclosure_engine(&config.masking, config.production)?;
        let pipeline = Self::new(store, provider, disclosure, config.search.clone())?;
        tracing::info!(
            name = config.name.as_deref().unwrap_or("fraudlens"),
            production = config.production,
            deterministic_masking = config.masking.deterministic,
            "search pipeline ready"
        );
        Ok(pipeline)
    }

    pub fn limits(&self) -> &SearchYamlConfig {
        &self.limits
    }

    pub fn disclosure(&self) -> &DisclosureEngine {
        self.discloser.engine()
    }

    /// Validate raw parameters with this pipeline's limits, then search.
    pub async fn search_params(
        &self,
        params: &SearchParams,
        caller: &Caller,
    ) -> Result<SearchResponse, PipelineError> {
        let query = SearchQuery::from_params(params, &self.limits)?;
        self.search(&query, caller).await
    }

    /// Run a validated query.
    ///
    /// Facets are only computed when something matched. Masking runs after
    /// every store call has completed.
    pub async fn search(
        &self,
        query: &SearchQuery,
        caller: &Caller,
    ) -> Result<SearchResponse, PipelineError> {
        let start = Instant::now();
        let request = query.match_request();
        let outcome = self.engine.search(query.mode, &request).await?;

        let facets = if outcome.total > 0 {
            self.facets.aggregate(&query.filters).await?
        } else {
            Facets::empty()
        };

        let mut results = outcome.results;
        self.discloser.disclose_all(&mut results, caller);

        tracing::info!(
            mode = %query.mode,
            source = %outcome.source,
            role = %caller.role,
            total = outcome.total,
            returned = results.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "search completed"
        );

        Ok(SearchResponse {
            total: outcome.total,
            results,
            facets,
            pagination: Pagination::new(outcome.total, query.page.limit, query.page.offset),
        })
    }
}

/// Standard masking, deterministic when configured.
///
/// Outside production a weak salt is accepted and a missing one is
/// generated for the lifetime of the process.
pub fn disclosure_engine(
    masking: &MaskingYamlConfig,
    production: bool,
) -> Result<DisclosureEngine, PipelineError> {
    let engine = DisclosureEngine::standard();
    if !masking.deterministic {
        return Ok(engine);
    }
    let salt = masking.resolve_salt(production)?;
    let hasher = if production {
        DeterministicHasher::new(&salt)?
    } else {
        DeterministicHasher::new_unchecked(&salt)?
    };
    let table = match masking.mapping_max_entries {
        0 => MappingTable::new(),
        max => MappingTable::bounded(max),
    };
    Ok(engine.with_deterministic(hasher, Arc::new(table)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use masking::Role;
    use matcher::MatchSource;
    use store::{InMemoryStore, Perpetrator, ReportRecord};

    fn pipeline() -> SearchPipeline {
        let store = InMemoryStore::with_records([
            ReportRecord {
                country: Some("SK".into()),
                perpetrator: Perpetrator {
                    full_name: Some("John Scammer".into()),
                    email: Some("scammer@example.com".into()),
                    ..Perpetrator::default()
                },
                ..ReportRecord::approved("r-1", "PHISHING", Utc::now())
            },
            ReportRecord {
                country: Some("CZ".into()),
                ..ReportRecord::approved("r-2", "INVESTMENT", Utc::now())
            },
        ])
        .unwrap();
        SearchPipeline::in_memory(Arc::new(store))
    }

    #[test]
    fn pagination_math() {
        assert_eq!(
            Pagination::new(45, 20, 40),
            Pagination {
                page: 3,
                pages: 3,
                limit: 20,
                offset: 40
            }
        );
        assert_eq!(Pagination::new(0, 20, 0).pages, 0);
        assert_eq!(Pagination::new(20, 20, 0).pages, 1);
        assert_eq!(Pagination::new(21, 20, 0).pages, 2);
    }

    #[tokio::test]
    async fn exact_hit_is_masked_with_facets() {
        let response = pipeline()
            .search(
                &SearchQuery::new("scammer@example.com").unwrap(),
                &Caller::anonymous(),
            )
            .await
            .unwrap();

        assert_eq!(response.total, 1);
        let hit = &response.results[0];
        assert_eq!(hit.source, MatchSource::Exact);
        assert_eq!(hit.perpetrator.email.as_deref(), Some("s*****@example.com"));
        assert_eq!(hit.perpetrator.name.as_deref(), Some("Joxn Scxxxxr"));
        // facets ignore the text predicate
        let countries = response.facets.country.unwrap();
        assert_eq!(countries.get("SK"), Some(&1));
        assert_eq!(countries.get("CZ"), Some(&1));
        assert_eq!(response.pagination.page, 1);
    }

    #[tokio::test]
    async fn no_match_has_empty_facets() {
        let response = pipeline()
            .search(&SearchQuery::new("nobody").unwrap(), &Caller::anonymous())
            .await
            .unwrap();
        assert_eq!(response.total, 0);
        assert!(response.results.is_empty());
        assert!(response.facets.is_empty());
        assert_eq!(response.pagination.pages, 0);
    }

    #[tokio::test]
    async fn admin_sees_raw_values() {
        let response = pipeline()
            .search(
                &SearchQuery::new("scammer@example.com").unwrap(),
                &Caller::new(Role::Admin, None),
            )
            .await
            .unwrap();
        assert_eq!(
            response.results[0].perpetrator.email.as_deref(),
            Some("scammer@example.com")
        );
    }

    #[tokio::test]
    async fn invalid_params_are_validation_errors() {
        let err = pipeline()
            .search_params(&SearchParams::query("x"), &Caller::anonymous())
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn deterministic_engine_requires_production_salt() {
        let masking = MaskingYamlConfig {
            salt: None,
            salt_env: "FRAUDLENS_TEST_SALT_UNSET_D".into(),
            ..MaskingYamlConfig::default()
        };
        assert!(disclosure_engine(&masking, true).is_err());
        let engine = disclosure_engine(&masking, false).unwrap();
        assert!(engine.mapping_table().is_some());
    }
}
