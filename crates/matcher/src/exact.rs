use std::sync::Arc;

use async_trait::async_trait;
use store::{ExactPredicate, ReportQuery, ReportStore};

use crate::types::{MatchError, MatchOutcome, MatchRequest, MatchSource, SearchResult};
use crate::Matcher;

/// Equality lookup over the normalized identifier columns.
#[derive(Clone)]
pub struct ExactMatcher {
    store: Arc<dyn ReportStore>,
}

impl ExactMatcher {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Matcher for ExactMatcher {
    fn source(&self) -> MatchSource {
        MatchSource::Exact
    }

    async fn search(&self, req: &MatchRequest) -> Result<MatchOutcome, MatchError> {
        let predicates = ExactPredicate::from_identifiers(req.identifiers.iter());
        if predicates.is_empty() {
            tracing::debug!("no indexed identifier in query, skipping exact lookup");
            return Ok(MatchOutcome::empty(MatchSource::Exact));
        }

        let query = ReportQuery::Exact(predicates);
        let (total, rows) = tokio::try_join!(
            self.store.count(&query, &req.filters),
            self.store.find(&query, &req.filters, req.sort, req.page),
        )?;

        let results = rows
            .into_iter()
            .map(|row| SearchResult::from_record(row.record, 1.0, MatchSource::Exact))
            .collect();
        Ok(MatchOutcome {
            results,
            total,
            source: MatchSource::Exact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use classify::{classify_as, IdentifierKind};
    use store::{InMemoryStore, Perpetrator, ReportFilters, ReportRecord};

    fn store() -> Arc<dyn ReportStore> {
        Arc::new(
            InMemoryStore::with_records([
                ReportRecord {
                    country: Some("SK".into()),
                    perpetrator: Perpetrator {
                        full_name: Some("John Scammer".into()),
                        email: Some("Scammer@Example.com".into()),
                        phone: Some("+421 900 111 222".into()),
                        ..Perpetrator::default()
                    },
                    ..ReportRecord::approved("r-email", "PHISHING", Utc::now())
                },
                ReportRecord {
                    country: Some("CZ".into()),
                    iban: Some("SK89 1100 0000 0029 4912 9426".into()),
                    ..ReportRecord::approved("r-iban", "INVESTMENT", Utc::now())
                },
            ])
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn email_hit_scores_one() {
        let matcher = ExactMatcher::new(store());
        let outcome = matcher
            .search(&MatchRequest::new("scammer@example.com"))
            .await
            .unwrap();
        assert_eq!(outcome.total, 1);
        let hit = &outcome.results[0];
        assert_eq!(hit.id, "r-email");
        assert_eq!(hit.score, 1.0);
        assert_eq!(hit.source, MatchSource::Exact);
        assert_eq!(hit.fraud_type, "phishing");
        assert_eq!(hit.perpetrator.phone.as_deref(), Some("+421 900 111 222"));
    }

    #[tokio::test]
    async fn spaced_iban_matches() {
        let matcher = ExactMatcher::new(store());
        let outcome = matcher
            .search(&MatchRequest::new("sk89 1100 0000 0029 4912 9426"))
            .await
            .unwrap();
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.results[0].id, "r-iban");
    }

    #[tokio::test]
    async fn filters_apply() {
        let matcher = ExactMatcher::new(store());
        let req = MatchRequest::new("scammer@example.com").with_filters(ReportFilters {
            country: Some("CZ".into()),
            ..ReportFilters::default()
        });
        assert_eq!(matcher.search(&req).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn name_only_query_skips_store() {
        let matcher = ExactMatcher::new(store());
        let req = MatchRequest::new("john scammer")
            .with_identifiers(classify_as("john scammer", &[IdentifierKind::Name]));
        let outcome = matcher.search(&req).await.unwrap();
        assert_eq!(outcome, MatchOutcome::empty(MatchSource::Exact));
    }
}
