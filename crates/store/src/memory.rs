use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use classify::{normalize, IdentifierKind};

use crate::error::StoreError;
use crate::model::ReportRecord;
use crate::query::{
    ExactColumn, FacetDimension, Page, ReportFilters, ReportQuery, ScoredRecord, Sort, SortField,
    SortOrder,
};
use crate::ReportStore;

/// A stored report plus the normalized columns derived from it at insert.
#[derive(Debug, Clone)]
struct Row {
    record: ReportRecord,
    email: Option<String>,
    phone: Option<String>,
    iban: Option<String>,
    wallet: Option<String>,
    domain: Option<String>,
}

impl Row {
    fn new(record: ReportRecord) -> Self {
        let column = |value: &Option<String>, kind| {
            value
                .as_deref()
                .map(|v| normalize(v, kind))
                .filter(|v| !v.is_empty())
        };
        Self {
            email: column(&record.perpetrator.email, IdentifierKind::Email),
            phone: column(&record.perpetrator.phone, IdentifierKind::Phone),
            iban: column(&record.iban, IdentifierKind::Iban),
            wallet: column(&record.wallet, IdentifierKind::Wallet),
            domain: column(&record.domain, IdentifierKind::Domain),
            record,
        }
    }

    fn column(&self, column: ExactColumn) -> Option<&str> {
        match column {
            ExactColumn::Email => self.email.as_deref(),
            ExactColumn::Phone => self.phone.as_deref(),
            ExactColumn::Iban => self.iban.as_deref(),
            ExactColumn::Wallet => self.wallet.as_deref(),
            ExactColumn::Domain => self.domain.as_deref(),
        }
    }

    fn name_fields(&self) -> impl Iterator<Item = &str> {
        let p = &self.record.perpetrator;
        [&p.full_name, &p.nickname, &p.username]
            .into_iter()
            .filter_map(|f| f.as_deref())
    }

    /// `None` when the row does not satisfy `query`; otherwise the similarity
    /// for nearest-neighbour queries.
    fn evaluate(&self, query: &ReportQuery) -> Result<Option<Option<f32>>, StoreError> {
        match query {
            ReportQuery::Exact(predicates) => {
                let hit = predicates
                    .iter()
                    .any(|p| self.column(p.column) == Some(p.value.as_str()));
                Ok(hit.then_some(None))
            }
            ReportQuery::Contains(needle) => {
                let needle = needle.to_lowercase();
                let hit = self
                    .name_fields()
                    .any(|field| field.to_lowercase().contains(&needle));
                Ok(hit.then_some(None))
            }
            ReportQuery::Nearest {
                embedding,
                min_similarity,
            } => {
                let Some(stored) = self.record.embedding.as_deref() else {
                    return Ok(None);
                };
                if stored.len() != embedding.len() {
                    return Err(StoreError::InvalidQuery(format!(
                        "query embedding has {} dimensions, report {} has {}",
                        embedding.len(),
                        self.record.id,
                        stored.len()
                    )));
                }
                let similarity = cosine_similarity(embedding, stored);
                Ok((similarity > *min_similarity).then_some(Some(similarity)))
            }
        }
    }
}

/// `1 - cosine distance`; zero vectors have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// In-memory report store behind a `RwLock`, for tests and demos.
///
/// Normalized identifier columns are derived with the classifier's own
/// normalization rules when a record is inserted.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: RwLock<Vec<Row>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I>(records: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = ReportRecord>,
    {
        let store = Self::new();
        store.extend(records)?;
        Ok(store)
    }

    /// Insert a record, replacing any record with the same id.
    pub fn insert(&self, record: ReportRecord) -> Result<(), StoreError> {
        self.extend(std::iter::once(record))
    }

    pub fn extend<I>(&self, records: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = ReportRecord>,
    {
        let mut guard = self
            .rows
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        for record in records {
            let row = Row::new(record);
            match guard.iter_mut().find(|r| r.record.id == row.record.id) {
                Some(existing) => *existing = row,
                None => guard.push(row),
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(
        &self,
        query: &ReportQuery,
        filters: &ReportFilters,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let guard = self
            .rows
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let mut out = Vec::new();
        for row in guard.iter() {
            if !row.record.is_approved() || !filters.matches(&row.record) {
                continue;
            }
            if let Some(similarity) = row.evaluate(query)? {
                out.push(ScoredRecord {
                    record: row.record.clone(),
                    similarity,
                });
            }
        }
        Ok(out)
    }
}

fn compare(a: &ScoredRecord, b: &ScoredRecord, query: &ReportQuery, sort: Sort) -> Ordering {
    if matches!(query, ReportQuery::Nearest { .. }) {
        let sa = a.similarity.unwrap_or(0.0);
        let sb = b.similarity.unwrap_or(0.0);
        return sb
            .partial_cmp(&sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.record.id.cmp(&b.record.id));
    }

    let ordered = match sort.field {
        SortField::CreatedAt | SortField::Relevance => {
            a.record.created_at.cmp(&b.record.created_at)
        }
        SortField::FinancialLoss => {
            // unknown losses go last in either direction
            match (a.record.financial_loss, b.record.financial_loss) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    };
    let ordered = match sort.order {
        SortOrder::Asc => ordered,
        SortOrder::Desc => ordered.reverse(),
    };
    ordered.then_with(|| a.record.id.cmp(&b.record.id))
}

#[async_trait]
impl ReportStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find(
        &self,
        query: &ReportQuery,
        filters: &ReportFilters,
        sort: Sort,
        page: Page,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let mut rows = self.select(query, filters)?;
        rows.sort_by(|a, b| compare(a, b, query, sort));
        Ok(rows
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn count(&self, query: &ReportQuery, filters: &ReportFilters) -> Result<u64, StoreError> {
        Ok(self.select(query, filters)?.len() as u64)
    }

    async fn facet_counts(
        &self,
        dimension: FacetDimension,
        filters: &ReportFilters,
    ) -> Result<Vec<(Option<String>, u64)>, StoreError> {
        let guard = self
            .rows
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let mut counts: HashMap<Option<String>, u64> = HashMap::new();
        for row in guard.iter() {
            if !row.record.is_approved() || !filters.matches(&row.record) {
                continue;
            }
            let key = match dimension {
                FacetDimension::Country => row.record.country.clone(),
                FacetDimension::FraudType => Some(row.record.fraud_type.clone()),
            };
            *counts.entry(key).or_default() += 1;
        }
        let mut buckets: Vec<(Option<String>, u64)> = counts.into_iter().collect();
        buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(buckets)
    }
}
