//! Postgres + pgvector backend.
//!
//! All user input reaches the database through `QueryBuilder::push_bind`;
//! only column names and sort keywords chosen from closed enums are
//! spliced into the SQL text.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};

use crate::error::StoreError;
use crate::model::{Perpetrator, ReportRecord, ReportStatus};
use crate::query::{
    FacetDimension, Page, ReportFilters, ReportQuery, ScoredRecord, Sort, SortField, SortOrder,
};
use crate::ReportStore;

const SELECT_COLUMNS: &str = "id, status, fraud_type, country, incident_date, created_at, \
     financial_loss, currency, full_name, nickname, username, email, phone, iban, wallet, domain";

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: String,
    status: String,
    fraud_type: String,
    country: Option<String>,
    incident_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    financial_loss: Option<f64>,
    currency: Option<String>,
    full_name: Option<String>,
    nickname: Option<String>,
    username: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    iban: Option<String>,
    wallet: Option<String>,
    domain: Option<String>,
    similarity: Option<f64>,
}

impl TryFrom<ReportRow> for ScoredRecord {
    type Error = StoreError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let status = ReportStatus::parse(&row.status)
            .ok_or_else(|| StoreError::backend(format!("unknown report status '{}'", row.status)))?;
        Ok(ScoredRecord {
            similarity: row.similarity.map(|s| s as f32),
            record: ReportRecord {
                id: row.id,
                status,
                fraud_type: row.fraud_type,
                country: row.country.map(|c| c.trim().to_string()),
                incident_date: row.incident_date,
                created_at: row.created_at,
                financial_loss: row.financial_loss,
                currency: row.currency,
                perpetrator: Perpetrator {
                    full_name: row.full_name,
                    nickname: row.nickname,
                    username: row.username,
                    email: row.email,
                    phone: row.phone,
                },
                iban: row.iban,
                wallet: row.wallet,
                domain: row.domain,
                embedding: None,
            },
        })
    }
}

/// Report store over a `reports` table with a pgvector `embedding` column.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::backend(format!("migration failed: {e}")))
    }
}

/// pgvector text form, `[x1,x2,...]`.
fn vector_literal(embedding: &[f32]) -> String {
    let parts: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// `%needle%` with LIKE metacharacters escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &ReportFilters) {
    qb.push(" WHERE status = 'APPROVED'");
    if let Some(country) = &filters.country {
        qb.push(" AND country = ").push_bind(country.clone());
    }
    if let Some(fraud_type) = &filters.fraud_type {
        qb.push(" AND fraud_type = ").push_bind(fraud_type.clone());
    }
    if let Some(from) = filters.date_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filters.date_to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
    if let Some(min) = filters.amount_min {
        qb.push(" AND financial_loss >= ").push_bind(min);
    }
    if let Some(max) = filters.amount_max {
        qb.push(" AND financial_loss <= ").push_bind(max);
    }
}

fn push_query(qb: &mut QueryBuilder<'_, Postgres>, query: &ReportQuery) {
    match query {
        ReportQuery::Exact(predicates) if predicates.is_empty() => {
            qb.push(" AND FALSE");
        }
        ReportQuery::Exact(predicates) => {
            qb.push(" AND (");
            let mut separated = qb.separated(" OR ");
            for predicate in predicates {
                separated
                    .push(predicate.column.column_name())
                    .push_unseparated(" = ")
                    .push_bind_unseparated(predicate.value.clone());
            }
            separated.push_unseparated(")");
        }
        ReportQuery::Contains(needle) => {
            let pattern = contains_pattern(&needle.to_lowercase());
            qb.push(" AND (full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR nickname ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR username ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        ReportQuery::Nearest {
            embedding,
            min_similarity,
        } => {
            qb.push(" AND embedding IS NOT NULL AND 1 - (embedding <=> ")
                .push_bind(vector_literal(embedding))
                .push("::text::vector) > ")
                .push_bind(f64::from(*min_similarity));
        }
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, query: &ReportQuery, sort: Sort) {
    if matches!(query, ReportQuery::Nearest { .. }) {
        qb.push(" ORDER BY similarity DESC, id ASC");
        return;
    }
    let column = match sort.field {
        SortField::CreatedAt | SortField::Relevance => "created_at",
        SortField::FinancialLoss => "financial_loss",
    };
    let direction = match sort.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    qb.push(format_args!(" ORDER BY {column} {direction} NULLS LAST, id ASC"));
}

fn find_query<'a>(query: &ReportQuery, filters: &ReportFilters, sort: Sort, page: Page) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(SELECT_COLUMNS);
    match query {
        ReportQuery::Nearest { embedding, .. } => {
            qb.push(", 1 - (embedding <=> ")
                .push_bind(vector_literal(embedding))
                .push("::text::vector) AS similarity");
        }
        _ => {
            qb.push(", NULL::float8 AS similarity");
        }
    }
    qb.push(" FROM reports");
    push_filters(&mut qb, filters);
    push_query(&mut qb, query);
    push_order(&mut qb, query, sort);
    qb.push(" LIMIT ")
        .push_bind(i64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(i64::from(page.offset));
    qb
}

fn count_query<'a>(query: &ReportQuery, filters: &ReportFilters) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM reports");
    push_filters(&mut qb, filters);
    push_query(&mut qb, query);
    qb
}

fn facet_query<'a>(dimension: FacetDimension, filters: &ReportFilters) -> QueryBuilder<'a, Postgres> {
    let column = match dimension {
        FacetDimension::Country => "country",
        FacetDimension::FraudType => "fraud_type",
    };
    let mut qb = QueryBuilder::new(format!("SELECT {column}::text AS key, COUNT(*) AS count FROM reports"));
    push_filters(&mut qb, filters);
    qb.push(" GROUP BY key ORDER BY count DESC, key ASC");
    qb
}

#[async_trait]
impl ReportStore for PgStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn find(
        &self,
        query: &ReportQuery,
        filters: &ReportFilters,
        sort: Sort,
        page: Page,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let mut qb = find_query(query, filters, sort, page);
        let rows: Vec<ReportRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(ScoredRecord::try_from).collect()
    }

    async fn count(&self, query: &ReportQuery, filters: &ReportFilters) -> Result<u64, StoreError> {
        let mut qb = count_query(query, filters);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn facet_counts(
        &self,
        dimension: FacetDimension,
        filters: &ReportFilters,
    ) -> Result<Vec<(Option<String>, u64)>, StoreError> {
        let mut qb = facet_query(dimension, filters);
        let rows: Vec<(Option<String>, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(key, count)| (key.map(|k| k.trim().to_string()), count.max(0) as u64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ExactColumn, ExactPredicate};

    #[test]
    fn exact_query_binds_every_value() {
        let query = ReportQuery::Exact(vec![
            ExactPredicate {
                column: ExactColumn::Email,
                value: "a@b.co".into(),
            },
            ExactPredicate {
                column: ExactColumn::Phone,
                value: "421900".into(),
            },
        ]);
        let filters = ReportFilters {
            country: Some("SK".into()),
            ..ReportFilters::default()
        };
        let qb = count_query(&query, &filters);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM reports WHERE status = 'APPROVED' AND country = $1 \
             AND (email_normalized = $2 OR phone_normalized = $3)"
        );
    }

    #[test]
    fn nearest_query_orders_by_similarity() {
        let query = ReportQuery::Nearest {
            embedding: vec![0.5, 0.25],
            min_similarity: 0.3,
        };
        let qb = find_query(&query, &ReportFilters::default(), Sort::default(), Page::default());
        let sql = qb.sql();
        assert!(sql.contains("1 - (embedding <=> $1::text::vector) AS similarity"));
        assert!(sql.contains("embedding IS NOT NULL AND 1 - (embedding <=> $2::text::vector) > $3"));
        assert!(sql.contains("ORDER BY similarity DESC, id ASC LIMIT $4 OFFSET $5"));
    }

    #[test]
    fn contains_query_uses_ilike() {
        let qb = find_query(
            &ReportQuery::Contains("john".into()),
            &ReportFilters::default(),
            Sort::new(SortField::FinancialLoss, SortOrder::Asc),
            Page::default(),
        );
        let sql = qb.sql();
        assert!(sql.contains("full_name ILIKE $1 OR nickname ILIKE $2 OR username ILIKE $3"));
        assert!(sql.contains("ORDER BY financial_loss ASC NULLS LAST, id ASC"));
    }

    #[test]
    fn empty_exact_matches_nothing() {
        let qb = count_query(&ReportQuery::Exact(Vec::new()), &ReportFilters::default());
        assert!(qb.sql().ends_with("AND FALSE"));
    }

    #[test]
    fn facet_query_groups() {
        let qb = facet_query(FacetDimension::Country, &ReportFilters::default());
        assert_eq!(
            qb.sql(),
            "SELECT country::text AS key, COUNT(*) AS count FROM reports \
             WHERE status = 'APPROVED' GROUP BY key ORDER BY count DESC, key ASC"
        );
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(vector_literal(&[1.0, -0.5]), "[1,-0.5]");
    }
}
