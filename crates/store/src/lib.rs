//! Report storage for fraudlens search.
//!
//! The matcher never talks to a database directly. It expresses each lookup
//! as a [`ReportQuery`] plus shared [`ReportFilters`] and hands it to a
//! [`ReportStore`]. Every backend restricts results to `APPROVED` reports,
//! whatever the caller asks for.
//!
//! Backends:
//! - [`InMemoryStore`]: a `RwLock<Vec<_>>`, used by tests, demos and the
//!   default server configuration.
//! - `PgStore` (feature `postgres`): a `reports` table with normalized
//!   identifier columns and a pgvector `embedding` column. Queries are built
//!   with `sqlx::QueryBuilder` and bound parameters only.
//!
//! ```
//! use chrono::Utc;
//! use store::{InMemoryStore, Page, ReportFilters, ReportQuery, ReportRecord, ReportStore, Sort};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryStore::new();
//! store.insert(ReportRecord::approved("r-1", "PHISHING", Utc::now())).unwrap();
//!
//! let total = store
//!     .count(&ReportQuery::Exact(Vec::new()), &ReportFilters::default())
//!     .await
//!     .unwrap();
//! assert_eq!(total, 0);
//! # let _ = (Page::default(), Sort::default());
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod error;
mod memory;
mod model;
#[cfg(feature = "postgres")]
mod postgres;
mod query;

pub use error::StoreError;
pub use memory::{cosine_similarity, InMemoryStore};
pub use model::{Perpetrator, ReportRecord, ReportStatus};
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use query::{
    ExactColumn, ExactPredicate, FacetDimension, Page, ReportFilters, ReportQuery, ScoredRecord,
    Sort, SortField, SortOrder, DEFAULT_LIMIT, MAX_LIMIT,
};

/// Query contract every report backend implements.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// One page of approved reports matching `query` and `filters`.
    ///
    /// Nearest-neighbour queries are always ordered by similarity; other
    /// queries follow `sort`, with `Relevance` meaning creation time.
    async fn find(
        &self,
        query: &ReportQuery,
        filters: &ReportFilters,
        sort: Sort,
        page: Page,
    ) -> Result<Vec<ScoredRecord>, StoreError>;

    /// Number of approved reports matching the same predicate as [`find`](Self::find).
    async fn count(&self, query: &ReportQuery, filters: &ReportFilters) -> Result<u64, StoreError>;

    /// Approved report counts grouped by `dimension` under `filters` only.
    async fn facet_counts(
        &self,
        dimension: FacetDimension,
        filters: &ReportFilters,
    ) -> Result<Vec<(Option<String>, u64)>, StoreError>;
}

/// Backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    Postgres {
        url: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        #[serde(default)]
        run_migrations: bool,
    },
}

fn default_max_connections() -> u32 {
    10
}

impl StoreConfig {
    pub fn memory() -> Self {
        StoreConfig::Memory
    }

    pub fn postgres(url: impl Into<String>) -> Self {
        StoreConfig::Postgres {
            url: url.into(),
            max_connections: default_max_connections(),
            run_migrations: false,
        }
    }

    /// Open the configured backend.
    pub async fn connect(&self) -> Result<Arc<dyn ReportStore>, StoreError> {
        match self {
            StoreConfig::Memory => Ok(Arc::new(InMemoryStore::new())),
            StoreConfig::Postgres {
                url,
                max_connections,
                run_migrations,
            } => {
                #[cfg(feature = "postgres")]
                {
                    let store = PgStore::connect(url, *max_connections).await?;
                    if *run_migrations {
                        store.migrate().await?;
                    }
                    tracing::info!(max_connections, "connected to postgres report store");
                    Ok(Arc::new(store))
                }
                #[cfg(not(feature = "postgres"))]
                {
                    let _ = (url, max_connections, run_migrations);
                    Err(StoreError::backend(
                        "postgres backend disabled at compile time",
                    ))
                }
            }
        }
    }
}
