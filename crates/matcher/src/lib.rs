//! # fraudlens matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` answers "has this identifier been reported?" against a
//! [`store::ReportStore`]. A query arrives already classified into a set of
//! normalized identifiers (see the `classify` crate); the matchers turn it
//! into store queries and return a page of [`SearchResult`]s plus the total
//! match count.
//!
//! ## Matchers
//!
//! - [`ExactMatcher`]: OR of equality predicates on the normalized email,
//!   phone, IBAN, wallet and domain columns. Score `1.0`. A query with no
//!   indexed identifier (a plain name) returns nothing without touching the
//!   store.
//! - [`FuzzyMatcher`]: case-insensitive substring match on full name,
//!   nickname and username in the store, then trigram Jaccard re-scoring of
//!   the fetched page with a boost for literal substrings.
//! - [`SemanticMatcher`]: nearest-neighbour search over report embeddings,
//!   similarity above `0.3`. Any failure (no provider, embedding error, store
//!   error) is answered by the fuzzy matcher instead.
//!
//! [`SearchEngine`] selects among them by [`SearchMode`]; `auto` runs exact
//! first and fuzzy only when exact finds nothing.
//!
//! Every matcher restricts results to approved reports and applies the
//! same [`store::ReportFilters`].
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use chrono::Utc;
//! use matcher::{MatchRequest, MatchSource, SearchEngine, SearchMode};
//! use store::{InMemoryStore, Perpetrator, ReportRecord};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryStore::new();
//! store
//!     .insert(ReportRecord {
//!         perpetrator: Perpetrator {
//!             email: Some("scammer@example.com".into()),
//!             ..Perpetrator::default()
//!         },
//!         ..ReportRecord::approved("r-1", "PHISHING", Utc::now())
//!     })
//!     .unwrap();
//!
//! let engine = SearchEngine::without_embeddings(Arc::new(store));
//! let outcome = engine
//!     .search(SearchMode::Auto, &MatchRequest::new("Scammer@Example.com"))
//!     .await
//!     .unwrap();
//! assert_eq!(outcome.source, MatchSource::Exact);
//! assert_eq!(outcome.results[0].score, 1.0);
//! # }
//! ```
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to
//! record per-search latency, totals and fallbacks.

use async_trait::async_trait;

mod embedding;
pub mod engine;
mod exact;
pub mod fuzzy;
pub mod metrics;
pub mod types;

pub use crate::embedding::{sanitize_filters, SemanticMatcher};
pub use crate::engine::SearchEngine;
pub use crate::exact::ExactMatcher;
pub use crate::fuzzy::{fuzzy_score, trigram_similarity, FuzzyMatcher};
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::types::{
    Highlights, MatchConfig, MatchError, MatchOutcome, MatchRequest, MatchSource,
    ResultPerpetrator, SearchMode, SearchResult,
};

/// Common contract of the exact, fuzzy and semantic matchers.
#[async_trait]
pub trait Matcher: Send + Sync {
    /// Source tag this matcher puts on its own results.
    fn source(&self) -> MatchSource;

    async fn search(&self, req: &MatchRequest) -> Result<MatchOutcome, MatchError>;
}
