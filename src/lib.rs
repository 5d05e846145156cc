//! Umbrella crate for the fraudlens search and disclosure pipeline.
//!
//! A search passes through four stages:
//!
//! 1. [`SearchQuery::from_params`] validates the raw query parameters and
//!    collects every failure per field.
//! 2. The [`matcher`] crate classifies the text into normalized identifiers
//!    and runs the exact, fuzzy or semantic matcher selected by the mode.
//! 3. [`FacetAggregator`] counts the matching universe by country and fraud
//!    type, only when something matched.
//! 4. [`ResultDiscloser`] masks every personal field for the caller's role
//!    before the [`SearchResponse`] is assembled.
//!
//! [`SearchPipeline`] wires the stages together, either directly or from a
//! YAML [`FraudlensConfig`].
//!
//! ```
//! use std::sync::Arc;
//! use chrono::Utc;
//! use fraudlens::{Caller, SearchPipeline, SearchQuery};
//! use store::{InMemoryStore, Perpetrator, ReportRecord};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryStore::with_records([ReportRecord {
//!     perpetrator: Perpetrator {
//!         email: Some("scammer@example.com".into()),
//!         ..Perpetrator::default()
//!     },
//!     ..ReportRecord::approved("r-1", "PHISHING", Utc::now())
//! }])
//! .unwrap();
//!
//! let pipeline = SearchPipeline::in_memory(Arc::new(store));
//! let query = SearchQuery::new("scammer@example.com").unwrap();
//! let response = pipeline.search(&query, &Caller::anonymous()).await.unwrap();
//!
//! assert_eq!(response.total, 1);
//! assert_eq!(
//!     response.results[0].perpetrator.email.as_deref(),
//!     Some("s*****@example.com")
//! );
//! # }
//! ```

pub mod config;
pub mod disclosure;
pub mod error;
pub mod facets;
pub mod pipeline;
pub mod query;
pub mod telemetry;

pub use config::{ConfigLoadError, FraudlensConfig, MaskingYamlConfig, SearchYamlConfig};
pub use disclosure::{Caller, ResultDiscloser};
pub use error::{PipelineError, ValidationErrors};
pub use facets::{FacetAggregator, FacetCounts, Facets};
pub use pipeline::{disclosure_engine, Pagination, SearchPipeline, SearchResponse};
pub use query::{parse_date, SearchParams, SearchQuery, MAX_QUERY_CHARS, MIN_QUERY_CHARS};
pub use telemetry::{install_metrics, FacadeMetrics};

pub use masking::Role;
pub use matcher::{MatchSource, SearchMode, SearchResult};
