//! Query embeddings for fraudlens semantic search.
//!
//! Semantic search compares a query vector against report embeddings that
//! were computed at ingestion time. This crate produces the query side
//! through the [`EmbeddingProvider`] trait:
//!
//! - [`ApiEmbeddingProvider`] calls an OpenAI-compatible `/embeddings`
//!   endpoint (`text-embedding-3-small`, 384 dimensions by default). It is
//!   only available when an API key is configured, retries transient
//!   failures with backoff, and fails fast behind a circuit breaker.
//! - [`StubEmbeddingProvider`] derives vectors from a hash of the text. Same
//!   text, same vector; no network.
//! - [`UnavailableProvider`] is never available, which turns every
//!   semantic search into a fuzzy one.
//!
//! Queries are trimmed, lowercased and cut to `max_input_chars` before
//! being embedded.
//!
//! ```
//! use semantic::{EmbeddingProvider, StubEmbeddingProvider};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = StubEmbeddingProvider::new(8, true);
//! let vector = provider.generate_embedding("investment scam").await.unwrap();
//! assert_eq!(vector.len(), 8);
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod retry;

mod api;
mod normalize;
mod provider;
mod stub;

pub use crate::api::ApiEmbeddingProvider;
pub use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use crate::config::{ProviderMode, SemanticConfig};
pub use crate::error::SemanticError;
pub use crate::normalize::{l2_normalize_in_place, prepare_query};
pub use crate::provider::{provider_from_config, EmbeddingProvider, UnavailableProvider};
pub use crate::retry::RetryConfig;
pub use crate::stub::StubEmbeddingProvider;
