use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::config::SemanticConfig;
use crate::error::SemanticError;
use crate::normalize::{l2_normalize_in_place, prepare_query};
use crate::provider::EmbeddingProvider;

const PROVIDER_NAME: &str = "openai";

/// OpenAI-compatible `/embeddings` client.
///
/// Available only when an API key resolves. Each call is guarded by a
/// circuit breaker and retried with backoff on transient failures.
pub struct ApiEmbeddingProvider {
    config: SemanticConfig,
    api_key: Option<String>,
    client: reqwest::Client,
    breaker: CircuitBreaker,
}

impl ApiEmbeddingProvider {
    pub fn new(config: SemanticConfig) -> Result<Self, SemanticError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("http client: {e}")))?;
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            tracing::warn!(
                env = %config.api_key_env,
                "no embedding API key configured, semantic search will fall back"
            );
        }
        Ok(Self {
            breaker: CircuitBreaker::new(config.circuit_breaker),
            api_key,
            client,
            config,
        })
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    fn payload(&self, input: &str) -> Value {
        json!({
            "input": input,
            "model": self.config.model_name,
            "dimensions": self.config.dimensions,
        })
    }

    async fn send(&self, api_key: &str, payload: &Value) -> Result<Value, SemanticError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| SemanticError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::InvalidResponse(format!("invalid JSON: {e}")))
    }
}

impl std::fmt::Debug for ApiEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiEmbeddingProvider")
            .field("api_url", &self.config.api_url)
            .field("model", &self.config.model_name)
            .field("has_api_key", &self.api_key.is_some())
            .field("circuit", &self.breaker.state())
            .finish()
    }
}

#[async_trait]
impl EmbeddingProvider for ApiEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SemanticError::Unavailable("no API key configured".into()))?;
        if !self.breaker.try_acquire() {
            return Err(SemanticError::CircuitOpen(PROVIDER_NAME.into()));
        }

        let input = prepare_query(text, self.config.max_input_chars);
        let payload = self.payload(&input);
        let payload = &payload;

        let (outcome, attempts) = self
            .config
            .retry
            .run(SemanticError::is_retryable, move |attempt| {
                if attempt > 0 {
                    tracing::debug!(attempt, provider = PROVIDER_NAME, "retrying embedding request");
                }
                self.send(api_key, payload)
            })
            .await;

        let response = match outcome {
            Ok(response) => {
                self.breaker.on_success();
                response
            }
            Err(err) => {
                self.breaker.on_failure();
                tracing::warn!(attempts, error = %err, "embedding request failed");
                return Err(err);
            }
        };

        let mut vector = parse_embedding_response(response)?;
        if vector.len() != self.config.dimensions {
            return Err(SemanticError::DimensionMismatch {
                expected: self.config.dimensions,
                actual: vector.len(),
            });
        }
        if self.config.normalize {
            l2_normalize_in_place(&mut vector);
        }
        Ok(vector)
    }
}

/// Extract the first vector from an embeddings response.
///
/// Accepts the OpenAI shape `{"data": [{"embedding": [...]}]}`, an
/// `{"embeddings": [[...]]}` object, or a bare array.
fn parse_embedding_response(value: Value) -> Result<Vec<f32>, SemanticError> {
    let first = match value {
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("data") {
                match items.into_iter().next() {
                    Some(Value::Object(mut item)) => item.remove("embedding").ok_or_else(|| {
                        SemanticError::InvalidResponse("missing `embedding` field in data item".into())
                    })?,
                    Some(_) => {
                        return Err(SemanticError::InvalidResponse(
                            "unexpected entry inside `data` array".into(),
                        ))
                    }
                    None => {
                        return Err(SemanticError::InvalidResponse(
                            "response did not contain embeddings".into(),
                        ))
                    }
                }
            } else if let Some(embeddings) = map.remove("embeddings") {
                first_vector(embeddings)?
            } else {
                return Err(SemanticError::InvalidResponse(
                    "unsupported response shape".into(),
                ));
            }
        }
        other => first_vector(other)?,
    };
    parse_vector(first)
}

fn first_vector(value: Value) -> Result<Value, SemanticError> {
    match value {
        Value::Array(items) if items.first().is_some_and(Value::is_array) => items
            .into_iter()
            .next()
            .ok_or_else(|| SemanticError::InvalidResponse("empty embeddings".into())),
        other => Ok(other),
    }
}

fn parse_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num.as_f64().map(|f| f as f32).ok_or_else(|| {
                    SemanticError::InvalidResponse("non-finite embedding value".into())
                }),
                other => Err(SemanticError::InvalidResponse(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::InvalidResponse(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}
