use std::collections::BTreeMap;
use std::fmt;

use matcher::MatchError;
use serde::Serialize;
use store::StoreError;
use thiserror::Error;

use crate::config::ConfigLoadError;

/// Per-parameter validation messages, keyed by query parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Errors surfaced by [`SearchPipeline`](crate::SearchPipeline).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Query parameters failed validation.
    #[error("invalid query parameters: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    #[error("masking setup failed: {0}")]
    Masking(#[from] masking::MaskingError),

    #[error("embedding provider setup failed: {0}")]
    Semantic(#[from] semantic::SemanticError),
}

impl PipelineError {
    /// Whether the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

impl From<ValidationErrors> for PipelineError {
    fn from(errors: ValidationErrors) -> Self {
        PipelineError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_group_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add("q", "too short");
        errors.add("limit", "must be at most 100");
        errors.add("q", "required");

        assert_eq!(errors.get("q").unwrap(), ["too short", "required"]);
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["limit", "q"]);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"limit": ["must be at most 100"], "q": ["too short", "required"]})
        );
        assert_eq!(
            errors.to_string(),
            "limit: must be at most 100; q: too short; q: required"
        );
    }

    #[test]
    fn only_validation_is_client_error() {
        let err = PipelineError::from(ValidationErrors::new());
        assert!(err.is_client_error());
        let err = PipelineError::from(StoreError::backend("down"));
        assert!(!err.is_client_error());
    }
}
