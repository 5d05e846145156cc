//! YAML configuration for the fraudlens search pipeline.
//!
//! One file configures every stage: matching, masking, the embedding
//! provider and the report store.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! production: true
//!
//! search:
//!   default_limit: 20
//!   max_limit: 100
//!   fuzzy_substring_boost: 0.2
//!   semantic_min_similarity: 0.3
//!
//! masking:
//!   deterministic: true
//!   salt_env: "FRAUDLENS_MASKING_SALT"
//!
//! semantic:
//!   mode: "api"
//!   model_name: "text-embedding-3-small"
//!   dimensions: 384
//!
//! store:
//!   backend: "postgres"
//!   url: "postgres://fraudlens@localhost/fraudlens"
//!   max_connections: 10
//! ```

use std::fs;
use std::path::Path;

use masking::{generate_salt, validate_salt};
use matcher::MatchConfig;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use store::{StoreConfig, MAX_LIMIT};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the search pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudlensConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Enables strict startup checks, such as rejecting weak masking salts.
    #[serde(default)]
    pub production: bool,

    #[serde(default)]
    pub search: SearchYamlConfig,

    #[serde(default)]
    pub masking: MaskingYamlConfig,

    #[serde(default)]
    pub semantic: SemanticConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl FraudlensConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: FraudlensConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.search.validate()?;
        self.masking.validate(self.production)?;

        if self.semantic.dimensions == 0 {
            return Err(ConfigLoadError::Validation(
                "semantic.dimensions must be >= 1".to_string(),
            ));
        }
        if self.semantic.max_input_chars == 0 {
            return Err(ConfigLoadError::Validation(
                "semantic.max_input_chars must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FraudlensConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            production: false,
            search: SearchYamlConfig::default(),
            masking: MaskingYamlConfig::default(),
            semantic: SemanticConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Matching and pagination settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchYamlConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_max_limit")]
    pub max_limit: u32,

    #[serde(default = "default_substring_boost")]
    pub fuzzy_substring_boost: f32,

    #[serde(default = "default_min_similarity")]
    pub semantic_min_similarity: f32,
}

impl SearchYamlConfig {
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            fuzzy_substring_boost: self.fuzzy_substring_boost,
            semantic_min_similarity: self.semantic_min_similarity,
        }
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.max_limit == 0 || self.max_limit > MAX_LIMIT {
            return Err(ConfigLoadError::Validation(format!(
                "search.max_limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigLoadError::Validation(
                "search.default_limit must be between 1 and search.max_limit".to_string(),
            ));
        }
        self.match_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("search: {e}")))
    }
}

impl Default for SearchYamlConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            fuzzy_substring_boost: default_substring_boost(),
            semantic_min_similarity: default_min_similarity(),
        }
    }
}

/// Disclosure masking settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaskingYamlConfig {
    /// Hash identifiers with the salt and track collisions.
    #[serde(default = "true_value")]
    pub deterministic: bool,

    /// Inline salt. Prefer `salt_env` outside tests.
    #[serde(default, skip_serializing)]
    pub salt: Option<String>,

    #[serde(default = "default_salt_env")]
    pub salt_env: String,

    /// Cap on originals remembered by the collision table; `0` means
    /// unbounded.
    #[serde(default = "default_mapping_max_entries")]
    pub mapping_max_entries: usize,
}

impl MaskingYamlConfig {
    /// Inline salt, else the `salt_env` variable.
    pub fn configured_salt(&self) -> Option<String> {
        self.salt
            .clone()
            .or_else(|| std::env::var(&self.salt_env).ok())
            .filter(|s| !s.trim().is_empty())
    }

    /// Configured salt, or a freshly generated one outside production.
    ///
    /// A generated salt lives only as long as the process, so masked output
    /// changes across restarts.
    pub fn resolve_salt(&self, production: bool) -> Result<String, ConfigLoadError> {
        match self.configured_salt() {
            Some(salt) => Ok(salt),
            None if production => Err(ConfigLoadError::Validation(format!(
                "masking salt is required in production (set {})",
                self.salt_env
            ))),
            None => {
                tracing::warn!(
                    env = %self.salt_env,
                    "no masking salt configured, generated an ephemeral one"
                );
                Ok(generate_salt())
            }
        }
    }

    fn validate(&self, production: bool) -> Result<(), ConfigLoadError> {
        if !self.deterministic {
            return Ok(());
        }
        match self.configured_salt() {
            Some(salt) => {
                if let Err(err) = validate_salt(&salt) {
                    if production {
                        return Err(ConfigLoadError::Validation(format!("masking salt: {err}")));
                    }
                    tracing::warn!(error = %err, "weak masking salt accepted outside production");
                }
                Ok(())
            }
            None if production => Err(ConfigLoadError::Validation(format!(
                "masking salt is required in production (set {})",
                self.salt_env
            ))),
            None => Ok(()),
        }
    }
}

impl Default for MaskingYamlConfig {
    fn default() -> Self {
        Self {
            deterministic: true,
            salt: None,
            salt_env: default_salt_env(),
            mapping_max_entries: default_mapping_max_entries(),
        }
    }
}

// Helper functions for serde defaults
fn default_limit() -> u32 {
    store::DEFAULT_LIMIT
}
fn default_max_limit() -> u32 {
    MAX_LIMIT
}
fn default_substring_boost() -> f32 {
    MatchConfig::default().fuzzy_substring_boost
}
fn default_min_similarity() -> f32 {
    MatchConfig::default().semantic_min_similarity
}
fn true_value() -> bool {
    true
}
fn default_salt_env() -> String {
    "FRAUDLENS_MASKING_SALT".to_string()
}
fn default_mapping_max_entries() -> usize {
    100_000
}
