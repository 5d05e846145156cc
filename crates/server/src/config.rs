use fraudlens::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
///
/// Every field has a default, so an empty `server` file (or none at all)
/// yields a working local server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Requests per minute per API key, trusted user, or client address
    pub rate_limit_per_minute: u32,
    pub auth: AuthConfig,
    /// Path of the pipeline YAML file; defaults apply when unset.
    pub pipeline_config: Option<String>,
    pub enable_cors: bool,
    /// Used when `RUST_LOG` is not set
    pub log_level: String,
    /// Serve Prometheus text at `/metrics`
    pub metrics_enabled: bool,
}

/// How callers get a role above BASIC.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// API key -> role label (`BASIC`, `STANDARD`, `GOLD`, `ADMIN`).
    pub api_keys: HashMap<String, String>,
    /// Accept `x-user-role` / `x-user-id` from an authenticating gateway.
    /// Only enable behind a proxy that strips these headers from clients.
    pub trust_role_header: bool,
}

impl AuthConfig {
    /// Role granted to `key`, if the key is known.
    pub fn role_for_key(&self, key: &str) -> Option<Role> {
        self.api_keys.get(key).map(|label| Role::from_label(label))
    }

    pub fn with_key(mut self, key: impl Into<String>, role: Role) -> Self {
        self.api_keys.insert(key.into(), role.to_string());
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            port: 8080,
            timeout_secs: 30,
            rate_limit_per_minute: 100,
            auth: AuthConfig::default(),
            pipeline_config: None,
            enable_cors: true,
            log_level: "info".into(),
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Load from an optional `server` file, then `FRAUDLENS_SERVER__*`
    /// environment variables (`FRAUDLENS_SERVER__AUTH__TRUST_ROLE_HEADER`).
    pub fn load() -> anyhow::Result<Self> {
        let config: ServerConfig = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(config::Environment::with_prefix("FRAUDLENS_SERVER").separator("__"))
            .build()?
            .try_deserialize()?;
        if config.auth.api_keys.is_empty() && !config.auth.trust_role_header {
            tracing::warn!("no API keys or trusted role header configured, every caller is BASIC");
        }
        Ok(config)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.bind_addr, self.port).parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
