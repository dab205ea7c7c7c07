//! Configuration loading and management
//!
//! ```yaml
//! security:
//!   token_key: change-me
//!   cookie_name: session
//!   token_ttl_seconds: 3600
//! pagination:
//!   enabled: true
//!   per_page: 50
//! binder:
//!   max_depth: 4
//! ```

use crate::binding::DEFAULT_MAX_DEPTH;
use crate::core::security::TokenService;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Security token settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// HS256 signing secret; protected routes reject every request without it
    pub token_key: Option<String>,

    /// Cookie checked for a token before the `Authorization` header
    pub cookie_name: Option<String>,

    /// Lifetime of generated tokens
    pub token_ttl_seconds: i64,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            token_key: None,
            cookie_name: None,
            token_ttl_seconds: 3600,
        }
    }
}

/// Pagination applied to resources that declare none of their own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub enabled: bool,
    pub query_param_name: String,
    pub per_page: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            query_param_name: "p".to_string(),
            per_page: 20,
        }
    }
}

/// Reference binder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderSettings {
    /// Deepest level of nested bindings resolved before failing
    pub max_depth: usize,
}

impl Default for BinderSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Complete crudkit configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrudConfig {
    pub security: SecuritySettings,
    pub pagination: PaginationSettings,
    pub binder: BinderSettings,
}

impl CrudConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load configuration from the environment, reading `.env` first if present
    ///
    /// Recognised variables: `JWT_TOKEN_KEY`, `TOKEN_COOKIE_NAME`,
    /// `TOKEN_TTL_SECONDS`.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::default().merge_env(|key| std::env::var(key).ok())
    }

    /// Override settings with variables returned by `lookup`
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("JWT_TOKEN_KEY").filter(|v| !v.is_empty()) {
            self.security.token_key = Some(key);
        }
        if let Some(name) = lookup("TOKEN_COOKIE_NAME").filter(|v| !v.is_empty()) {
            self.security.cookie_name = Some(name);
        }
        if let Some(ttl) = lookup("TOKEN_TTL_SECONDS") {
            self.security.token_ttl_seconds = ttl
                .trim()
                .parse()
                .with_context(|| format!("TOKEN_TTL_SECONDS is not a number: {}", ttl))?;
        }
        Ok(self)
    }

    /// Token service built from the signing secret, if one is configured
    pub fn token_service(&self) -> Option<TokenService> {
        self.security
            .token_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(TokenService::new)
    }

    /// Lifetime of generated tokens
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.security.token_ttl_seconds)
    }
}
