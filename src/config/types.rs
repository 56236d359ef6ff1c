//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/clarion/) and project (.clarion/) level configuration.

use secrecy::SecretString;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use url::Url;

use crate::constants::provider::{OPENAI_API_BASE, OPENROUTER_API_BASE};
use crate::constants::server::DEFAULT_PORT;
use crate::types::{ClarionError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Listener settings for an embedding front-end
    pub server: ServerConfig,

    /// Codebase loading settings
    pub codebase: CodebaseConfig,

    /// Provider endpoint overrides
    pub providers: ProvidersConfig,

    /// Stored LLM credentials, referenced by agents via `configId`
    pub credentials: Vec<CredentialEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            server: ServerConfig::default(),
            codebase: CodebaseConfig::default(),
            providers: ProvidersConfig::default(),
            credentials: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    /// Returns `ClarionError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ClarionError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        validate_api_base("providers.openai_api_base", &self.providers.openai_api_base)?;
        validate_api_base(
            "providers.openrouter_api_base",
            &self.providers.openrouter_api_base,
        )?;

        let mut seen = HashSet::new();
        for entry in &self.credentials {
            if entry.id.trim().is_empty() {
                return Err(ClarionError::Config(
                    "credential entries must have a non-empty id".to_string(),
                ));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ClarionError::Config(format!(
                    "duplicate credential id: {}",
                    entry.id
                )));
            }
        }

        Ok(())
    }
}

fn validate_api_base(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| ClarionError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ClarionError::Config(format!(
            "{} must use http or https, got {}",
            field, other
        ))),
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodebaseConfig {
    /// Directory names skipped in addition to the built-in set
    pub extra_ignore_dirs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai_api_base: String,
    pub openrouter_api_base: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_base: OPENAI_API_BASE.to_string(),
            openrouter_api_base: OPENROUTER_API_BASE.to_string(),
        }
    }
}

/// One stored credential.
///
/// The key comes from `api_key`, or from the environment variable named by
/// `api_key_env` when `api_key` is absent. An inline key serializes as
/// `[REDACTED]`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialEntry {
    pub id: String,
    pub name: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "redact_key")]
    pub api_key: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

const REDACTED: &str = "[REDACTED]";

fn redact_key<S: Serializer>(
    key: &Option<SecretString>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    key.as_ref().map(|_| REDACTED).serialize(serializer)
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("api_key_env", &self.api_key_env)
            .finish()
    }
}
