//! Credential resolution seam.
//!
//! Agents only carry a `configId`; the API key is looked up through a
//! [`CredentialResolver`] at call time and never stored on the request.

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::types::{ClarionError, LlmConfig, LlmProviderConfig, Result};

/// Looks up stored credential records by id
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Fails if `id` is unknown
    async fn get_config(&self, id: &str) -> Result<LlmProviderConfig>;
}

/// Resolve the API key a run should use.
///
/// Fails on an empty `configId`, an unknown id, or a blank stored key.
pub async fn resolve_api_key(
    credentials: &dyn CredentialResolver,
    llm_config: &LlmConfig,
) -> Result<SecretString> {
    let id = llm_config.config_id.trim();
    if id.is_empty() {
        return Err(ClarionError::Credential(
            "agent's LLM configuration is missing a Config ID".to_string(),
        ));
    }

    let record = credentials.get_config(id).await.map_err(|e| match e {
        ClarionError::Credential(_) => e,
        other => ClarionError::Credential(format!("failed to load LLM config '{}': {}", id, other)),
    })?;

    if !record.has_api_key() {
        return Err(ClarionError::Credential(format!(
            "API key for LLM config '{}' is empty",
            id
        )));
    }
    Ok(record.api_key)
}

/// Process-local credential store
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<String, LlmProviderConfig>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: LlmProviderConfig) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.id.clone(), record);
    }

    pub fn with(self, record: LlmProviderConfig) -> Self {
        self.insert(record);
        self
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl CredentialResolver for InMemoryCredentialStore {
    async fn get_config(&self, id: &str) -> Result<LlmProviderConfig> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| ClarionError::Credential(format!("LLM config '{}' not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn config(id: &str) -> LlmConfig {
        LlmConfig {
            provider: "OpenAI".into(),
            model: "gpt-4o".into(),
            config_id: id.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_api_key() {
        let store = InMemoryCredentialStore::new()
            .with(LlmProviderConfig::new("main", "Main", "OpenAI", "sk-1"));

        let key = resolve_api_key(&store, &config("main")).await.unwrap();
        assert_eq!(key.expose_secret(), "sk-1");
        assert_eq!(store.ids(), vec!["main"]);
    }

    #[tokio::test]
    async fn test_missing_config_id() {
        let store = InMemoryCredentialStore::new();
        let err = resolve_api_key(&store, &config("")).await.unwrap_err();
        assert!(err.to_string().contains("missing a Config ID"));
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let store = InMemoryCredentialStore::new();
        let err = resolve_api_key(&store, &config("nope")).await.unwrap_err();
        assert!(matches!(err, ClarionError::Credential(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_blank_key_rejected() {
        let store = InMemoryCredentialStore::new()
            .with(LlmProviderConfig::new("blank", "Blank", "OpenAI", "  "));
        let err = resolve_api_key(&store, &config("blank")).await.unwrap_err();
        assert!(err.to_string().contains("API key for LLM config 'blank' is empty"));
    }
}
