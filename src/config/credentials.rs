//! Credential store backed by the `credentials` section of the configuration.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::env;

use super::types::{Config, CredentialEntry};
use crate::ai::provider::CredentialResolver;
use crate::types::{ClarionError, LlmProviderConfig, Result};

/// Resolves `configId`s against configured entries.
///
/// Keys named by `api_key_env` are read at lookup time, so a rotated
/// environment is picked up without reloading the configuration.
#[derive(Debug, Default, Clone)]
pub struct ConfigCredentialStore {
    entries: HashMap<String, CredentialEntry>,
}

impl ConfigCredentialStore {
    pub fn new(entries: impl IntoIterator<Item = CredentialEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.credentials.iter().cloned())
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn api_key(entry: &CredentialEntry) -> Result<String> {
        if let Some(key) = &entry.api_key {
            return Ok(key.expose_secret().to_string());
        }
        match &entry.api_key_env {
            Some(var) => env::var(var).map_err(|_| {
                ClarionError::Credential(format!(
                    "environment variable {} for LLM config '{}' is not set",
                    var, entry.id
                ))
            }),
            None => Ok(String::new()),
        }
    }
}

#[async_trait]
impl CredentialResolver for ConfigCredentialStore {
    async fn get_config(&self, id: &str) -> Result<LlmProviderConfig> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| ClarionError::Credential(format!("LLM config '{}' not found", id)))?;

        Ok(LlmProviderConfig::new(
            entry.id.clone(),
            entry.name.clone(),
            entry.provider.clone(),
            Self::api_key(entry)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::resolve_api_key;
    use crate::types::LlmConfig;
    use secrecy::ExposeSecret;

    fn llm(id: &str) -> LlmConfig {
        LlmConfig {
            provider: "OpenAI".into(),
            model: "gpt-4o".into(),
            config_id: id.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_inline_key() {
        let store = ConfigCredentialStore::new([CredentialEntry {
            id: "main".into(),
            provider: "OpenAI".into(),
            api_key: Some("sk-inline".into()),
            ..Default::default()
        }]);

        let key = resolve_api_key(&store, &llm("main")).await.unwrap();
        assert_eq!(key.expose_secret(), "sk-inline");
    }

    #[tokio::test]
    async fn test_env_key() {
        // SAFETY: variable name is unique to this test
        unsafe {
            env::set_var("CLARION_TEST_CREDENTIAL_KEY", "sk-env");
        }
        let store = ConfigCredentialStore::new([CredentialEntry {
            id: "env".into(),
            api_key_env: Some("CLARION_TEST_CREDENTIAL_KEY".into()),
            ..Default::default()
        }]);

        let record = store.get_config("env").await.unwrap();
        assert_eq!(record.api_key.expose_secret(), "sk-env");
        unsafe {
            env::remove_var("CLARION_TEST_CREDENTIAL_KEY");
        }
    }

    #[tokio::test]
    async fn test_missing_env_var_is_credential_error() {
        let store = ConfigCredentialStore::new([CredentialEntry {
            id: "env".into(),
            api_key_env: Some("CLARION_TEST_UNSET_VARIABLE".into()),
            ..Default::default()
        }]);

        let err = store.get_config("env").await.unwrap_err();
        assert!(matches!(err, ClarionError::Credential(_)));
    }

    #[tokio::test]
    async fn test_entry_without_key_reports_empty() {
        let store = ConfigCredentialStore::new([CredentialEntry {
            id: "blank".into(),
            ..Default::default()
        }]);

        let err = resolve_api_key(&store, &llm("blank")).await.unwrap_err();
        assert!(err.to_string().contains("API key for LLM config 'blank' is empty"));
        assert_eq!(store.ids(), vec!["blank"]);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let store = ConfigCredentialStore::default();
        let err = resolve_api_key(&store, &llm("nope")).await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
