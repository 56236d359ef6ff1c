use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::{
    AnthropicProvider, GeminiProvider, OpenAiProvider, OpenRouterProvider, SharedProvider,
};
use crate::constants::provider::{OPENAI_API_BASE, OPENROUTER_API_BASE};
use crate::types::{ClarionError, Result};

/// Name-keyed provider lookup table.
///
/// Built once by the composition root and shared read-only afterwards.
/// Registration is first-wins: re-registering a name is a silent no-op.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, SharedProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in providers against the given API bases
    pub fn with_defaults(openai_api_base: &str, openrouter_api_base: &str) -> Self {
        let client = reqwest::Client::new();
        let registry = Self::new();
        registry.register(Arc::new(OpenAiProvider::new(
            client.clone(),
            openai_api_base,
        )));
        registry.register(Arc::new(OpenRouterProvider::new(
            client,
            openrouter_api_base,
        )));
        registry.register(Arc::new(AnthropicProvider));
        registry.register(Arc::new(GeminiProvider));
        registry
    }

    /// Register under the provider's own name
    pub fn register(&self, provider: SharedProvider) -> bool {
        let name = provider.name().to_string();
        self.register_as(name, provider)
    }

    /// Register under an explicit name. Returns `false` if the name was taken.
    pub fn register_as(&self, name: impl Into<String>, provider: SharedProvider) -> bool {
        let name = name.into();
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        if providers.contains_key(&name) {
            debug!(provider = %name, "Provider already registered, keeping first");
            return false;
        }
        providers.insert(name, provider);
        true
    }

    pub fn get(&self, name: &str) -> Result<SharedProvider> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ClarionError::UnsupportedProvider(name.to_string()))
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

/// Registry wired to the public endpoints
pub fn default_registry() -> ProviderRegistry {
    ProviderRegistry::with_defaults(OPENAI_API_BASE, OPENROUTER_API_BASE)
}
