use async_trait::async_trait;
use serde_json::Value;

use super::{CredentialResolver, LlmProvider};
use crate::constants::provider::ANTHROPIC;
use crate::types::{AgentRunRequest, ChatMessage, ClarionError, Result, StructuredOutput};

/// Registered placeholder; every call fails with `NotImplemented`
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicProvider;

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        ANTHROPIC
    }

    fn build_payload(&self, _messages: &[ChatMessage], _request: &AgentRunRequest) -> Result<Value> {
        Err(ClarionError::NotImplemented(ANTHROPIC.to_string()))
    }

    async fn generate(
        &self,
        _messages: &[ChatMessage],
        _request: &AgentRunRequest,
        _credentials: &dyn CredentialResolver,
    ) -> Result<StructuredOutput> {
        Err(ClarionError::NotImplemented(ANTHROPIC.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::InMemoryCredentialStore;

    #[tokio::test]
    async fn test_always_not_implemented() {
        let err = AnthropicProvider
            .generate(&[], &AgentRunRequest::default(), &InMemoryCredentialStore::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "provider 'Anthropic' is not yet implemented");
        assert!(AnthropicProvider
            .build_payload(&[], &AgentRunRequest::default())
            .is_err());
    }
}
