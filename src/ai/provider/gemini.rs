use async_trait::async_trait;
use serde_json::Value;

use super::{CredentialResolver, LlmProvider};
use crate::constants::provider::GEMINI;
use crate::types::{AgentRunRequest, ChatMessage, ClarionError, Result, StructuredOutput};

#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiProvider;

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        GEMINI
    }

    fn build_payload(&self, _messages: &[ChatMessage], _request: &AgentRunRequest) -> Result<Value> {
        Err(ClarionError::NotImplemented(GEMINI.to_string()))
    }

    async fn generate(
        &self,
        _messages: &[ChatMessage],
        _request: &AgentRunRequest,
        _credentials: &dyn CredentialResolver,
    ) -> Result<StructuredOutput> {
        Err(ClarionError::NotImplemented(GEMINI.to_string()))
    }
}
