//! LLM Provider Abstraction
//!
//! Defines the [`LlmProvider`] trait and the name-keyed [`ProviderRegistry`]
//! that dispatches agent runs to a backend chosen at runtime.
//!
//! ## Providers
//!
//! - `OpenAI`: Responses API with strict `json_schema` text format
//! - `OpenRouter`: chat completions with strict `response_format`
//! - `Anthropic`, `Google Gemini`: registered stubs that always fail
//!
//! ## Flow
//!
//! Every `generate` call resolves the API key through a
//! [`CredentialResolver`], builds the wire payload, performs one HTTP call and
//! parses the model text as a JSON object. Nothing is retried; dropping the
//! returned future cancels the in-flight request.

mod anthropic;
mod credentials;
mod gemini;
mod openai;
mod openrouter;
mod registry;
pub mod schema;

pub use anthropic::AnthropicProvider;
pub use credentials::{CredentialResolver, InMemoryCredentialStore, resolve_api_key};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use openrouter::OpenRouterProvider;
pub use registry::{ProviderRegistry, default_registry};
pub use schema::{enforce_schema_compliance, extract_output_schema};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::types::{AgentRunRequest, ChatMessage, ClarionError, Result, StructuredOutput};

/// Shared LLM provider type for concurrent access across runs
pub type SharedProvider = Arc<dyn LlmProvider>;

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Registry key, e.g. "OpenAI"
    fn name(&self) -> &str;

    /// Wire payload this provider would send for `messages` and `request`.
    ///
    /// Only parameters present in the request's parameter mapping are
    /// forwarded; the output schema, when present, is strictified.
    fn build_payload(&self, messages: &[ChatMessage], request: &AgentRunRequest) -> Result<Value>;

    /// Call the backend and return the parsed structured output
    async fn generate(
        &self,
        messages: &[ChatMessage],
        request: &AgentRunRequest,
        credentials: &dyn CredentialResolver,
    ) -> Result<StructuredOutput>;
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Parse model text as the structured-output object, keeping the raw text on failure
fn parse_structured_output(text: &str) -> Result<StructuredOutput> {
    serde_json::from_str::<StructuredOutput>(text).map_err(|e| ClarionError::StructuredOutput {
        message: e.to_string(),
        raw: text.to_string(),
    })
}

/// Trim a trailing slash so `{base}/path` joins cleanly
fn normalize_base(api_base: &str) -> String {
    api_base.trim_end_matches('/').to_string()
}
