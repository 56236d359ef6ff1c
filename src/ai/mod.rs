//! AI Integration Layer
//!
//! Prompt rendering, LLM provider dispatch and token estimation.

pub mod prompt;
pub mod provider;
pub mod tokenizer;

pub use prompt::{
    FileContent, PromptData, build_chat_messages, build_prompt_json, build_prompt_markdown,
    format_codebase_context,
};
pub use provider::{
    AnthropicProvider, CredentialResolver, GeminiProvider, InMemoryCredentialStore, LlmProvider,
    OpenAiProvider, OpenRouterProvider, ProviderRegistry, SharedProvider, default_registry,
    enforce_schema_compliance, extract_output_schema, resolve_api_key,
};
pub use tokenizer::{
    ApproximationCounter, SharedCounter, TiktokenCounter, TokenCounter, TokenCounterRegistry,
    basic_token_approximation, count as count_tokens, token_count_content,
};
