//! Token Counting
//!
//! Estimates the token cost of a fully assembled prompt for UI budgeting.
//!
//! ## Strategy
//! - Route to a counter registered for the agent's provider (tiktoken for the
//!   OpenAI-compatible families)
//! - Fall back to a word-based approximation when no counter is registered or
//!   the registered one fails
//!
//! Counting never fails: the approximation is always available.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

use crate::constants::provider::{ANTHROPIC, GEMINI, OPENAI, OPENROUTER};
use crate::constants::tokens::{APPROXIMATION, DEFAULT_TIKTOKEN_MODEL, WORD_TOKEN_MULTIPLIER};
use crate::types::{Agent, ClarionError, Result};

/// Provider-specific token counter
pub trait TokenCounter: Send + Sync {
    fn name(&self) -> &str;

    fn count(&self, model: &str, content: &str) -> Result<usize>;
}

pub type SharedCounter = Arc<dyn TokenCounter>;

// =============================================================================
// Approximation
// =============================================================================

/// Runs of characters that are neither whitespace nor Unicode punctuation
static WORD_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[^\s\p{P}]+").ok());

/// `ceil(words * 1.33)`, where words are runs of characters delimited by
/// whitespace or punctuation (`\p{P}`). Symbols such as `+`, `=` or `$` are
/// word characters. Empty input is 0.
pub fn basic_token_approximation(text: &str) -> usize {
    let words = match WORD_RUN.as_ref() {
        Some(re) => re.find_iter(text).count(),
        None => text.split_whitespace().count(),
    };
    (words as f64 * WORD_TOKEN_MULTIPLIER).ceil() as usize
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ApproximationCounter;

impl TokenCounter for ApproximationCounter {
    fn name(&self) -> &str {
        APPROXIMATION
    }

    fn count(&self, _model: &str, content: &str) -> Result<usize> {
        Ok(basic_token_approximation(content))
    }
}

// =============================================================================
// Tiktoken
// =============================================================================

/// BPE counter backed by `tiktoken-rs`.
///
/// Unknown models use `cl100k_base`. Encoders are cached per model name since
/// building one is expensive.
#[derive(Default)]
pub struct TiktokenCounter {
    cache: RwLock<HashMap<String, Arc<CoreBPE>>>,
}

impl TiktokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn encoder(&self, model: &str) -> Result<Arc<CoreBPE>> {
        if let Some(bpe) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model)
        {
            return Ok(Arc::clone(bpe));
        }

        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(e) => {
                debug!(model, error = %e, "No encoding for model, using cl100k_base");
                tiktoken_rs::cl100k_base().map_err(|e| {
                    ClarionError::Config(format!(
                        "could not find encoding for model {} and cl100k_base failed: {}",
                        model, e
                    ))
                })?
            }
        };

        let bpe = Arc::new(bpe);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(model.to_string(), Arc::clone(&bpe));
        Ok(bpe)
    }
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        "tiktoken"
    }

    fn count(&self, model: &str, content: &str) -> Result<usize> {
        let model = if model.trim().is_empty() {
            DEFAULT_TIKTOKEN_MODEL
        } else {
            model
        };
        Ok(self.encoder(model)?.encode_ordinary(content).len())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Provider name to counter mapping; a later registration replaces an earlier one
#[derive(Default)]
pub struct TokenCounterRegistry {
    counters: RwLock<HashMap<String, SharedCounter>>,
}

impl TokenCounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// tiktoken for OpenAI, Anthropic and OpenRouter; approximation for Gemini
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        let tiktoken: SharedCounter = Arc::new(TiktokenCounter::new());
        registry.register(OPENAI, Arc::clone(&tiktoken));
        registry.register(ANTHROPIC, Arc::clone(&tiktoken));
        registry.register(OPENROUTER, tiktoken);
        registry.register(GEMINI, Arc::new(ApproximationCounter));
        registry.register(APPROXIMATION, Arc::new(ApproximationCounter));
        registry
    }

    pub fn register(&self, provider: impl Into<String>, counter: SharedCounter) {
        self.counters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.into(), counter);
    }

    pub fn get(&self, provider: &str) -> Option<SharedCounter> {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
    }
}

// =============================================================================
// Prompt Counting
// =============================================================================

/// Text that gets counted for an agent run: system prompt, codebase, task and schema
pub fn token_count_content(agent: &Agent, user_prompt: &str, codebase_content: &str) -> String {
    let mut out = String::new();
    out.push_str(&agent.system_prompt);
    out.push_str("\n\n## Codebase Context\n");
    out.push_str(codebase_content);
    out.push_str("\n\n## User's Task\n");
    out.push_str(user_prompt);

    if !agent.output_schema.schema.is_empty() {
        out.push_str("\n\n## Output Schema\n```json\n");
        if let Ok(schema) = serde_json::to_string_pretty(&agent.output_schema.schema) {
            out.push_str(&schema);
        }
        out.push_str("\n```\n");
    }
    out
}

/// Token estimate for an agent run. Never fails.
pub fn count(
    registry: &TokenCounterRegistry,
    agent: &Agent,
    user_prompt: &str,
    codebase_content: &str,
) -> usize {
    let content = token_count_content(agent, user_prompt, codebase_content);
    let provider = agent.llm_config.provider.as_str();

    let Some(counter) = registry.get(provider) else {
        return basic_token_approximation(&content);
    };

    match counter.count(&agent.llm_config.model, &content) {
        Ok(tokens) => tokens,
        Err(e) => {
            let fallback = basic_token_approximation(&content);
            warn!(
                provider,
                counter = counter.name(),
                error = %e,
                fallback_count = fallback,
                "Provider token counting failed, falling back to approximation"
            );
            fallback
        }
    }
}
