//! Agent Run Pipeline
//!
//! One run is strictly sequential: gather codebase contents, build chat
//! messages, call the selected provider, return its structured output.
//! The only state shared between concurrent runs is the read-only provider
//! and token-counter registries.
//!
//! ## Entry Points
//!
//! - [`AgentRunner::run_agent`]: load, filter with the agent's rules, generate
//! - [`AgentRunner::run`]: selective read of explicit paths, then generate
//! - [`AgentRunner::prepare_prompt`]: markdown view plus provider wire payload
//! - [`AgentRunner::estimate_tokens`]: token estimate for the same content

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::ai::prompt::{build_chat_messages, build_prompt_markdown};
use crate::ai::provider::{CredentialResolver, ProviderRegistry};
use crate::ai::tokenizer::{self, TokenCounterRegistry};
use crate::codebase::{CodebaseLoader, apply_filter, read_codebase_files, render_file_blocks};
use crate::types::{Agent, AgentRunRequest, Result, StructuredOutput};

/// Inspection views of a run that was not sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedPrompt {
    pub markdown_prompt: String,
    /// Pretty-printed wire payload for the selected provider
    pub json_prompt: String,
}

pub struct AgentRunner {
    providers: Arc<ProviderRegistry>,
    credentials: Arc<dyn CredentialResolver>,
    counters: Arc<TokenCounterRegistry>,
}

impl AgentRunner {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        credentials: Arc<dyn CredentialResolver>,
        counters: Arc<TokenCounterRegistry>,
    ) -> Self {
        Self {
            providers,
            credentials,
            counters,
        }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Load `root`, keep what the agent's filters allow, and run the agent on it
    #[instrument(skip_all, fields(agent = %agent.profile.id, root = %root.display()))]
    pub async fn run_agent(
        &self,
        loader: &dyn CodebaseLoader,
        root: &Path,
        agent: &Agent,
        prompt: &str,
    ) -> Result<StructuredOutput> {
        let codebase = loader.load(root)?;
        let filtered = apply_filter(&codebase, Some(&agent.codebase_filters))?;
        info!(
            loaded = codebase.len(),
            selected = filtered.len(),
            "Codebase prepared"
        );

        self.generate(&agent.run_request(prompt), &filtered.content_map())
            .await
    }

    /// Read `paths` under `root` (unreadable ones become inline markers) and run
    #[instrument(skip_all, fields(files = paths.len(), provider = %request.llm_config.provider))]
    pub async fn run(
        &self,
        root: &Path,
        paths: &[String],
        request: &AgentRunRequest,
    ) -> Result<StructuredOutput> {
        let contents = read_codebase_files(root, paths);
        self.generate(request, &contents).await
    }

    /// Build messages from `contents` and call the request's provider
    pub async fn generate(
        &self,
        request: &AgentRunRequest,
        contents: &HashMap<String, String>,
    ) -> Result<StructuredOutput> {
        let provider = self.providers.get(&request.llm_config.provider)?;
        let messages = build_chat_messages(request, contents);
        debug!(
            provider = provider.name(),
            messages = messages.len(),
            "Dispatching run"
        );

        let output = provider
            .generate(&messages, request, self.credentials.as_ref())
            .await?;
        info!(keys = output.len(), "Run completed");
        Ok(output)
    }

    /// Markdown view and provider payload, without any network call
    pub fn prepare_prompt(
        &self,
        request: &AgentRunRequest,
        contents: &HashMap<String, String>,
    ) -> Result<PreparedPrompt> {
        let provider = self.providers.get(&request.llm_config.provider)?;
        let messages = build_chat_messages(request, contents);
        let payload = provider.build_payload(&messages, request)?;

        Ok(PreparedPrompt {
            markdown_prompt: build_prompt_markdown(request, contents)?,
            json_prompt: serde_json::to_string_pretty(&payload)?,
        })
    }

    /// Token estimate for running `agent` with `prompt` over `contents`
    pub fn estimate_tokens(
        &self,
        agent: &Agent,
        prompt: &str,
        contents: &HashMap<String, String>,
    ) -> usize {
        tokenizer::count(&self.counters, agent, prompt, &render_file_blocks(contents))
    }
}
