//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ai::provider::ProviderRegistry;
use crate::ai::tokenizer::TokenCounterRegistry;
use crate::codebase::{CodebaseLoader, LocalFsLoader, apply_filter, read_codebase_files};
use crate::config::{Config, ConfigCredentialStore, ConfigLoader};
use crate::pipeline::AgentRunner;
use crate::types::{Agent, ClarionError, Result};

/// Command execution context
///
/// Everything a command needs to load codebases and talk to providers,
/// built once from the effective configuration.
pub struct CommandContext {
    pub config: Config,
    pub loader: LocalFsLoader,
    pub runner: AgentRunner,
}

impl CommandContext {
    /// Load configuration and wire the registries
    pub fn load() -> Result<Self> {
        Ok(Self::from_config(ConfigLoader::load()?))
    }

    pub fn from_config(config: Config) -> Self {
        let loader =
            LocalFsLoader::new().with_extra_ignore_dirs(config.codebase.extra_ignore_dirs.clone());
        let providers = ProviderRegistry::with_defaults(
            &config.providers.openai_api_base,
            &config.providers.openrouter_api_base,
        );
        let runner = AgentRunner::new(
            Arc::new(providers),
            Arc::new(ConfigCredentialStore::from_config(&config)),
            Arc::new(TokenCounterRegistry::with_defaults()),
        );

        Self {
            config,
            loader,
            runner,
        }
    }

    /// Codebase contents for an agent run.
    ///
    /// Explicit `paths` are read selectively; otherwise the whole root is
    /// loaded and narrowed by the agent's filters.
    pub fn gather_contents(
        &self,
        root: &Path,
        agent: &Agent,
        paths: &[String],
    ) -> Result<std::collections::HashMap<String, String>> {
        if !paths.is_empty() {
            return Ok(read_codebase_files(root, paths));
        }
        let codebase = self.loader.load(root)?;
        Ok(apply_filter(&codebase, Some(&agent.codebase_filters))?.content_map())
    }
}

/// Read an agent definition from a YAML file
pub fn load_agent(path: &Path) -> Result<Agent> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ClarionError::Config(format!("Failed to read agent file {}: {}", path.display(), e))
    })?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Resolve the codebase root, defaulting to the current directory
pub fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => Ok(std::env::current_dir()?),
    }
}

/// Race `fut` against Ctrl-C; dropping the future cancels any in-flight request
pub async fn until_cancelled<F, T>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        result = fut => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            Err(ClarionError::Cancelled)
        }
    }
}
