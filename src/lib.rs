//! Clarion - Local Code Assistant Backend
//!
//! Loads a codebase from disk, narrows it with glob and content filters,
//! builds a deterministic prompt, sends it to an LLM provider that answers in
//! strict JSON, and applies the returned file changes back to disk.
//!
//! ## Quick Start
//!
//! ```ignore
//! use clarion::{AgentRunner, InMemoryCredentialStore, LocalFsLoader, TokenCounterRegistry};
//! use clarion::ai::provider::default_registry;
//!
//! let runner = AgentRunner::new(
//!     Arc::new(default_registry()),
//!     Arc::new(InMemoryCredentialStore::new().with(credential)),
//!     Arc::new(TokenCounterRegistry::with_defaults()),
//! );
//! let output = runner.run_agent(&LocalFsLoader::new(), &root, &agent, "Add a README").await?;
//! let report = clarion::apply::apply_changes(&root, &extract_file_changes(&output)?)?;
//! ```
//!
//! ## Modules
//!
//! - [`codebase`]: loading, glob filtering, file tree, selective reads
//! - [`ai`]: prompt building, provider registry, token counting
//! - [`apply`]: structured-output file changes
//! - [`pipeline`]: the end-to-end agent runner
//! - [`config`]: layered configuration and configured credentials

pub mod ai;
pub mod apply;
pub mod cli;
pub mod codebase;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigCredentialStore, ConfigLoader};

// Error Types
pub use types::error::{ClarionError, ErrorCategory, Result};

// Domain
pub use types::{
    Agent, AgentRunRequest, ChangeAction, ChatMessage, FileChange, FilterSet, LlmConfig,
    LlmProviderConfig, Role, StructuredOutput,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use apply::{ApplyReport, apply_changes, extract_file_changes};
pub use codebase::{Codebase, CodebaseLoader, LocalFsLoader, apply_filter};
pub use pipeline::{AgentRunner, PreparedPrompt};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    CredentialResolver, InMemoryCredentialStore, LlmProvider, ProviderRegistry, TokenCounter,
    TokenCounterRegistry,
};
