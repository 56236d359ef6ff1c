//! Unified Error Type System
//!
//! Centralized error types for the whole pipeline.
//!
//! ## Error Categories
//!
//! - **Configuration**: missing credential, unknown provider, malformed schema (fail fast)
//! - **Io**: codebase load or file application failures
//! - **Network**: provider transport or non-success status
//! - **Parse**: unexpected response shape or JSON decode failure
//! - **Apply**: a file change could not be applied
//! - **Cancelled**: the caller abandoned the operation
//!
//! Nothing here is retried. Token counting is the only self-healing path and it
//! never surfaces an error to begin with.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories used by the transport boundary to pick a user-visible status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing configuration - surfaced immediately
    Configuration,
    /// Local filesystem failure
    Io,
    /// Provider unreachable or returned a non-success status
    Network,
    /// Provider answered with something we could not understand
    Parse,
    /// A file change failed to apply
    Apply,
    /// Operation cancelled by the caller
    Cancelled,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Io => write!(f, "IO"),
            Self::Network => write!(f, "NETWORK"),
            Self::Parse => write!(f, "PARSE"),
            Self::Apply => write!(f, "APPLY"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl ErrorCategory {
    /// HTTP status a transport layer should answer with for this category
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Configuration => 400,
            Self::Io | Self::Apply => 500,
            Self::Network | Self::Parse => 502,
            Self::Cancelled => 499,
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

/// Underlying cause kept by errors that wrap foreign failures
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClarionError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("unsupported LLM provider: {0}. Please check your agent configuration.")]
    UnsupportedProvider(String),

    #[error("provider '{0}' is not yet implemented")]
    NotImplemented(String),

    #[error("Invalid output schema: {0}")]
    InvalidSchema(String),

    // -------------------------------------------------------------------------
    // Codebase Errors
    // -------------------------------------------------------------------------
    #[error("Failed to load codebase at {}: {source}", path.display())]
    CodebaseLoad {
        path: PathBuf,
        #[source]
        source: BoxedSource,
    },

    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    #[error("{provider} request failed: {message}")]
    Http { provider: String, message: String },

    #[error("{provider} API error ({status}): {body}")]
    ProviderApi {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("invalid response structure from {provider}: {message}")]
    ResponseShape { provider: String, message: String },

    #[error("failed to parse structured output from model response: {message}. Raw content: {raw}")]
    StructuredOutput { message: String, raw: String },

    // -------------------------------------------------------------------------
    // Apply Errors
    // -------------------------------------------------------------------------
    #[error("Failed to apply change for {path} ({action}): {message}")]
    ApplyChange {
        action: String,
        path: String,
        message: String,
    },

    #[error("Refusing to touch path outside the project root: {0}")]
    UnsafePath(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ClarionError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl ClarionError {
    /// Classify into the coarse taxonomy used at the transport boundary
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_)
            | Self::Credential(_)
            | Self::UnsupportedProvider(_)
            | Self::NotImplemented(_)
            | Self::InvalidSchema(_)
            | Self::Yaml(_) => ErrorCategory::Configuration,
            Self::Io(_) | Self::CodebaseLoad { .. } => ErrorCategory::Io,
            Self::Http { .. } | Self::ProviderApi { .. } => ErrorCategory::Network,
            Self::Json(_) | Self::ResponseShape { .. } | Self::StructuredOutput { .. } => {
                ErrorCategory::Parse
            }
            Self::ApplyChange { .. } | Self::UnsafePath(_) => ErrorCategory::Apply,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Create a transport error for a provider
    pub fn http(provider: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Http {
            provider: provider.into(),
            message: err.to_string(),
        }
    }

    /// Create a response-shape error for a provider
    pub fn response_shape(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResponseShape {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a codebase load error
    pub fn codebase_load(path: impl Into<PathBuf>, source: impl Into<BoxedSource>) -> Self {
        Self::CodebaseLoad {
            path: path.into(),
            source: source.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
