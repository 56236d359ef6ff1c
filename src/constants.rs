//! Global Constants
//!
//! Centralized constants for loading, prompting and provider wiring.

/// Codebase loading constants
pub mod codebase {
    /// Directory names skipped at any depth while walking a project
    pub const IGNORED_DIRS: &[&str] = &[
        ".git",
        "node_modules",
        "dist",
        "build",
        ".vscode",
        ".idea",
        "target",
        "__pycache__",
        ".venv",
        "venv",
    ];

    /// Prefix of the inline marker written for files the selective reader could not read
    pub const READ_ERROR_MARKER: &str = "// Error reading file:";
}

/// Prompt layout constants
pub mod prompt {
    pub const CODEBASE_HEADER: &str = "## Codebase Context\n";
    pub const TASK_HEADER: &str = "## User's Task\n";
    pub const SYSTEM_HEADER: &str = "## System Instructions: \n";
    pub const SCHEMA_HEADER: &str = "## Output Schema: \n";
}

/// Provider names and endpoints
pub mod provider {
    pub const OPENAI: &str = "OpenAI";
    pub const OPENROUTER: &str = "OpenRouter";
    pub const ANTHROPIC: &str = "Anthropic";
    pub const GEMINI: &str = "Google Gemini";

    /// Base URL of the OpenAI Responses API (`/responses` is appended)
    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

    /// Base URL of the OpenRouter API (`/chat/completions` is appended)
    pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

    /// Name attached to the strict json_schema response format
    pub const STRUCTURED_OUTPUT_NAME: &str = "structured_output";
}

/// Token counting constants
pub mod tokens {
    /// Tokens per word used by the approximation counter
    pub const WORD_TOKEN_MULTIPLIER: f64 = 1.33;

    /// Model used for tiktoken lookups when the agent names none
    pub const DEFAULT_TIKTOKEN_MODEL: &str = "gpt-4o";

    /// Name reported when the approximation counter is used
    pub const APPROXIMATION: &str = "Approximation";
}

/// Server-facing defaults carried in configuration
pub mod server {
    pub const DEFAULT_PORT: u16 = 2077;
}
