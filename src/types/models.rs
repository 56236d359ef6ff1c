//! Domain model shared by the loader, prompt builder, providers and applier.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured output returned by a provider: an arbitrary JSON object.
///
/// By convention it carries a `summary` string and a `file_changes` list, but
/// nothing in the pipeline enforces that beyond what the schema asks for.
pub type StructuredOutput = Map<String, Value>;

// =============================================================================
// LLM Configuration
// =============================================================================

/// LLM selection for an agent or a single run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Registry key, e.g. "OpenAI", "OpenRouter"
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    /// Free-form knobs: temperature, top_p, max tokens, reasoning effort...
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Id of the stored credential record, resolved at call time
    #[serde(rename = "configId", default, skip_serializing_if = "String::is_empty")]
    pub config_id: String,
}

impl LlmConfig {
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).and_then(Value::as_f64)
    }

    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.parameters
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| *v >= 0.0)
            .map(|v| v as u64)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}

/// A stored credential record as returned by the credential resolver.
///
/// The API key is kept as a `SecretString` and never printed.
#[derive(Clone)]
pub struct LlmProviderConfig {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub api_key: SecretString,
}

impl LlmProviderConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: provider.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for LlmProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProviderConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Agent
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub icon: String,
}

/// Include/exclude rule bundle applied to a codebase file list.
///
/// Exclude patterns are always evaluated first; an empty include list means
/// "everything not excluded".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    /// Optional regex a file's content must match to be kept
    pub content_regex_include: String,
    /// Cap on the number of retained files (0 = unlimited)
    pub max_total_files: usize,
}

impl FilterSet {
    pub fn new(include_globs: Vec<String>, exclude_globs: Vec<String>) -> Self {
        Self {
            include_globs,
            exclude_globs,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSchema {
    pub schema: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserVariableDef {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// A persisted agent definition: prompt, filters, output schema and LLM choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    pub profile: AgentProfile,
    pub system_prompt: String,
    pub codebase_filters: FilterSet,
    pub output_schema: OutputSchema,
    pub user_variables: Vec<UserVariableDef>,
    pub llm_config: LlmConfig,
}

impl Agent {
    /// Turn this agent plus a task into a single-run request
    pub fn run_request(&self, prompt: impl Into<String>) -> AgentRunRequest {
        let mut output_schema = Map::new();
        if !self.output_schema.schema.is_empty() {
            output_schema.insert(
                "schema".to_string(),
                Value::Object(self.output_schema.schema.clone()),
            );
        }
        AgentRunRequest {
            system_instruction: self.system_prompt.clone(),
            prompt: prompt.into(),
            output_schema,
            llm_config: self.llm_config.clone(),
        }
    }
}

/// One invocation of an agent. Transient; never persisted by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentRunRequest {
    pub system_instruction: String,
    pub prompt: String,
    /// Either `{"schema": {...}}` or a bare JSON schema
    pub output_schema: Map<String, Value>,
    pub llm_config: LlmConfig,
}

// =============================================================================
// Chat Messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Developer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Developer => "developer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// =============================================================================
// File Changes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Modify,
    Delete,
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeAction::Create => write!(f, "create"),
            ChangeAction::Modify => write!(f, "modify"),
            ChangeAction::Delete => write!(f, "delete"),
        }
    }
}

impl std::str::FromStr for ChangeAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "create" => Ok(ChangeAction::Create),
            "modify" => Ok(ChangeAction::Modify),
            "delete" => Ok(ChangeAction::Delete),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}

/// A single file modification instruction parsed from a structured output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub action: ChangeAction,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
}

impl FileChange {
    pub fn create(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            action: ChangeAction::Create,
            path: path.into(),
            original_content: None,
            new_content: Some(content.into()),
        }
    }

    pub fn modify(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            action: ChangeAction::Modify,
            path: path.into(),
            original_content: None,
            new_content: Some(content.into()),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            action: ChangeAction::Delete,
            path: path.into(),
            original_content: None,
            new_content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_llm_config_params() {
        let config: LlmConfig = serde_json::from_value(json!({
            "provider": "OpenAI",
            "model": "gpt-4o",
            "parameters": {"temperature": 0.2, "max_output_tokens": 2048.0, "reasoning_effort": "low"},
            "configId": "cfg-1"
        }))
        .unwrap();

        assert_eq!(config.config_id, "cfg-1");
        assert_eq!(config.param_f64("temperature"), Some(0.2));
        assert_eq!(config.param_u64("max_output_tokens"), Some(2048));
        assert_eq!(config.param_str("reasoning_effort"), Some("low"));
        assert_eq!(config.param_f64("top_p"), None);
    }

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let config = LlmProviderConfig::new("id", "Main", "OpenAI", "sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert!(config.has_api_key());
    }

    #[test]
    fn test_agent_from_yaml() {
        let yaml = r#"
profile:
  id: refactor
  name: Refactorer
system_prompt: You refactor code.
codebase_filters:
  include_globs: ["src/**"]
  exclude_globs: ["src/generated/**"]
output_schema:
  schema:
    type: object
    properties:
      summary: { type: string }
llm_config:
  provider: OpenAI
  model: gpt-4o
  configId: main
"#;
        let agent: Agent = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(agent.profile.id, "refactor");
        assert_eq!(agent.codebase_filters.include_globs, vec!["src/**"]);
        assert_eq!(agent.codebase_filters.max_total_files, 0);

        let request = agent.run_request("rename foo");
        assert_eq!(request.prompt, "rename foo");
        assert_eq!(request.output_schema["schema"]["type"], "object");
        assert_eq!(request.llm_config.config_id, "main");
    }

    #[test]
    fn test_agent_without_schema_has_empty_output_schema() {
        let agent = Agent::default();
        assert!(agent.run_request("x").output_schema.is_empty());
    }

    #[test]
    fn test_file_change_serde() {
        let change: FileChange = serde_json::from_value(json!({
            "action": "create",
            "path": "hello.txt",
            "new_content": "Hello"
        }))
        .unwrap();
        assert_eq!(change, FileChange::create("hello.txt", "Hello"));

        let out = serde_json::to_value(FileChange::delete("old.txt")).unwrap();
        assert_eq!(out, json!({"action": "delete", "path": "old.txt"}));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::system("be brief");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "system", "content": "be brief"})
        );
        assert_eq!(Role::Developer.to_string(), "developer");
    }
}
