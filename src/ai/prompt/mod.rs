//! Prompt Builder
//!
//! Deterministic rendering of a run request plus codebase contents.
//!
//! ## Views
//!
//! - [`build_chat_messages`]: what is actually sent to a provider
//! - [`build_prompt_markdown`]: human-readable inspection view
//! - [`build_prompt_json`]: structured inspection view
//!
//! All three sort codebase files by path, so repeated calls with the same
//! content map produce byte-identical output regardless of map iteration order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::constants::prompt::{CODEBASE_HEADER, SCHEMA_HEADER, SYSTEM_HEADER, TASK_HEADER};
use crate::types::{AgentRunRequest, ChatMessage, Result};

/// Single file entry of the JSON prompt view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

/// Structured form of every prompt component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptData {
    #[serde(rename = "Codebase", default, skip_serializing_if = "Vec::is_empty")]
    pub codebase: Vec<FileContent>,
    #[serde(rename = "Prompt")]
    pub prompt: String,
    #[serde(rename = "System Instructions")]
    pub system_instructions: String,
    #[serde(rename = "Output Schema")]
    pub output_schema: Map<String, Value>,
}

impl PromptData {
    pub fn new(request: &AgentRunRequest, codebase_content: &HashMap<String, String>) -> Self {
        Self {
            codebase: sorted_files(codebase_content),
            prompt: request.prompt.clone(),
            system_instructions: request.system_instruction.clone(),
            output_schema: request.output_schema.clone(),
        }
    }
}

fn sorted_files(codebase_content: &HashMap<String, String>) -> Vec<FileContent> {
    let mut files: Vec<FileContent> = codebase_content
        .iter()
        .map(|(path, content)| FileContent {
            path: path.clone(),
            content: content.clone(),
        })
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// "Codebase Context" section, or an empty string when there are no files
pub fn format_codebase_context(codebase_content: &HashMap<String, String>) -> String {
    render_files(&sorted_files(codebase_content))
}

fn render_files(files: &[FileContent]) -> String {
    if files.is_empty() {
        return String::new();
    }

    let mut out = String::from(CODEBASE_HEADER);
    for file in files {
        out.push_str(&format!(
            "File: {}\n```\n{}\n```\n\n",
            file.path, file.content
        ));
    }
    out
}

/// Messages for a single run: an optional system message, then exactly one user message
pub fn build_chat_messages(
    request: &AgentRunRequest,
    codebase_content: &HashMap<String, String>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);

    if !request.system_instruction.is_empty() {
        messages.push(ChatMessage::system(request.system_instruction.clone()));
    }

    let mut user = format_codebase_context(codebase_content);
    user.push_str(TASK_HEADER);
    user.push_str(&request.prompt);
    messages.push(ChatMessage::user(user));

    messages
}

pub fn build_prompt_markdown(
    request: &AgentRunRequest,
    codebase_content: &HashMap<String, String>,
) -> Result<String> {
    let data = PromptData::new(request, codebase_content);

    let mut out = render_files(&data.codebase);
    out.push_str(TASK_HEADER);
    out.push_str(&data.prompt);
    out.push_str("\n\n");

    out.push_str(SYSTEM_HEADER);
    out.push_str(&data.system_instructions);
    out.push_str("\n\n");

    out.push_str(SCHEMA_HEADER);
    out.push_str("```json\n");
    out.push_str(&serde_json::to_string_pretty(&data.output_schema)?);
    out.push_str("\n```\n");

    Ok(out)
}

pub fn build_prompt_json(
    request: &AgentRunRequest,
    codebase_content: &HashMap<String, String>,
) -> Result<String> {
    let data = PromptData::new(request, codebase_content);
    Ok(serde_json::to_string_pretty(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use serde_json::json;

    fn request(system: &str, prompt: &str) -> AgentRunRequest {
        AgentRunRequest {
            system_instruction: system.to_string(),
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    fn contents(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn test_messages_without_system_instruction() {
        let messages = build_chat_messages(
            &request("", "do X"),
            &contents(&[("b.go", "B"), ("a.go", "A")]),
        );

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(
            messages[0].content,
            "## Codebase Context\nFile: a.go\n```\nA\n```\n\nFile: b.go\n```\nB\n```\n\n## User's Task\ndo X"
        );
    }

    #[test]
    fn test_messages_with_system_instruction() {
        let messages = build_chat_messages(&request("be terse", "task"), &HashMap::new());

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system("be terse"));
        assert_eq!(messages[1].content, "## User's Task\ntask");
    }

    #[test]
    fn test_messages_are_deterministic() {
        let files: Vec<(String, String)> = (0..50)
            .map(|i| (format!("f{:02}.rs", i), format!("c{}", i)))
            .collect();
        let forward: HashMap<_, _> = files.iter().cloned().collect();
        let reverse: HashMap<_, _> = files.iter().rev().cloned().collect();

        let req = request("sys", "task");
        assert_eq!(
            build_chat_messages(&req, &forward),
            build_chat_messages(&req, &reverse)
        );
    }

    #[test]
    fn test_markdown_view_layout() {
        let mut req = request("sys", "task");
        req.output_schema = json!({"type": "object"}).as_object().cloned().unwrap();

        let md = build_prompt_markdown(&req, &contents(&[("a.rs", "A")])).unwrap();
        assert_eq!(
            md,
            "## Codebase Context\nFile: a.rs\n```\nA\n```\n\n\
             ## User's Task\ntask\n\n\
             ## System Instructions: \nsys\n\n\
             ## Output Schema: \n```json\n{\n  \"type\": \"object\"\n}\n```\n"
        );
    }

    #[test]
    fn test_json_view_keys() {
        let req = request("sys", "task");
        let raw = build_prompt_json(&req, &contents(&[("b", "2"), ("a", "1")])).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(
            value,
            json!({
                "Codebase": [{"path": "a", "content": "1"}, {"path": "b", "content": "2"}],
                "Prompt": "task",
                "System Instructions": "sys",
                "Output Schema": {}
            })
        );
        assert!(raw.contains("\n  \"Prompt\""));
    }

    #[test]
    fn test_json_view_omits_empty_codebase() {
        let raw = build_prompt_json(&request("", "t"), &HashMap::new()).unwrap();
        assert!(!raw.contains("Codebase"));
    }
}
