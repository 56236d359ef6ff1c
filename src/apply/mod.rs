//! Structured-Output Applier
//!
//! Turns the `file_changes` list of a structured output into filesystem edits.
//!
//! ## Policy
//!
//! - Changes are applied in order; the first failure aborts the rest
//! - `create` makes missing parent directories and fails if the target exists
//! - `modify` and `delete` fail if the target does not exist
//! - Paths must be relative and stay inside the root

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::codebase::resolve_within;
use crate::types::{ChangeAction, ClarionError, FileChange, Result, StructuredOutput};

/// What [`apply_changes`] did, by action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub created: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl ApplyReport {
    pub fn total(&self) -> usize {
        self.created.len() + self.modified.len() + self.deleted.len()
    }
}

#[derive(Debug, Deserialize)]
struct RawChange {
    action: String,
    path: String,
    #[serde(default)]
    original_content: Option<String>,
    #[serde(default)]
    new_content: Option<String>,
}

/// The conventional `summary` string of a structured output
pub fn summary(output: &StructuredOutput) -> Option<&str> {
    output.get("summary").and_then(Value::as_str)
}

/// Parse the `file_changes` array of a structured output.
///
/// A missing or null key yields an empty list.
pub fn extract_file_changes(output: &StructuredOutput) -> Result<Vec<FileChange>> {
    let items = match output.get("file_changes") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ClarionError::StructuredOutput {
                message: "'file_changes' is not an array".to_string(),
                raw: other.to_string(),
            });
        }
    };

    items
        .iter()
        .map(|item| {
            let raw: RawChange = serde_json::from_value(item.clone()).map_err(|e| {
                ClarionError::StructuredOutput {
                    message: format!("invalid file change: {}", e),
                    raw: item.to_string(),
                }
            })?;
            let action = raw.action.parse::<ChangeAction>().map_err(|message| {
                ClarionError::ApplyChange {
                    action: raw.action.clone(),
                    path: raw.path.clone(),
                    message,
                }
            })?;
            Ok(FileChange {
                action,
                path: raw.path,
                original_content: raw.original_content,
                new_content: raw.new_content,
            })
        })
        .collect()
}

/// Apply `changes` under `root` sequentially
pub fn apply_changes(root: &Path, changes: &[FileChange]) -> Result<ApplyReport> {
    if root.as_os_str().is_empty() {
        return Err(ClarionError::Config(
            "Root path is required to apply changes".to_string(),
        ));
    }
    if !root.is_dir() {
        return Err(ClarionError::Config(format!(
            "Root path is not a directory: {}",
            root.display()
        )));
    }

    let mut report = ApplyReport::default();
    for change in changes {
        apply_one(root, change)?;
        debug!(action = %change.action, path = %change.path, "Applied change");
        let bucket = match change.action {
            ChangeAction::Create => &mut report.created,
            ChangeAction::Modify => &mut report.modified,
            ChangeAction::Delete => &mut report.deleted,
        };
        bucket.push(change.path.clone());
    }

    info!(
        created = report.created.len(),
        modified = report.modified.len(),
        deleted = report.deleted.len(),
        "Changes applied"
    );
    Ok(report)
}

fn apply_one(root: &Path, change: &FileChange) -> Result<()> {
    let target = resolve_within(root, &change.path)?;
    let fail = |message: String| ClarionError::ApplyChange {
        action: change.action.to_string(),
        path: change.path.clone(),
        message,
    };

    match change.action {
        ChangeAction::Create => {
            if target.exists() {
                return Err(fail("file already exists".to_string()));
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
            }
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .map_err(|e| fail(e.to_string()))?;
            let content = change.new_content.as_deref().unwrap_or_default();
            file.write_all(content.as_bytes())
                .map_err(|e| fail(e.to_string()))
        }
        ChangeAction::Modify => {
            if !target.is_file() {
                return Err(fail("file does not exist".to_string()));
            }
            let content = change
                .new_content
                .as_deref()
                .ok_or_else(|| fail("modify requires new_content".to_string()))?;
            std::fs::write(&target, content).map_err(|e| fail(e.to_string()))
        }
        ChangeAction::Delete => {
            if !target.is_file() {
                return Err(fail("file does not exist".to_string()));
            }
            std::fs::remove_file(&target).map_err(|e| fail(e.to_string()))
        }
    }
}
