//! Run and Apply Commands
//!
//! `run` sends an agent task to its provider and prints the structured
//! output; with `--apply` the returned file changes are written to the root.
//! `apply` replays a saved structured output.

use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;
use tracing::info;

use crate::apply::{ApplyReport, apply_changes, extract_file_changes, summary};
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, load_agent, until_cancelled};
use crate::types::{ClarionError, Result, StructuredOutput};

/// Options for a single agent run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub root: PathBuf,
    pub agent: PathBuf,
    pub prompt: String,
    /// Explicit files to send; empty means "load and filter the root"
    pub paths: Vec<String>,
    /// Write the returned file changes under `root`
    pub apply: bool,
    /// Also save the raw structured output here
    pub save: Option<PathBuf>,
}

pub fn run(ctx: &CommandContext, options: RunOptions) -> Result<()> {
    let agent = load_agent(&options.agent)?;
    let request = agent.run_request(options.prompt.as_str());

    let rt = Runtime::new()?;
    let output = rt.block_on(until_cancelled(async {
        if options.paths.is_empty() {
            ctx.runner
                .run_agent(&ctx.loader, &options.root, &agent, &options.prompt)
                .await
        } else {
            ctx.runner.run(&options.root, &options.paths, &request).await
        }
    }))?;

    if let Some(path) = &options.save {
        std::fs::write(path, serde_json::to_string_pretty(&output)?)?;
        info!("Saved structured output to {}", path.display());
    }

    if options.apply {
        let report = apply_output(&options.root, &output)?;
        print_report(&output, &report);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

/// Apply a structured output previously saved as JSON
pub fn apply(root: &Path, output_file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(output_file)?;
    let output: StructuredOutput =
        serde_json::from_str(&raw).map_err(|e| ClarionError::StructuredOutput {
            message: format!("{} is not a JSON object: {}", output_file.display(), e),
            raw: raw.clone(),
        })?;

    let report = apply_output(root, &output)?;
    print_report(&output, &report);
    Ok(())
}

fn apply_output(root: &Path, output: &StructuredOutput) -> Result<ApplyReport> {
    let changes = extract_file_changes(output)?;
    apply_changes(root, &changes)
}

fn print_report(output: &StructuredOutput, report: &ApplyReport) {
    let ui = Output::new();
    if let Some(text) = summary(output) {
        ui.section("Summary");
        println!("{}", text);
    }

    if report.total() == 0 {
        ui.info("No file changes to apply");
        return;
    }
    for path in &report.created {
        ui.success(&format!("created  {}", path));
    }
    for path in &report.modified {
        ui.success(&format!("modified {}", path));
    }
    for path in &report.deleted {
        ui.success(&format!("deleted  {}", path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_apply_saved_output() {
        let root = TempDir::new().unwrap();
        let saved = root.path().join("output.json");
        fs::write(
            &saved,
            r#"{"summary":"greet","file_changes":[{"action":"create","path":"out/hello.txt","new_content":"hi"}]}"#,
        )
        .unwrap();

        apply(root.path(), &saved).unwrap();
        assert_eq!(
            fs::read_to_string(root.path().join("out/hello.txt")).unwrap(),
            "hi"
        );
    }

    #[test]
    fn test_apply_rejects_non_object() {
        let root = TempDir::new().unwrap();
        let saved = root.path().join("output.json");
        fs::write(&saved, "[1, 2]").unwrap();

        let err = apply(root.path(), &saved).unwrap_err();
        assert!(matches!(err, ClarionError::StructuredOutput { .. }));
    }
}
