//! Codebase Commands
//!
//! Inspect what a run would see, without contacting any provider.
//!
//! Usage:
//!   clarion tree [ROOT] [-f json]
//!   clarion files [ROOT] [--agent FILE] [--include G]... [--exclude G]...
//!   clarion preview-filter [ROOT] [--include G]... [--exclude G]... [-f json]

use std::collections::BTreeMap;
use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, load_agent};
use crate::codebase::{
    CodebaseLoader, FileStatus, apply_filter, build_file_tree, file_statuses, render_tree,
};
use crate::types::{FilterSet, Result};

/// Print the directory tree of `root`
pub fn tree(ctx: &CommandContext, root: &Path, format: &str) -> Result<()> {
    let codebase = ctx.loader.load_structure(root)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&build_file_tree(&codebase))?);
    } else {
        print!("{}", render_tree(&codebase));
    }
    Ok(())
}

/// Filter rules from an agent file, with CLI globs appended
fn filter_set(agent: Option<&Path>, include: Vec<String>, exclude: Vec<String>) -> Result<FilterSet> {
    let mut filters = match agent {
        Some(path) => load_agent(path)?.codebase_filters,
        None => FilterSet::default(),
    };
    filters.include_globs.extend(include);
    filters.exclude_globs.extend(exclude);
    Ok(filters)
}

/// List the files a run would include
pub fn files(
    ctx: &CommandContext,
    root: &Path,
    agent: Option<&Path>,
    include: Vec<String>,
    exclude: Vec<String>,
    format: &str,
) -> Result<()> {
    let filters = filter_set(agent, include, exclude)?;
    let needs_content = !filters.content_regex_include.trim().is_empty();
    let codebase = if needs_content {
        ctx.loader.load(root)?
    } else {
        ctx.loader.load_structure(root)?
    };

    let mut paths = apply_filter(&codebase, Some(&filters))?.paths();
    paths.sort();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&paths)?);
    } else {
        for path in &paths {
            println!("{}", path);
        }
        Output::new().info(&format!("{} of {} files selected", paths.len(), codebase.len()));
    }
    Ok(())
}

/// Show the include/exclude status of every file under `root`
pub fn preview_filter(
    ctx: &CommandContext,
    root: &Path,
    include: &[String],
    exclude: &[String],
    format: &str,
) -> Result<()> {
    let codebase = ctx.loader.load_structure(root)?;
    let statuses: BTreeMap<String, FileStatus> =
        file_statuses(&codebase.paths(), include, exclude)
            .into_iter()
            .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    let output = Output::new();
    for (path, status) in &statuses {
        output.file_status(path, *status);
    }
    let included = statuses
        .values()
        .filter(|s| **s == FileStatus::Included)
        .count();
    output.info(&format!(
        "{} included, {} excluded",
        included,
        statuses.len() - included
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_filter_set_merges_agent_and_cli_globs() {
        let dir = TempDir::new().unwrap();
        let agent = dir.path().join("agent.yaml");
        fs::write(
            &agent,
            "codebase_filters:\n  include_globs: [\"src/**\"]\n  max_total_files: 5\n",
        )
        .unwrap();

        let filters = filter_set(Some(&agent), vec!["docs/*.md".into()], vec!["**/*.lock".into()])
            .unwrap();
        assert_eq!(filters.include_globs, vec!["src/**", "docs/*.md"]);
        assert_eq!(filters.exclude_globs, vec!["**/*.lock"]);
        assert_eq!(filters.max_total_files, 5);
    }

    #[test]
    fn test_filter_set_without_agent() {
        let filters = filter_set(None, vec![], vec!["target/**".into()]).unwrap();
        assert!(filters.include_globs.is_empty());
        assert_eq!(filters.exclude_globs, vec!["target/**"]);
    }
}
