//! Filter Engine
//!
//! Include/exclude glob rules over relative paths.
//!
//! ## Precedence
//!
//! 1. Backslashes in the path are normalized to `/`
//! 2. A path matching any exclude glob is dropped
//! 3. With no include globs, everything left is kept
//! 4. Otherwise a path is kept iff it matches at least one include glob
//!
//! `*` and `?` never cross a `/`; `**` as a whole segment spans any number of
//! directories, so `node_modules/**` covers the entire tree below it.

use glob::{MatchOptions, Pattern};
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::Codebase;
use crate::types::{ClarionError, FilterSet, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Preview classification of a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Included,
    Excluded,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Included => "included",
            FileStatus::Excluded => "excluded",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled include/exclude pattern pair
struct GlobRules {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl GlobRules {
    fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: compile(include),
            exclude: compile(exclude),
        }
    }

    fn status(&self, path: &str) -> FileStatus {
        let path = normalize_path(path);
        if matches_any(&self.exclude, &path) {
            return FileStatus::Excluded;
        }
        if self.include.is_empty() || matches_any(&self.include, &path) {
            FileStatus::Included
        } else {
            FileStatus::Excluded
        }
    }
}

/// Invalid patterns can never match anything, so they are dropped with a warning
fn compile(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(pattern = %raw, error = %e, "Ignoring invalid glob pattern");
                None
            }
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], path: &str) -> bool {
    patterns.iter().any(|p| p.matches_with(path, MATCH_OPTIONS))
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Apply a filter set to a codebase, returning a new snapshot.
///
/// `None` yields an unmodified copy. After glob filtering, files whose content
/// is loaded and does not match `content_regex_include` are dropped, then the
/// result is capped at `max_total_files` in path order.
pub fn apply_filter(codebase: &Codebase, filter: Option<&FilterSet>) -> Result<Codebase> {
    let Some(filter) = filter else {
        return Ok(codebase.clone());
    };

    let rules = GlobRules::new(&filter.include_globs, &filter.exclude_globs);
    let content_regex = match filter.content_regex_include.trim() {
        "" => None,
        raw => Some(Regex::new(raw).map_err(|e| {
            ClarionError::Config(format!("invalid content regex '{}': {}", raw, e))
        })?),
    };

    let mut files: Vec<_> = codebase
        .files
        .iter()
        .filter(|f| rules.status(&f.path) == FileStatus::Included)
        .filter(|f| match (&content_regex, &f.content) {
            (Some(re), Some(content)) => re.is_match(content),
            _ => true,
        })
        .cloned()
        .collect();

    if filter.max_total_files > 0 && files.len() > filter.max_total_files {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.truncate(filter.max_total_files);
    }

    debug!(
        before = codebase.len(),
        after = files.len(),
        "Applied codebase filter"
    );
    Ok(Codebase::new(codebase.root.clone(), files))
}

/// Classify arbitrary paths without touching file content
pub fn file_statuses(
    paths: &[String],
    include_globs: &[String],
    exclude_globs: &[String],
) -> HashMap<String, FileStatus> {
    let rules = GlobRules::new(include_globs, exclude_globs);
    paths
        .iter()
        .map(|p| (p.clone(), rules.status(p)))
        .collect()
}
