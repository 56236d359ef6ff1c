//! Codebase Snapshot
//!
//! A [`Codebase`] is an immutable listing of a project directory taken at load
//! time. Files carry content only when it was asked for; structure-only loads
//! keep `content` as `None` so tree views stay cheap.
//!
//! ## Submodules
//!
//! - [`loader`]: directory walk with the noise-directory ignore set
//! - [`filter`]: include/exclude glob engine and status preview
//! - [`tree`]: hierarchical file tree for UI and CLI display
//! - [`reader`]: selective, non-fatal reads of a path subset

pub mod filter;
pub mod loader;
pub mod reader;
pub mod tree;

pub use filter::{FileStatus, apply_filter, file_statuses};
pub use loader::{CodebaseLoader, LocalFsLoader};
pub use reader::{read_codebase_files, resolve_within};
pub use tree::{FileTreeNode, NodeKind, build_file_tree, render_tree};

use std::collections::HashMap;
use std::path::PathBuf;

/// A single file in a codebase snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFile {
    /// Path relative to the codebase root, always `/`-separated
    pub path: String,
    /// Raw bytes, absent for structure-only loads
    pub content: Option<Vec<u8>>,
}

impl CodeFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
        }
    }

    pub fn structure_only(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
        }
    }

    /// Content decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Option<String> {
        self.content
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Codebase {
    pub root: PathBuf,
    pub files: Vec<CodeFile>,
}

impl Codebase {
    pub fn new(root: impl Into<PathBuf>, files: Vec<CodeFile>) -> Self {
        Self {
            root: root.into(),
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Path to text mapping of every file that carries content
    pub fn content_map(&self) -> HashMap<String, String> {
        self.files
            .iter()
            .filter_map(|f| f.text().map(|text| (f.path.clone(), text)))
            .collect()
    }
}

/// `File: <path>` plus fenced content for every entry, in path order.
///
/// Counted for token estimates; an empty map renders as an empty string.
pub fn render_file_blocks(contents: &HashMap<String, String>) -> String {
    let mut paths: Vec<&String> = contents.keys().collect();
    paths.sort();

    let mut out = String::new();
    for path in paths {
        out.push_str(&format!("File: {}\n```\n{}\n```\n\n", path, contents[path]));
    }
    out.trim().to_string()
}
