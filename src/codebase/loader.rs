use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Component, Path};
use std::sync::Arc;
use tracing::{debug, info};

use super::{CodeFile, Codebase};
use crate::constants::codebase::IGNORED_DIRS;
use crate::types::{ClarionError, Result};

/// Produces codebase snapshots from some backing store
pub trait CodebaseLoader: Send + Sync {
    /// Paths only, no content
    fn load_structure(&self, root: &Path) -> Result<Codebase>;

    /// Paths and content
    fn load(&self, root: &Path) -> Result<Codebase>;
}

/// Walks the local filesystem.
///
/// Any unreadable entry aborts the whole load; a partial snapshot is never
/// returned. Symlinked files are read through their target; symlinked
/// directories are not descended.
#[derive(Debug, Clone)]
pub struct LocalFsLoader {
    ignore_dirs: Arc<HashSet<String>>,
}

impl Default for LocalFsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalFsLoader {
    pub fn new() -> Self {
        Self {
            ignore_dirs: Arc::new(IGNORED_DIRS.iter().map(|d| d.to_string()).collect()),
        }
    }

    /// Add directory names to skip on top of the built-in set
    pub fn with_extra_ignore_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = (*self.ignore_dirs).clone();
        set.extend(dirs.into_iter().map(Into::into));
        self.ignore_dirs = Arc::new(set);
        self
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignore_dirs.contains(name)
    }

    fn walk(&self, root: &Path, with_content: bool) -> Result<Codebase> {
        let root = root
            .canonicalize()
            .map_err(|e| ClarionError::codebase_load(root, e))?;
        if !root.is_dir() {
            return Err(ClarionError::codebase_load(&root, "not a directory"));
        }

        let ignore_dirs = Arc::clone(&self.ignore_dirs);
        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(entry.depth() > 0
                    && is_dir
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| ignore_dirs.contains(name)))
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| ClarionError::codebase_load(&root, e))?;
            let path = entry.path();
            match entry.file_type() {
                Some(t) if t.is_file() => {}
                Some(t) if t.is_symlink() => {
                    // Broken links fail the load; linked directories are not descended
                    let target = std::fs::metadata(path)
                        .map_err(|e| ClarionError::codebase_load(path, e))?;
                    if target.is_dir() {
                        debug!(path = %path.display(), "Skipping symlinked directory");
                        continue;
                    }
                }
                _ => continue,
            }

            let rel = relative_slash_path(&root, path)
                .ok_or_else(|| ClarionError::codebase_load(path, "path escapes codebase root"))?;

            let content = if with_content {
                Some(std::fs::read(path).map_err(|e| ClarionError::codebase_load(path, e))?)
            } else {
                None
            };

            debug!(path = %rel, "Loaded file");
            files.push(CodeFile { path: rel, content });
        }

        info!(
            root = %root.display(),
            files = files.len(),
            with_content,
            "Codebase loaded"
        );
        Ok(Codebase::new(root, files))
    }
}

impl CodebaseLoader for LocalFsLoader {
    fn load_structure(&self, root: &Path) -> Result<Codebase> {
        self.walk(root, false)
    }

    fn load(&self, root: &Path) -> Result<Codebase> {
        self.walk(root, true)
    }
}

/// Relative path from `root` to `path` joined with `/` regardless of platform
fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
