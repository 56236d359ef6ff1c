//! Selective reads of a subset of project files.
//!
//! Unlike the loader, a failure here is per-file: the content is replaced by
//! an inline `// Error reading file: ...` marker and the batch continues.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use crate::constants::codebase::READ_ERROR_MARKER;
use crate::types::{ClarionError, Result};

/// Join a relative, `/`-separated path onto `root`, refusing anything that
/// could land outside it (absolute paths, `..`, drive prefixes).
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf> {
    let normalized = relative.replace('\\', "/");
    let candidate = Path::new(&normalized);

    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;
    for component in candidate.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ClarionError::UnsafePath(relative.to_string()));
            }
        }
    }

    if depth == 0 {
        return Err(ClarionError::UnsafePath(relative.to_string()));
    }
    Ok(resolved)
}

/// Read `paths` (relative to `root`) into a path to content map
pub fn read_codebase_files(root: &Path, paths: &[String]) -> HashMap<String, String> {
    let mut contents = HashMap::with_capacity(paths.len());

    for rel in paths {
        let read = resolve_within(root, rel).and_then(|full| {
            std::fs::read(&full)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(ClarionError::from)
        });

        let content = match read {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %rel, error = %e, "Skipping unreadable file");
                format!("{} {}", READ_ERROR_MARKER, e)
            }
        };
        contents.insert(rel.clone(), content);
    }

    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reads_requested_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.rs"), "fn a() {}").unwrap();
        fs::write(dir.path().join("b.rs"), "fn b() {}").unwrap();

        let map = read_codebase_files(dir.path(), &["src/a.rs".to_string()]);
        assert_eq!(map.len(), 1);
        assert_eq!(map["src/a.rs"], "fn a() {}");
    }

    #[test]
    fn test_missing_file_becomes_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.rs"), "ok").unwrap();

        let map = read_codebase_files(
            dir.path(),
            &["ok.rs".to_string(), "missing.rs".to_string()],
        );
        assert_eq!(map["ok.rs"], "ok");
        assert!(map["missing.rs"].starts_with(READ_ERROR_MARKER));
    }

    #[test]
    fn test_escaping_path_becomes_marker() {
        let dir = TempDir::new().unwrap();
        let map = read_codebase_files(dir.path(), &["../secret".to_string()]);
        assert!(map["../secret"].starts_with(READ_ERROR_MARKER));
    }

    #[test]
    fn test_resolve_within() {
        let root = Path::new("/project");
        assert_eq!(
            resolve_within(root, "src/./lib.rs").unwrap(),
            PathBuf::from("/project/src/lib.rs")
        );
        assert!(resolve_within(root, "/etc/passwd").is_err());
        assert!(resolve_within(root, "src/../../x").is_err());
        assert!(resolve_within(root, "").is_err());
        assert!(resolve_within(root, ".").is_err());
    }
}
