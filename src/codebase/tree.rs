use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::Codebase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// Node of the hierarchical view served to tree widgets.
///
/// `id` and `path` are both the `/`-joined path from the codebase root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeNode {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileTreeNode>,
}

impl FileTreeNode {
    fn new(path: String, name: &str, kind: NodeKind) -> Self {
        Self {
            id: path.clone(),
            name: name.to_string(),
            path,
            kind,
            children: Vec::new(),
        }
    }
}

/// Convert a flat codebase into top-level tree nodes.
///
/// Children keep the order in which they were first seen in `codebase.files`.
/// Nodes are indexed by path, so each path segment is looked up once.
pub fn build_file_tree(codebase: &Codebase) -> Vec<FileTreeNode> {
    let mut nodes: Vec<FileTreeNode> = Vec::new();
    let mut children: Vec<Vec<usize>> = Vec::new();
    let mut by_path: HashMap<String, usize> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    for file in &codebase.files {
        let normalized = file.path.replace('\\', "/");
        let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
        let mut path = String::new();
        let mut parent: Option<usize> = None;

        for (i, part) in parts.iter().enumerate() {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(part);

            let idx = match by_path.get(&path) {
                Some(&idx) => idx,
                None => {
                    let kind = if i == parts.len() - 1 {
                        NodeKind::File
                    } else {
                        NodeKind::Folder
                    };
                    let idx = nodes.len();
                    nodes.push(FileTreeNode::new(path.clone(), part, kind));
                    children.push(Vec::new());
                    by_path.insert(path.clone(), idx);
                    match parent {
                        Some(p) => children[p].push(idx),
                        None => roots.push(idx),
                    }
                    idx
                }
            };
            parent = Some(idx);
        }
    }

    let mut slots: Vec<Option<FileTreeNode>> = nodes.into_iter().map(Some).collect();
    roots
        .iter()
        .filter_map(|&idx| assemble(idx, &mut slots, &children))
        .collect()
}

fn assemble(
    idx: usize,
    slots: &mut [Option<FileTreeNode>],
    children: &[Vec<usize>],
) -> Option<FileTreeNode> {
    let mut node = slots[idx].take()?;
    node.children = children[idx]
        .iter()
        .filter_map(|&child| assemble(child, slots, children))
        .collect();
    Some(node)
}

#[derive(Default)]
struct DirEntry {
    dirs: BTreeMap<String, DirEntry>,
    files: Vec<String>,
}

/// ASCII rendering of the codebase, directories before files, both sorted
pub fn render_tree(codebase: &Codebase) -> String {
    let mut root = DirEntry::default();
    for file in &codebase.files {
        let normalized = file.path.replace('\\', "/");
        let mut parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
        let Some(name) = parts.pop() else { continue };

        let mut node = &mut root;
        for dir in parts {
            node = node.dirs.entry(dir.to_string()).or_default();
        }
        node.files.push(name.to_string());
    }

    let root_name = codebase
        .root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| codebase.root.display().to_string());

    let mut out = format!("{}/\n", root_name);
    render_dir(&mut root, "", &mut out);
    out
}

fn render_dir(node: &mut DirEntry, prefix: &str, out: &mut String) {
    node.files.sort();
    let total = node.dirs.len() + node.files.len();
    let mut index = 0;

    for (name, child) in node.dirs.iter_mut() {
        index += 1;
        let last = index == total;
        out.push_str(&format!("{}{}{}/\n", prefix, branch(last), name));
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_dir(child, &child_prefix, out);
    }

    for name in &node.files {
        index += 1;
        out.push_str(&format!("{}{}{}\n", prefix, branch(index == total), name));
    }
}

fn branch(last: bool) -> &'static str {
    if last { "└── " } else { "├── " }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebase::CodeFile;
    use serde_json::json;

    fn structure(paths: &[&str]) -> Codebase {
        Codebase::new(
            "/work/demo",
            paths.iter().map(|p| CodeFile::structure_only(*p)).collect(),
        )
    }

    #[test]
    fn test_build_file_tree_nests_folders() {
        let cb = structure(&["src/lib.rs", "src/cli/mod.rs", "README.md"]);
        let tree = build_file_tree(&cb);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "src");
        assert_eq!(tree[0].kind, NodeKind::Folder);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[1].path, "src/cli");
        assert_eq!(tree[0].children[1].children[0].id, "src/cli/mod.rs");
        assert_eq!(tree[1].kind, NodeKind::File);
    }

    #[test]
    fn test_file_tree_keeps_first_seen_order() {
        let cb = structure(&["b/x.rs", "a.rs", "b/y.rs", "c/d/e.rs", "b/z.rs", "c/d/f.rs"]);
        let tree = build_file_tree(&cb);

        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        let b: Vec<&str> = tree[0].children.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(b, vec!["b/x.rs", "b/y.rs", "b/z.rs"]);
        assert_eq!(tree[2].children.len(), 1);
        assert_eq!(tree[2].children[0].children.len(), 2);
        assert_eq!(tree[2].children[0].children[1].id, "c/d/f.rs");
    }

    #[test]
    fn test_file_tree_wide_directory() {
        let paths: Vec<String> = (0..5000).map(|i| format!("src/f{:05}.rs", i)).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let tree = build_file_tree(&structure(&refs));

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 5000);
        assert_eq!(tree[0].children[0].path, "src/f00000.rs");
        assert_eq!(tree[0].children[4999].path, "src/f04999.rs");
        assert!(tree[0].children.iter().all(|n| n.kind == NodeKind::File));
    }

    #[test]
    fn test_file_tree_json_shape() {
        let cb = structure(&["a/b.txt"]);
        let value = serde_json::to_value(build_file_tree(&cb)).unwrap();
        assert_eq!(
            value,
            json!([{
                "id": "a",
                "name": "a",
                "path": "a",
                "type": "folder",
                "children": [{"id": "a/b.txt", "name": "b.txt", "path": "a/b.txt", "type": "file"}]
            }])
        );
    }

    #[test]
    fn test_render_tree_orders_dirs_first() {
        let cb = structure(&["z.txt", "src/main.rs", "a.txt", "src/util/mod.rs"]);
        let expected = "\
demo/
├── src/
│   ├── util/
│   │   └── mod.rs
│   └── main.rs
├── a.txt
└── z.txt
";
        assert_eq!(render_tree(&cb), expected);
    }

    #[test]
    fn test_render_empty_tree() {
        assert_eq!(render_tree(&structure(&[])), "demo/\n");
    }
}
