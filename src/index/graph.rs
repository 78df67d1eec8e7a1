use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::normalize_path;

use super::SemanticIndex;

/// Candidate suffixes tried, in order, when an import specifier omits its
/// extension or names a directory.
const CANDIDATE_SUFFIXES: &[&str] = &[
    "",
    ".ts",
    ".tsx",
    ".js",
    ".jsx",
    ".py",
    ".rs",
    ".go",
    "/index.ts",
    "/index.tsx",
    "/index.js",
    "/mod.rs",
    "/__init__.py",
];

/// Adjacency for one file in the import graph.
#[derive(Debug, Clone, Default)]
pub struct GraphNode {
    pub imports: Vec<String>,
    pub imported_by: Vec<String>,
}

/// Derived bidirectional import graph.
///
/// This is a view over `FileIndex.imports`, rebuilt on demand, never stored:
/// there is no second source of truth to drift from, and cycles are harmless
/// because traversal keeps a visited set.
#[derive(Debug, Default)]
pub struct ImportGraph {
    nodes: HashMap<String, GraphNode>,
}

impl ImportGraph {
    /// Builds the graph by resolving every file's import specifiers against
    /// the indexed paths. Unresolved specifiers are dropped edges, not
    /// errors.
    pub fn build(index: &SemanticIndex) -> ImportGraph {
        let paths: HashSet<String> = index.paths().map(|p| p.to_string()).collect();
        let mut nodes: HashMap<String, GraphNode> = HashMap::new();
        for path in &paths {
            nodes.insert(path.clone(), GraphNode::default());
        }

        for file in index.get_all_files() {
            for specifier in &file.imports {
                let Some(target) = resolve_specifier(&file.path, specifier, &paths) else {
                    continue;
                };
                if target == file.path {
                    continue;
                }
                let from = nodes.entry(file.path.clone()).or_default();
                if !from.imports.iter().any(|p| p == &target) {
                    from.imports.push(target.clone());
                }
                let to = nodes.entry(target).or_default();
                if !to.imported_by.iter().any(|p| p == &file.path) {
                    to.imported_by.push(file.path.clone());
                }
            }
        }

        ImportGraph { nodes }
    }

    pub fn node(&self, path: &str) -> Option<&GraphNode> {
        self.nodes.get(path)
    }

    /// Files this path imports (resolved).
    pub fn imports(&self, path: &str) -> &[String] {
        self.lookup(path)
            .and_then(|key| self.nodes.get(key))
            .map(|n| n.imports.as_slice())
            .unwrap_or(&[])
    }

    /// Files importing this path.
    pub fn imported_by(&self, path: &str) -> &[String] {
        self.lookup(path)
            .and_then(|key| self.nodes.get(key))
            .map(|n| n.imported_by.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolves a possibly-sloppy path to a graph key.
    ///
    /// Tries the exact key, the normalized form, and finally a
    /// basename-suffix match (ignoring extensions) so callers holding an
    /// aliased or extensionless spelling still land on the right node.
    pub fn lookup(&self, path: &str) -> Option<&str> {
        if let Some((key, _)) = self.nodes.get_key_value(path) {
            return Some(key.as_str());
        }
        let normalized = normalize_path(path);
        if let Some((key, _)) = self.nodes.get_key_value(&normalized) {
            return Some(key.as_str());
        }

        let want = stem(&normalized);
        if want.is_empty() {
            return None;
        }
        let mut matches: Vec<&str> = self
            .nodes
            .keys()
            .filter(|key| stem(key) == want)
            .map(|k| k.as_str())
            .collect();
        matches.sort_unstable();
        matches.first().copied()
    }

    /// Unweighted BFS distance between two files, treating the graph as
    /// undirected (imports and imported_by both count as edges).
    ///
    /// Returns `None` when either endpoint is unknown or no path exists
    /// within `max_depth` hops.
    pub fn distance(&self, from: &str, to: &str, max_depth: usize) -> Option<usize> {
        let from = self.lookup(from)?.to_string();
        let to = self.lookup(to)?.to_string();
        if from == to {
            return Some(0);
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        visited.insert(from.as_str());
        queue.push_back((self.nodes.get_key_value(from.as_str())?.0.as_str(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            for neighbor in node.imports.iter().chain(node.imported_by.iter()) {
                if neighbor == &to {
                    return Some(depth + 1);
                }
                if visited.insert(neighbor.as_str()) {
                    queue.push_back((neighbor.as_str(), depth + 1));
                }
            }
        }
        None
    }
}

/// Resolves one raw import specifier against the indexed path set.
///
/// Relative specifiers are joined to the importing file's directory;
/// everything else is tried as a project-root-relative path (with dotted
/// module paths converted to slashes). Each base is expanded through the
/// candidate-suffix list. Returns `None` when nothing matches.
pub fn resolve_specifier(from: &str, specifier: &str, paths: &HashSet<String>) -> Option<String> {
    let spec = specifier.trim();
    if spec.is_empty() || spec.contains("::") {
        // Rust `use` paths resolve through the module tree, not the file
        // system; `mod` declarations already emit `./name` specifiers.
        return None;
    }

    let from = normalize_path(from);
    let dir = parent_dir(&from);

    let bases: Vec<String> = if spec.starts_with("./") || spec.starts_with("../") {
        join_relative(dir, spec).into_iter().collect()
    } else {
        let mut bases = vec![normalize_path(spec)];
        if spec.contains('.') && !spec.contains('/') {
            bases.push(spec.replace('.', "/"));
        }
        bases
    };

    for base in bases {
        for suffix in CANDIDATE_SUFFIXES {
            let candidate = format!("{}{}", base, suffix);
            if paths.contains(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Joins a relative specifier onto a directory, resolving `.` and `..`
/// segments. Returns `None` when `..` escapes the project root.
fn join_relative(dir: &str, spec: &str) -> Option<String> {
    let mut parts: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };
    for segment in spec.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Basename without its extension, used for fuzzy lookup.
fn stem(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rfind('.') {
        Some(pos) if pos > 0 => &base[..pos],
        _ => base,
    }
}
