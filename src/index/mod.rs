mod analyzer;
mod graph;

pub use analyzer::FileAnalyzer;
pub use graph::ImportGraph;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{CtxGraphError, Result};
use crate::types::{normalize_path, FileIndex};

/// Schema version of the serialized index document.
pub const INDEX_VERSION: u32 = 1;

/// In-memory semantic index: path → `FileIndex`, plus a derived global
/// symbol table.
///
/// Entries are stored as `Arc<FileIndex>` and replaced wholesale on
/// re-analysis, so readers holding an `Arc` keep a consistent snapshot while
/// the index moves on.
#[derive(Debug, Default)]
pub struct SemanticIndex {
    files: HashMap<String, Arc<FileIndex>>,
    /// symbol name → paths declaring it, insertion-ordered per name.
    symbols: HashMap<String, Vec<String>>,
    /// Files whose last analysis attempt failed; their previous entry (if
    /// any) is retained.
    unanalyzable: HashSet<String>,
}

/// On-disk shape of a serialized index.
#[derive(Debug, Serialize, Deserialize)]
struct SerializedIndex {
    version: u32,
    files: Vec<FileIndex>,
}

impl SemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a file record. O(1) amortized on the path map;
    /// symbol-table maintenance is linear in the file's own symbol count.
    ///
    /// The record's own `path` is normalized along with the map key, so
    /// every downstream consumer of a stored record (symbol unlinking, the
    /// import graph) sees exactly one spelling per file.
    pub fn add_file(&mut self, mut file: FileIndex) {
        file.path = normalize_path(&file.path);
        let path = file.path.clone();
        if let Some(previous) = self.files.get(&path) {
            self.unlink_symbols(&previous.clone());
        }
        self.unanalyzable.remove(&path);
        for symbol in &file.symbols {
            let entry = self.symbols.entry(symbol.name.clone()).or_default();
            if !entry.iter().any(|p| p == &path) {
                entry.push(path.clone());
            }
        }
        self.files.insert(path, Arc::new(file));
    }

    /// Removes a file record, returning true if it existed.
    pub fn remove_file(&mut self, path: &str) -> bool {
        let path = normalize_path(path);
        self.unanalyzable.remove(&path);
        match self.files.remove(&path) {
            Some(previous) => {
                self.unlink_symbols(&previous);
                true
            }
            None => false,
        }
    }

    pub fn get_file(&self, path: &str) -> Option<Arc<FileIndex>> {
        self.files.get(&normalize_path(path)).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    /// Snapshot of all entries. Order is unspecified.
    pub fn get_all_files(&self) -> Vec<Arc<FileIndex>> {
        self.files.values().cloned().collect()
    }

    /// All indexed paths. Order is unspecified.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Marks a file as unanalyzable without disturbing its previous entry.
    ///
    /// Used when a read or analysis attempt fails: one bad file must never
    /// take down the index or erase known-good metadata.
    pub fn mark_unanalyzable(&mut self, path: &str) {
        self.unanalyzable.insert(normalize_path(path));
    }

    pub fn is_unanalyzable(&self, path: &str) -> bool {
        self.unanalyzable.contains(&normalize_path(path))
    }

    /// Paths declaring a symbol with this exact name.
    pub fn files_for_symbol(&self, name: &str) -> &[String] {
        self.symbols.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Serializes the index to a versioned JSON document.
    ///
    /// Files are sorted by path so identical content always produces
    /// identical output.
    pub fn serialize(&self) -> Result<String> {
        let mut files: Vec<FileIndex> = self.files.values().map(|f| (**f).clone()).collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let doc = SerializedIndex {
            version: INDEX_VERSION,
            files,
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Deserializes an index from its JSON document.
    ///
    /// Round-trip stable: the resulting index is content-equal to the one
    /// that produced the document, order irrelevant.
    pub fn deserialize(data: &str) -> Result<SemanticIndex> {
        let doc: SerializedIndex = serde_json::from_str(data)?;
        if doc.version != INDEX_VERSION {
            return Err(CtxGraphError::Storage {
                message: format!(
                    "unsupported index version {} (expected {})",
                    doc.version, INDEX_VERSION
                ),
                operation: "deserialize".to_string(),
            });
        }
        let mut index = SemanticIndex::new();
        for file in doc.files {
            index.add_file(file);
        }
        Ok(index)
    }

    /// Builds the derived import graph over the current entries.
    pub fn build_import_graph(&self) -> ImportGraph {
        ImportGraph::build(self)
    }

    fn unlink_symbols(&mut self, file: &FileIndex) {
        for symbol in &file.symbols {
            if let Some(paths) = self.symbols.get_mut(&symbol.name) {
                paths.retain(|p| p != &file.path);
                if paths.is_empty() {
                    self.symbols.remove(&symbol.name);
                }
            }
        }
    }
}
