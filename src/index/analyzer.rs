use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::errors::{CtxGraphError, Result};
use crate::extraction::ExtractorRegistry;
use crate::types::{content_hash, normalize_path, FileIndex};

/// Turns file content into a `FileIndex` record.
///
/// Analysis is deterministic: identical `(path, content)` always yields a
/// byte-identical record except for `last_modified`, which the caller
/// supplies. That property is what makes hash-gated incremental indexing and
/// golden-output testing reliable.
pub struct FileAnalyzer {
    registry: ExtractorRegistry,
}

impl FileAnalyzer {
    pub fn new() -> Self {
        Self {
            registry: ExtractorRegistry::new(),
        }
    }

    /// Uses a caller-provided registry, e.g. with extra languages registered.
    pub fn with_registry(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    /// Analyzes file content into a `FileIndex`.
    ///
    /// Never fails: extraction recovers from malformed source with a partial
    /// or empty symbol set.
    pub fn analyze(&self, path: &str, content: &str, last_modified: i64) -> FileIndex {
        let path = normalize_path(path);
        let extraction = self.registry.extract_for_path(&path, content);
        FileIndex {
            content_hash: content_hash(content),
            size_bytes: content.len() as u64,
            last_modified,
            symbols: extraction.symbols,
            imports: extraction.imports,
            exports: extraction.exports,
            path,
        }
    }

    /// Reads `rel` under `root` from disk and analyzes it.
    ///
    /// Fails only on I/O problems (unreadable file, non-UTF-8 content); the
    /// caller decides whether to isolate the file or surface the error.
    pub fn analyze_path(&self, root: &Path, rel: &str) -> Result<FileIndex> {
        let full = root.join(rel);
        let content = fs::read_to_string(&full).map_err(|e| CtxGraphError::Parse {
            message: format!("failed to read file: {}", e),
            path: rel.to_string(),
        })?;
        let mtime = fs::metadata(&full)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Ok(self.analyze(rel, &content, mtime))
    }
}

impl Default for FileAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
