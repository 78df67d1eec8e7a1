//! Incremental indexing and bounded in-memory caching.
//!
//! Hashing is cheap; analysis is the expensive step. This layer re-analyzes a
//! file only when its content hash differs from the stored record, keeps a
//! bounded LRU set of fully-loaded `FileIndex` entries (spilling evicted ones
//! to disk for lazy reload), and runs long scans as cancellable background
//! work so queries never wait on a full reindex.

mod lru;
mod scanner;

pub use scanner::{scan, spawn_scan, ScanHandle, ScanProgress, ScanSummary};

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::index::{FileAnalyzer, SemanticIndex};
use crate::types::{content_hash, normalize_path, FileIndex};

/// Cheap always-in-memory metadata for every known file.
///
/// Enough to drive change detection and rebuild the import graph without
/// holding the (heavy) symbol lists for cold files.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMeta {
    pub content_hash: String,
    pub size_bytes: u64,
    pub last_modified: i64,
    pub imports: Vec<String>,
    pub export_count: usize,
}

impl FileMeta {
    fn of(file: &FileIndex) -> Self {
        Self {
            content_hash: file.content_hash.clone(),
            size_bytes: file.size_bytes,
            last_modified: file.last_modified,
            imports: file.imports.clone(),
            export_count: file.exports.len(),
        }
    }
}

/// LRU-bounded cache of fully-loaded index entries with disk spill.
///
/// Hot entries live in memory; evicted entries are reloaded lazily from the
/// spill directory on access. Without a spill directory, a cold miss simply
/// returns `None` and the caller re-analyzes.
pub struct IndexCache {
    manifest: HashMap<String, FileMeta>,
    hot: lru::LruCache<Arc<FileIndex>>,
    spill_dir: Option<PathBuf>,
}

impl IndexCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            manifest: HashMap::new(),
            hot: lru::LruCache::new(capacity),
            spill_dir: None,
        }
    }

    /// Enables disk spill for evicted entries under `dir`.
    pub fn with_spill_dir(capacity: usize, dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            manifest: HashMap::new(),
            hot: lru::LruCache::new(capacity),
            spill_dir: Some(dir),
        })
    }

    /// Inserts (or replaces) a fully-loaded entry.
    ///
    /// The entry is written through to the spill directory so a later
    /// eviction loses nothing; spill write failures are logged, not fatal.
    pub fn insert(&mut self, file: FileIndex) {
        let path = normalize_path(&file.path);
        self.manifest.insert(path.clone(), FileMeta::of(&file));
        self.write_spill(&path, &file);
        self.hot.insert(path, Arc::new(file));
    }

    /// Fetches an entry, lazily reloading a cold one from spill.
    pub fn get(&mut self, path: &str) -> Option<Arc<FileIndex>> {
        let path = normalize_path(path);
        if let Some(entry) = self.hot.get(&path) {
            return Some(entry.clone());
        }
        let meta = self.manifest.get(&path)?.clone();
        let loaded = self.read_spill(&path)?;
        // A stale spill (hash mismatch) is as good as a miss.
        if loaded.content_hash != meta.content_hash {
            debug!(path, "stale spill entry ignored");
            return None;
        }
        let entry = Arc::new(loaded);
        self.hot.insert(path, entry.clone());
        Some(entry)
    }

    /// Whether `content` differs from what was last analyzed for `path`.
    pub fn needs_reanalysis(&self, path: &str, content: &str) -> bool {
        match self.manifest.get(&normalize_path(path)) {
            Some(meta) => meta.content_hash != content_hash(content),
            None => true,
        }
    }

    pub fn meta(&self, path: &str) -> Option<&FileMeta> {
        self.manifest.get(&normalize_path(path))
    }

    pub fn remove(&mut self, path: &str) {
        let path = normalize_path(path);
        self.manifest.remove(&path);
        self.hot.remove(&path);
        if let Some(spill) = self.spill_file(&path) {
            let _ = fs::remove_file(spill);
        }
    }

    /// Number of known files (hot + cold).
    pub fn len(&self) -> usize {
        self.manifest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    /// Number of fully-loaded entries currently in memory.
    pub fn hot_len(&self) -> usize {
        self.hot.len()
    }

    fn spill_file(&self, path: &str) -> Option<PathBuf> {
        let dir = self.spill_dir.as_ref()?;
        let mut hasher = Sha256::new();
        hasher.update(path.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Some(dir.join(format!("{}.json", &digest[..24])))
    }

    fn write_spill(&self, path: &str, file: &FileIndex) {
        let Some(spill) = self.spill_file(path) else {
            return;
        };
        match serde_json::to_string(file) {
            Ok(json) => {
                if let Err(e) = fs::write(&spill, json) {
                    warn!(path, error = %e, "failed to spill index entry");
                }
            }
            Err(e) => warn!(path, error = %e, "failed to serialize index entry"),
        }
    }

    fn read_spill(&self, path: &str) -> Option<FileIndex> {
        let spill = self.spill_file(path)?;
        let data = fs::read_to_string(spill).ok()?;
        serde_json::from_str(&data).ok()
    }
}

/// Re-analyzes `path` only when its content changed; returns whether an
/// analysis ran. The shared index is updated under a short write lock so
/// concurrent readers keep their snapshots.
pub fn refresh_file(
    index: &Arc<RwLock<SemanticIndex>>,
    analyzer: &FileAnalyzer,
    path: &str,
    content: &str,
    last_modified: i64,
) -> bool {
    let unchanged = {
        let guard = index.read().expect("index lock poisoned");
        guard
            .get_file(path)
            .map(|existing| existing.content_hash == content_hash(content))
            .unwrap_or(false)
    };
    if unchanged {
        return false;
    }
    let record = analyzer.analyze(path, content, last_modified);
    index
        .write()
        .expect("index lock poisoned")
        .add_file(record);
    true
}
