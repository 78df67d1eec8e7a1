use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Instant;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{should_include_file, ContextConfig};
use crate::index::{FileAnalyzer, SemanticIndex};
use crate::types::normalize_path;

use super::refresh_file;

/// Progress event emitted after each processed file.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub scanned: usize,
    pub analyzed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Path of the file just processed.
    pub current: String,
}

/// Final result of a scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    pub scanned: usize,
    /// Files that were (re-)analyzed.
    pub analyzed: usize,
    /// Files skipped because their content hash was unchanged.
    pub skipped: usize,
    /// Files that could not be read or analyzed (isolated, not fatal).
    pub failed: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}

/// Walks `root` and brings the shared index up to date.
///
/// Per-file isolation: an unreadable file is marked unanalyzable and counted,
/// never fatal. Cancellation is checked between files only — a file is either
/// fully indexed or untouched — and everything indexed before cancellation is
/// retained.
pub fn scan(
    root: &Path,
    config: &ContextConfig,
    analyzer: &FileAnalyzer,
    index: &Arc<RwLock<SemanticIndex>>,
    cancel: &AtomicBool,
    progress: Option<&Sender<ScanProgress>>,
) -> ScanSummary {
    let start = Instant::now();
    let mut summary = ScanSummary::default();

    let walker = WalkDir::new(root)
        .max_depth(config.index_depth)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok());

    for entry in walker {
        if cancel.load(Ordering::Relaxed) {
            summary.cancelled = true;
            break;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => normalize_path(&rel.to_string_lossy()),
            Err(_) => continue,
        };
        if !should_include_file(&rel, config) {
            continue;
        }
        if entry
            .metadata()
            .map(|m| m.len() > config.max_file_size)
            .unwrap_or(true)
        {
            continue;
        }

        summary.scanned += 1;
        match std::fs::read_to_string(entry.path()) {
            Ok(content) => {
                let mtime = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                if refresh_file(index, analyzer, &rel, &content, mtime) {
                    summary.analyzed += 1;
                } else {
                    summary.skipped += 1;
                }
            }
            Err(e) => {
                debug!(path = %rel, error = %e, "unreadable file isolated");
                index
                    .write()
                    .expect("index lock poisoned")
                    .mark_unanalyzable(&rel);
                summary.failed += 1;
            }
        }

        if let Some(tx) = progress {
            // A dropped receiver just means nobody is watching.
            let _ = tx.send(ScanProgress {
                scanned: summary.scanned,
                analyzed: summary.analyzed,
                skipped: summary.skipped,
                failed: summary.failed,
                current: rel,
            });
        }
    }

    summary.duration_ms = start.elapsed().as_millis() as u64;
    if summary.cancelled {
        warn!(
            scanned = summary.scanned,
            analyzed = summary.analyzed,
            "scan cancelled; partial progress retained"
        );
    } else {
        info!(
            scanned = summary.scanned,
            analyzed = summary.analyzed,
            skipped = summary.skipped,
            failed = summary.failed,
            duration_ms = summary.duration_ms,
            "scan complete"
        );
    }
    summary
}

/// Handle to a background scan: progress events, cooperative cancellation,
/// and the final summary on join.
pub struct ScanHandle {
    cancel: Arc<AtomicBool>,
    progress: Receiver<ScanProgress>,
    handle: JoinHandle<ScanSummary>,
}

impl ScanHandle {
    /// Requests cancellation; the worker stops at the next file boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Receiver for incremental progress events.
    pub fn progress(&self) -> &Receiver<ScanProgress> {
        &self.progress
    }

    /// Waits for the scan to finish and returns its summary.
    pub fn join(self) -> ScanSummary {
        self.handle.join().unwrap_or_else(|_| {
            warn!("scan worker panicked");
            ScanSummary {
                cancelled: true,
                ..ScanSummary::default()
            }
        })
    }
}

/// Runs `scan` on a worker thread so interactive queries and sampling are
/// never blocked by a full reindex.
pub fn spawn_scan(
    root: PathBuf,
    config: ContextConfig,
    index: Arc<RwLock<SemanticIndex>>,
) -> ScanHandle {
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();

    let worker_cancel = cancel.clone();
    let handle = std::thread::spawn(move || {
        let analyzer = FileAnalyzer::new();
        scan(&root, &config, &analyzer, &index, &worker_cancel, Some(&tx))
    });

    ScanHandle {
        cancel,
        progress: rx,
        handle,
    }
}
