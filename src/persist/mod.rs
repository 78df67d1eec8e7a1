//! Durable session state and resume-time merging.
//!
//! The primary store is one JSON session blob under `.ctxgraph/`; a tagged
//! memory store serves as the fallback when the primary write fails. Reads of
//! corrupted state return `None` ("no prior state"), never an error, so a bad
//! blob can only ever cost a cold start. Persistence I/O is invoked only on
//! explicit checkpoints, never on the query path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::{get_ctxgraph_dir, ContextConfig};
use crate::errors::{CtxGraphError, Result};
use crate::index::SemanticIndex;
use crate::types::{current_timestamp, ContextState, CONTEXT_STATE_VERSION};

/// File name of the primary session blob.
pub const SESSION_FILENAME: &str = "session.json";

/// Directory holding tagged fallback entries.
pub const MEMORY_DIRNAME: &str = "memory";

/// Saves and restores `ContextState` across process restarts.
pub struct ContextPersistenceManager {
    session_path: PathBuf,
    memory_dir: PathBuf,
}

impl ContextPersistenceManager {
    pub fn new(project_root: &Path) -> Self {
        let dir = get_ctxgraph_dir(project_root);
        Self {
            session_path: dir.join(SESSION_FILENAME),
            memory_dir: dir.join(MEMORY_DIRNAME),
        }
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    /// Serializes a context state to its JSON blob form.
    pub fn serialize_context_state(state: &ContextState) -> Result<String> {
        Ok(serde_json::to_string(state)?)
    }

    /// Deserializes a context state, returning `None` for anything that does
    /// not parse or validate. Corruption is a warning, never an error.
    pub fn deserialize_context_state(data: &str) -> Option<ContextState> {
        match serde_json::from_str::<ContextState>(data) {
            Ok(state) if Self::validate_context_state(&state) => Some(state),
            Ok(_) => {
                warn!("persisted context state failed validation; discarding");
                None
            }
            Err(e) => {
                warn!(error = %e, "persisted context state unreadable; discarding");
                None
            }
        }
    }

    /// Writes the session blob atomically (tmp + rename).
    ///
    /// On failure the state is also offered to the memory fallback store
    /// before the error is surfaced; the live in-memory state is untouched
    /// either way.
    pub fn save_to_session(&self, state: &ContextState) -> Result<()> {
        match self.write_blob(&self.session_path, state) {
            Ok(()) => Ok(()),
            Err(primary) => {
                warn!(error = %primary, "session write failed; attempting memory fallback");
                let fallback = self.save_to_memory("session-fallback", state);
                Err(CtxGraphError::Storage {
                    message: match fallback {
                        Ok(()) => format!(
                            "session write failed ({}); state preserved in memory fallback",
                            primary
                        ),
                        Err(e) => format!(
                            "session write failed ({}); memory fallback also failed ({})",
                            primary, e
                        ),
                    },
                    operation: "save_to_session".to_string(),
                })
            }
        }
    }

    /// Loads the session blob. Missing or corrupted state is `None`.
    pub fn load_from_session(&self) -> Option<ContextState> {
        let data = fs::read_to_string(&self.session_path).ok()?;
        Self::deserialize_context_state(&data)
    }

    /// Writes a tagged entry to the secondary store.
    pub fn save_to_memory(&self, tag: &str, state: &ContextState) -> Result<()> {
        fs::create_dir_all(&self.memory_dir).map_err(|e| CtxGraphError::Storage {
            message: format!("failed to create memory store: {}", e),
            operation: "save_to_memory".to_string(),
        })?;
        self.write_blob(&self.memory_path(tag), state)
    }

    /// Loads a tagged entry from the secondary store; `None` when missing or
    /// corrupted.
    pub fn load_from_memory(&self, tag: &str) -> Option<ContextState> {
        let data = fs::read_to_string(self.memory_path(tag)).ok()?;
        Self::deserialize_context_state(&data)
    }

    /// Merges a saved state into the state of the running process.
    ///
    /// Policy: union of `current_files` (saved order first, de-duplicated);
    /// prefer-saved for preference keys both sides know while keeping keys
    /// only the running process has; additive counters; earliest start time,
    /// latest activity.
    pub fn smart_resume(saved: ContextState, current: ContextState) -> ContextState {
        let mut current_files = saved.current_files.clone();
        for file in &current.current_files {
            if !current_files.iter().any(|f| f == file) {
                current_files.push(file.clone());
            }
        }

        let mut user_preferences = current.user_preferences.clone();
        for (key, value) in &saved.user_preferences {
            user_preferences.insert(key.clone(), value.clone());
        }

        let index = if current.index.trim().is_empty() {
            saved.index
        } else {
            current.index
        };

        ContextState {
            version: CONTEXT_STATE_VERSION,
            timestamp: current_timestamp(),
            index,
            current_files,
            user_preferences,
            session_metadata: crate::types::SessionMetadata {
                start_time: saved
                    .session_metadata
                    .start_time
                    .min(current.session_metadata.start_time),
                last_activity: saved
                    .session_metadata
                    .last_activity
                    .max(current.session_metadata.last_activity),
                total_queries: saved.session_metadata.total_queries
                    + current.session_metadata.total_queries,
            },
        }
    }

    /// Writes a portable configuration file (same schema family as the
    /// project config).
    pub fn export_configuration(path: &Path, config: &ContextConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        fs::write(path, json).map_err(|e| CtxGraphError::Storage {
            message: format!("failed to export configuration: {}", e),
            operation: "export_configuration".to_string(),
        })
    }

    /// Reads a configuration file previously produced by
    /// `export_configuration`.
    pub fn import_configuration(path: &Path) -> Result<ContextConfig> {
        let data = fs::read_to_string(path).map_err(|e| CtxGraphError::Storage {
            message: format!("failed to read configuration: {}", e),
            operation: "import_configuration".to_string(),
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Structural validation of a (de)serialized state.
    pub fn validate_context_state(state: &ContextState) -> bool {
        if state.version != CONTEXT_STATE_VERSION {
            return false;
        }
        if state.timestamp < 0
            || state.session_metadata.start_time < 0
            || state.session_metadata.last_activity < state.session_metadata.start_time
        {
            return false;
        }
        // An embedded index must itself deserialize.
        state.index.trim().is_empty() || SemanticIndex::deserialize(&state.index).is_ok()
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn memory_path(&self, tag: &str) -> PathBuf {
        let safe: String = tag
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.memory_dir.join(format!("{}.json", safe))
    }

    fn write_blob(&self, path: &Path, state: &ContextState) -> Result<()> {
        let json = Self::serialize_context_state(state)?;
        crate::config::write_atomic(path, &json)?;
        Ok(())
    }
}

/// Builds a fresh `ContextState` snapshot from the live pieces.
pub fn snapshot_state(
    index: &SemanticIndex,
    current_files: Vec<String>,
    user_preferences: std::collections::BTreeMap<String, serde_json::Value>,
    session_metadata: crate::types::SessionMetadata,
) -> Result<ContextState> {
    Ok(ContextState {
        version: CONTEXT_STATE_VERSION,
        timestamp: current_timestamp(),
        index: index.serialize()?,
        current_files,
        user_preferences,
        session_metadata,
    })
}
