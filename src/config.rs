use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{CtxGraphError, Result};

/// Name of the configuration file stored inside the `.ctxgraph` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory used to store ctxgraph metadata.
pub const CTXGRAPH_DIR: &str = ".ctxgraph";

/// Configuration for a ctxgraph project.
///
/// Controls which files are indexed, scoring thresholds, and budgets. Only
/// the keys below are recognized; unknown keys in the file are ignored on
/// load so configurations from newer versions still parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Root directory of the project being indexed.
    pub root_dir: String,
    /// Maximum directory depth during scanning.
    pub index_depth: usize,
    /// Glob patterns for files to include during indexing.
    pub include_patterns: Vec<String>,
    /// Glob patterns for files to exclude during indexing.
    pub exclude_patterns: Vec<String>,
    /// Maximum number of files returned from a ranked query.
    pub max_files: usize,
    /// Minimum relevance score for a file to appear in query results.
    pub min_score: f64,
    /// Per-file token budget for content sampling.
    pub max_tokens_per_file: usize,
    /// Maximum file size in bytes; larger files are skipped during scanning.
    pub max_file_size: u64,
    /// Size above which the scorer applies its log-scaled penalty.
    pub size_penalty_threshold: u64,
    /// Export count above which the scorer applies its export penalty.
    pub export_penalty_threshold: usize,
    /// Number of fully-loaded index entries kept hot in memory.
    pub cache_capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            version: 1,
            root_dir: String::new(),
            index_depth: 32,
            include_patterns: vec![
                "**/*.rs".to_string(),
                "**/*.ts".to_string(),
                "**/*.tsx".to_string(),
                "**/*.js".to_string(),
                "**/*.jsx".to_string(),
                "**/*.py".to_string(),
                "**/*.go".to_string(),
            ],
            exclude_patterns: vec![
                "target/**".to_string(),
                ".git/**".to_string(),
                ".ctxgraph/**".to_string(),
                "node_modules/**".to_string(),
                "vendor/**".to_string(),
                "**/*.min.*".to_string(),
                "dist/**".to_string(),
                "build/**".to_string(),
                "out/**".to_string(),
                "__pycache__/**".to_string(),
            ],
            max_files: 20,
            min_score: 5.0,
            max_tokens_per_file: 2000,
            max_file_size: 1_048_576,
            size_penalty_threshold: 10_000,
            export_penalty_threshold: 20,
            cache_capacity: 8192,
        }
    }
}

/// Returns the path to the `.ctxgraph` directory within the given project root.
pub fn get_ctxgraph_dir(project_root: &Path) -> PathBuf {
    project_root.join(CTXGRAPH_DIR)
}

/// Returns the path to the configuration file within the `.ctxgraph` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_ctxgraph_dir(project_root).join(CONFIG_FILENAME)
}

/// Loads the configuration from disk.
///
/// A missing file yields the defaults with `root_dir` pointed at the given
/// project root; an unreadable or unparseable file is a hard `Config` error.
pub fn load_config(project_root: &Path) -> Result<ContextConfig> {
    let config_path = get_config_path(project_root);
    if !config_path.exists() {
        return Ok(ContextConfig {
            root_dir: project_root.to_string_lossy().to_string(),
            ..ContextConfig::default()
        });
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| CtxGraphError::Config {
        message: format!("failed to read config file '{}': {}", config_path.display(), e),
    })?;
    serde_json::from_str(&contents).map_err(|e| CtxGraphError::Config {
        message: format!("failed to parse config file '{}': {}", config_path.display(), e),
    })
}

/// Saves the configuration to disk atomically.
pub fn save_config(project_root: &Path, config: &ContextConfig) -> Result<()> {
    let config_path = get_config_path(project_root);
    let json = serde_json::to_string_pretty(config)?;
    write_atomic(&config_path, &json).map_err(|e| CtxGraphError::Config {
        message: format!("failed to write config file '{}': {}", config_path.display(), e),
    })
}

/// Writes `contents` to `path` via tmp + rename, creating parent directories
/// as needed. A partial write can never clobber the previous file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

/// Determines whether a file should be indexed.
///
/// The file must match at least one include pattern and no exclude pattern;
/// exclude patterns take precedence. Invalid patterns are skipped.
pub fn should_include_file(file_path: &str, config: &ContextConfig) -> bool {
    let match_opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    let any_match = |patterns: &[String]| {
        patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|p| p.matches_with(file_path, match_opts))
    };

    !any_match(&config.exclude_patterns) && any_match(&config.include_patterns)
}
