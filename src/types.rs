use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Kinds of symbols extracted from source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Trait,
    Interface,
    TypeAlias,
    Variable,
    Constant,
    Module,
}

#[allow(clippy::should_implement_trait)]
impl SymbolKind {
    /// Returns the string representation of this symbol kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Trait => "trait",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Module => "module",
        }
    }

    /// Parses a string into a `SymbolKind`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<SymbolKind> {
        match s {
            "function" => Some(SymbolKind::Function),
            "method" => Some(SymbolKind::Method),
            "class" => Some(SymbolKind::Class),
            "struct" => Some(SymbolKind::Struct),
            "enum" => Some(SymbolKind::Enum),
            "trait" => Some(SymbolKind::Trait),
            "interface" => Some(SymbolKind::Interface),
            "type_alias" => Some(SymbolKind::TypeAlias),
            "variable" => Some(SymbolKind::Variable),
            "constant" => Some(SymbolKind::Constant),
            "module" => Some(SymbolKind::Module),
            _ => None,
        }
    }

    /// Whether this kind declares a type rather than a value.
    pub fn is_type_like(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Struct
                | SymbolKind::Enum
                | SymbolKind::Trait
                | SymbolKind::Interface
                | SymbolKind::TypeAlias
        )
    }
}

/// A symbol declared in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based line of the declaration.
    pub line: u32,
    pub exported: bool,
}

/// Per-file metadata record produced by analysis.
///
/// Immutable value object: re-analysis replaces the whole record, it is never
/// patched in place, so concurrent readers always see a consistent snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileIndex {
    /// Normalized relative path, unique key within the index.
    pub path: String,
    /// SHA-256 hex digest of the file content.
    pub content_hash: String,
    pub size_bytes: u64,
    /// Modification time, seconds since UNIX epoch.
    pub last_modified: i64,
    pub symbols: Vec<Symbol>,
    /// Raw import specifiers as written in the source.
    pub imports: Vec<String>,
    /// Names exported from this file.
    pub exports: Vec<String>,
}

/// Reason tags attached to a relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreReason {
    DirectImport,
    ImportedBy,
    SymbolMatch,
    ImportChain,
    RecentlyUsed,
    UserPattern,
    SizePenalty,
    ExportPenalty,
}

impl ScoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreReason::DirectImport => "direct_import",
            ScoreReason::ImportedBy => "imported_by",
            ScoreReason::SymbolMatch => "symbol_match",
            ScoreReason::ImportChain => "import_chain",
            ScoreReason::RecentlyUsed => "recently_used",
            ScoreReason::UserPattern => "user_pattern",
            ScoreReason::SizePenalty => "size_penalty",
            ScoreReason::ExportPenalty => "export_penalty",
        }
    }
}

/// Relevance of a candidate file for the current query context.
///
/// Transient, per-query; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceScore {
    pub path: String,
    /// Bounded to [0, 100].
    pub score: f64,
    pub reasons: Vec<ScoreReason>,
    /// Bounded to [0, 1]; used for "why" badges, not ranking.
    pub confidence: f64,
}

/// Session counters carried across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    /// Seconds since UNIX epoch.
    pub start_time: i64,
    pub last_activity: i64,
    pub total_queries: u64,
}

impl SessionMetadata {
    pub fn new(now: i64) -> Self {
        Self {
            start_time: now,
            last_activity: now,
            total_queries: 0,
        }
    }
}

/// Persisted unit: everything needed to resume a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextState {
    /// Schema version of the persisted blob.
    pub version: u32,
    /// Write time, seconds since UNIX epoch.
    pub timestamp: i64,
    /// Serialized `SemanticIndex` (its own versioned JSON document).
    pub index: String,
    pub current_files: Vec<String>,
    pub user_preferences: BTreeMap<String, serde_json::Value>,
    pub session_metadata: SessionMetadata,
}

/// Current schema version for `ContextState`.
pub const CONTEXT_STATE_VERSION: u32 = 1;

/// Compute the SHA-256 content hash of file content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns the current UNIX timestamp in seconds.
pub fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Normalizes a path for use as an index key.
///
/// Backslashes become forward slashes and a leading `./` is stripped, so the
/// same file reached through different spellings lands on one key.
pub fn normalize_path(path: &str) -> String {
    let mut p = path.replace('\\', "/");
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.to_string();
    }
    p
}
