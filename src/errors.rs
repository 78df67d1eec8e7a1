use thiserror::Error;

/// Errors that can occur during context-engine operations.
///
/// Per-file parse trouble is never surfaced through this type: extraction
/// recovers locally with a partial symbol set. Only configuration problems
/// and persistence I/O produce hard errors, and even those leave the live
/// in-memory index valid.
#[derive(Error, Debug)]
pub enum CtxGraphError {
    #[error("parse error: {message} (path: {path})")]
    Parse { message: String, path: String },

    #[error("storage error: {message} (operation: {operation})")]
    Storage { message: String, operation: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `CtxGraphError`.
pub type Result<T> = std::result::Result<T, CtxGraphError>;
