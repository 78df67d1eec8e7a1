use std::collections::HashMap;

use crate::types::normalize_path;

/// Default cap on accessed files remembered per context file.
pub const DEFAULT_PER_CONTEXT_CAP: usize = 50;

/// Default cap on the number of context keys tracked globally.
pub const DEFAULT_MAX_CONTEXTS: usize = 100;

/// Per-context access history: context file → most-recent-first list of
/// files the user touched while that context was active.
///
/// Both dimensions are bounded so memory stays flat regardless of session
/// length: each list is capped, and once the number of context keys exceeds
/// the global cap the least-recently-touched keys are pruned.
#[derive(Debug)]
pub struct UserHistory {
    entries: HashMap<String, Vec<String>>,
    /// Context keys, most recently touched first.
    recency: Vec<String>,
    per_context_cap: usize,
    max_contexts: usize,
}

impl UserHistory {
    pub fn new() -> Self {
        Self::with_caps(DEFAULT_PER_CONTEXT_CAP, DEFAULT_MAX_CONTEXTS)
    }

    pub fn with_caps(per_context_cap: usize, max_contexts: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: Vec::new(),
            per_context_cap: per_context_cap.max(1),
            max_contexts: max_contexts.max(1),
        }
    }

    /// Records that `accessed` was used while `context` was the active file.
    ///
    /// The accessed file moves to the front of the context's list; the list
    /// is truncated at its cap. Exceeding the global context cap prunes the
    /// oldest context keys.
    pub fn record(&mut self, accessed: &str, context: &str) {
        let context = normalize_path(context);
        let accessed = normalize_path(accessed);

        let list = self.entries.entry(context.clone()).or_default();
        list.retain(|p| p != &accessed);
        list.insert(0, accessed);
        list.truncate(self.per_context_cap);

        self.recency.retain(|c| c != &context);
        self.recency.insert(0, context);
        while self.recency.len() > self.max_contexts {
            if let Some(evicted) = self.recency.pop() {
                self.entries.remove(&evicted);
            }
        }
    }

    /// Recency factor of `path` within the history of `context`: 1.0 for the
    /// most recent access, falling linearly to just above 0 for the oldest,
    /// 0.0 when absent.
    pub fn recency_factor(&self, context: &str, path: &str) -> f64 {
        let context = normalize_path(context);
        let path = normalize_path(path);
        let Some(list) = self.entries.get(&context) else {
            return 0.0;
        };
        match list.iter().position(|p| p == &path) {
            Some(rank) => 1.0 - rank as f64 / list.len() as f64,
            None => 0.0,
        }
    }

    pub fn context_count(&self) -> usize {
        self.entries.len()
    }

    /// Accessed files for a context, most recent first.
    pub fn accessed(&self, context: &str) -> &[String] {
        self.entries
            .get(&normalize_path(context))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for UserHistory {
    fn default() -> Self {
        Self::new()
    }
}
