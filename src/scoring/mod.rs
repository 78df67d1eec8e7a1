//! Multi-factor file relevance scoring.
//!
//! A candidate file is scored against the current query context with five
//! weighted factors (direct reference, symbol match, import-chain distance,
//! recency, user pattern), clamped to [0, 100], then docked by multiplicative
//! size/export penalties. Scoring is deterministic given the index, the
//! context, and the history state.

mod history;

pub use history::UserHistory;

use std::collections::HashSet;

use crate::config::ContextConfig;
use crate::index::{ImportGraph, SemanticIndex};
use crate::types::{normalize_path, RelevanceScore, ScoreReason};

/// Factor weights for the relevance sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub direct_reference: f64,
    pub symbol_match: f64,
    pub chain_distance: f64,
    pub recency: f64,
    pub user_pattern: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            direct_reference: 85.0,
            symbol_match: 65.0,
            chain_distance: 40.0,
            recency: 30.0,
            user_pattern: 35.0,
        }
    }
}

/// What the user is doing right now, as seen by the scorer.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    /// The file currently in focus, if any.
    pub current_file: Option<String>,
    /// Recently touched files, most recent first.
    pub recent_files: Vec<String>,
    /// Free-form task description or query text.
    pub user_query: String,
}

/// Filtering and truncation options for batch scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreOptions {
    pub min_score: Option<f64>,
    pub max_files: Option<usize>,
}

/// Scores candidate files against a query context using the semantic index.
pub struct FileRelevanceScorer {
    weights: ScoreWeights,
    /// Bytes above which the log-scaled size penalty applies.
    size_penalty_threshold: u64,
    /// Export count above which the export penalty applies.
    export_penalty_threshold: usize,
    history: UserHistory,
}

impl FileRelevanceScorer {
    pub fn new() -> Self {
        Self {
            weights: ScoreWeights::default(),
            size_penalty_threshold: 10_000,
            export_penalty_threshold: 20,
            history: UserHistory::new(),
        }
    }

    /// Takes penalty thresholds from the project configuration.
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            size_penalty_threshold: config.size_penalty_threshold,
            export_penalty_threshold: config.export_penalty_threshold,
            ..Self::new()
        }
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Records a file access for the per-context user pattern factor.
    pub fn add_to_history(&mut self, accessed: &str, context_file: &str) {
        self.history.record(accessed, context_file);
    }

    pub fn history(&self) -> &UserHistory {
        &self.history
    }

    /// Scores one candidate file. Bounds hold for any input:
    /// `0 <= score <= 100` and `0 <= confidence <= 1`.
    pub fn score_file(
        &self,
        index: &SemanticIndex,
        graph: &ImportGraph,
        path: &str,
        ctx: &QueryContext,
    ) -> RelevanceScore {
        let path = normalize_path(path);
        let mut reasons: Vec<ScoreReason> = Vec::new();
        let mut confidence: f64 = 0.5;

        let Some(file) = index.get_file(&path) else {
            return RelevanceScore {
                path,
                score: 0.0,
                reasons,
                confidence,
            };
        };

        // 1. Direct reference between the current file and the candidate.
        let direct = self.direct_factor(graph, &path, ctx, &mut reasons);
        if direct > 0.0 {
            confidence = confidence.max(0.9);
        }

        // 2. Query tokens vs declared symbol names, dampened by symbol count
        //    so grab-bag utility files do not win on sheer volume.
        let symbol = symbol_factor(&ctx.user_query, &file.symbols);
        if symbol > 0.0 {
            reasons.push(ScoreReason::SymbolMatch);
            confidence = confidence.max(0.75);
        }

        // 3. Import-chain distance over the undirected graph.
        let chain = self.chain_factor(graph, &path, ctx);
        if chain > 0.0 {
            if direct == 0.0 {
                reasons.push(ScoreReason::ImportChain);
            }
            confidence = confidence.max(0.7);
        }

        // 4. Position within the recent-files list.
        let recency = recency_factor(&path, &ctx.recent_files);
        if recency > 0.0 {
            reasons.push(ScoreReason::RecentlyUsed);
            confidence = confidence.max(0.6);
        }

        // 5. Per-context access history.
        let pattern = match &ctx.current_file {
            Some(current) => self.history.recency_factor(current, &path),
            None => 0.0,
        };
        if pattern > 0.0 {
            reasons.push(ScoreReason::UserPattern);
        }

        let w = &self.weights;
        let mut score = w.direct_reference * direct
            + w.symbol_match * symbol
            + w.chain_distance * chain
            + w.recency * recency
            + w.user_pattern * pattern;
        score = score.clamp(0.0, 100.0);

        // Multiplicative penalties applied last.
        if file.size_bytes > self.size_penalty_threshold {
            let ratio = file.size_bytes as f64 / self.size_penalty_threshold as f64;
            let penalty = (0.5 * ratio.log10()).min(0.5);
            score *= 1.0 - penalty;
            reasons.push(ScoreReason::SizePenalty);
        }
        if file.exports.len() > self.export_penalty_threshold {
            let excess = (file.exports.len() - self.export_penalty_threshold) as f64;
            let penalty = (0.015 * excess).min(0.3);
            score *= 1.0 - penalty;
            reasons.push(ScoreReason::ExportPenalty);
        }

        RelevanceScore {
            path,
            score: score.clamp(0.0, 100.0),
            reasons,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Scores a batch of candidates and returns a descending-sorted list,
    /// filtered by `min_score` and truncated at `max_files`.
    pub fn score_multiple_files(
        &self,
        index: &SemanticIndex,
        graph: &ImportGraph,
        files: &[String],
        ctx: &QueryContext,
        opts: ScoreOptions,
    ) -> Vec<RelevanceScore> {
        let min_score = opts.min_score.unwrap_or(0.0);
        let mut scored: Vec<RelevanceScore> = files
            .iter()
            .map(|path| self.score_file(index, graph, path, ctx))
            .filter(|s| s.score >= min_score)
            .collect();

        // Descending by score, path as a deterministic tiebreak.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        if let Some(max) = opts.max_files {
            scored.truncate(max);
        }
        scored
    }

    // -----------------------------------------------------------------------
    // Factors
    // -----------------------------------------------------------------------

    fn direct_factor(
        &self,
        graph: &ImportGraph,
        path: &str,
        ctx: &QueryContext,
        reasons: &mut Vec<ScoreReason>,
    ) -> f64 {
        let Some(current) = &ctx.current_file else {
            return 0.0;
        };
        let Some(target_key) = graph.lookup(path) else {
            return 0.0;
        };
        let target_key = target_key.to_string();
        if graph.imports(current).iter().any(|p| p == &target_key) {
            reasons.push(ScoreReason::DirectImport);
            return 1.0;
        }
        if graph.imported_by(current).iter().any(|p| p == &target_key) {
            reasons.push(ScoreReason::ImportedBy);
            return 0.8;
        }
        0.0
    }

    /// Any finite distance beyond three hops is worth the floor value; only
    /// unreachable files score zero here.
    fn chain_factor(&self, graph: &ImportGraph, path: &str, ctx: &QueryContext) -> f64 {
        let Some(current) = &ctx.current_file else {
            return 0.0;
        };
        match graph.distance(current, path, usize::MAX) {
            Some(1) => 1.0,
            Some(2) => 0.6,
            Some(3) => 0.3,
            Some(d) if d > 3 => 0.1,
            _ => 0.0,
        }
    }
}

impl Default for FileRelevanceScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Token overlap between the query and declared symbol names, normalized by
/// 1/sqrt(symbol count). An exact name match counts double a substring match.
fn symbol_factor(query: &str, symbols: &[crate::types::Symbol]) -> f64 {
    if symbols.is_empty() {
        return 0.0;
    }
    let tokens = query_tokens(query);
    if tokens.is_empty() {
        return 0.0;
    }

    let mut raw = 0.0;
    for symbol in symbols {
        let name = symbol.name.to_lowercase();
        let mut best: f64 = 0.0;
        for token in &tokens {
            if &name == token {
                best = best.max(2.0);
            } else if name.contains(token.as_str()) || token.contains(name.as_str()) {
                best = best.max(1.0);
            }
        }
        raw += best;
    }

    (raw / (symbols.len() as f64).sqrt()).min(1.0)
}

/// Proportional recency within the recent-files list: the most recent entry
/// scores 1.0, the oldest just above 0.
fn recency_factor(path: &str, recent_files: &[String]) -> f64 {
    if recent_files.is_empty() {
        return 0.0;
    }
    let rank = recent_files
        .iter()
        .position(|p| normalize_path(p) == path);
    match rank {
        Some(rank) => 1.0 - rank as f64 / recent_files.len() as f64,
        None => 0.0,
    }
}

/// Lowercased identifier-ish tokens of length >= 3 from the query.
fn query_tokens(query: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut tokens = Vec::new();
    for raw in query.split(|c: char| !c.is_alphanumeric() && c != '_') {
        if raw.len() < 3 {
            continue;
        }
        let token = raw.to_lowercase();
        if seen.insert(token.clone()) {
            tokens.push(token);
        }
    }
    tokens
}
