//! Bounded-token excerpt extraction.
//!
//! Given a file's index metadata and its content, the sampler picks the
//! spans most useful for the requested strategy, merges overlapping or
//! adjacent spans, and renders them under a hard token cap. The cap is a
//! guarantee the backend relies on for context-window budgeting: a sample's
//! reported token count never exceeds `max_tokens`.

use crate::types::{FileIndex, Symbol, SymbolKind};

/// How to pick spans from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStrategy {
    /// Full bodies of functions/methods (focused by keywords when given).
    WholeFunction,
    /// Class headers and method signatures; keyword-matched methods in full.
    ClassSkeleton,
    /// Type declarations only.
    TypesOnly,
    /// Comments plus declaration lines.
    CommentPreserving,
    /// Windows around keyword occurrences.
    KeywordWindow,
}

/// Options for a single sampling call.
#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub strategy: SampleStrategy,
    pub max_tokens: usize,
    pub focus_keywords: Vec<String>,
}

impl SampleOptions {
    pub fn new(strategy: SampleStrategy, max_tokens: usize) -> Self {
        Self {
            strategy,
            max_tokens,
            focus_keywords: Vec::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.focus_keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }
}

/// A bounded excerpt. `tokens` is accurate for `text` and never exceeds the
/// requested budget.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSample {
    pub text: String,
    pub tokens: usize,
}

/// One entry in a multi-file sampling request.
pub struct SampleRequest<'a> {
    pub file: &'a FileIndex,
    pub content: &'a str,
    pub options: SampleOptions,
}

/// Longest block a single symbol span may cover, in lines.
const MAX_BLOCK_LINES: usize = 200;

/// Context lines on each side of a keyword hit.
const KEYWORD_WINDOW: usize = 3;

/// Extracts bounded content excerpts using index metadata.
pub struct ContentSampler;

impl ContentSampler {
    pub fn new() -> Self {
        Self
    }

    /// Samples one file under a hard token budget.
    pub fn sample_file(
        &self,
        file: &FileIndex,
        content: &str,
        opts: &SampleOptions,
    ) -> ContentSample {
        let lines: Vec<&str> = content.lines().collect();
        let mut spans = match opts.strategy {
            SampleStrategy::WholeFunction => whole_function_spans(file, &lines, opts),
            SampleStrategy::ClassSkeleton => class_skeleton_spans(file, &lines, opts),
            SampleStrategy::TypesOnly => types_only_spans(file, &lines),
            SampleStrategy::CommentPreserving => comment_preserving_spans(file, &lines),
            SampleStrategy::KeywordWindow => keyword_window_spans(&lines, opts),
        };

        // Nothing matched: fall back to the head of the file so the caller
        // still gets something representative.
        if spans.is_empty() && !lines.is_empty() {
            spans.push((0, (lines.len() - 1).min(MAX_BLOCK_LINES)));
        }

        let merged = merge_spans(spans);
        render_within_budget(&lines, &merged, opts.max_tokens)
    }

    /// Samples several files from one shared token budget.
    ///
    /// The budget is split proportionally to each file's estimated token
    /// count rather than consumed greedily, so early files cannot starve
    /// later ones. The combined token count never exceeds `total_budget`.
    pub fn sample_many(
        &self,
        requests: &[SampleRequest<'_>],
        total_budget: usize,
    ) -> Vec<ContentSample> {
        let estimates: Vec<usize> = requests
            .iter()
            .map(|r| estimate_tokens(r.content).max(1))
            .collect();
        let total_estimate: usize = estimates.iter().sum();
        if total_estimate == 0 {
            return requests.iter().map(|_| ContentSample::default()).collect();
        }

        requests
            .iter()
            .zip(&estimates)
            .map(|(request, estimate)| {
                let share = total_budget * estimate / total_estimate;
                let capped = share.min(request.options.max_tokens);
                if capped == 0 {
                    return ContentSample::default();
                }
                let opts = SampleOptions {
                    max_tokens: capped,
                    ..request.options.clone()
                };
                self.sample_file(request.file, request.content, &opts)
            })
            .collect()
    }
}

impl Default for ContentSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ContentSample {
    fn default() -> Self {
        Self {
            text: String::new(),
            tokens: 0,
        }
    }
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

// ---------------------------------------------------------------------------
// Span selection (0-based inclusive line ranges)
// ---------------------------------------------------------------------------

type Span = (usize, usize);

fn keyword_matches(name: &str, keywords: &[String]) -> bool {
    let lower = name.to_lowercase();
    keywords
        .iter()
        .any(|k| lower.contains(&k.to_lowercase()) || k.to_lowercase().contains(&lower))
}

fn whole_function_spans(file: &FileIndex, lines: &[&str], opts: &SampleOptions) -> Vec<Span> {
    let mut spans = Vec::new();
    for symbol in &file.symbols {
        if !matches!(symbol.kind, SymbolKind::Function | SymbolKind::Method) {
            continue;
        }
        if !opts.focus_keywords.is_empty() && !keyword_matches(&symbol.name, &opts.focus_keywords)
        {
            continue;
        }
        if let Some(span) = symbol_block(symbol, lines) {
            spans.push(span);
        }
    }
    spans
}

fn class_skeleton_spans(file: &FileIndex, lines: &[&str], opts: &SampleOptions) -> Vec<Span> {
    let mut spans = Vec::new();
    for symbol in &file.symbols {
        match symbol.kind {
            SymbolKind::Class | SymbolKind::Struct | SymbolKind::Trait | SymbolKind::Interface => {
                // Header line of the container itself.
                if let Some(line) = decl_line(symbol, lines) {
                    spans.push((line, line));
                }
            }
            SymbolKind::Method => {
                if !opts.focus_keywords.is_empty()
                    && keyword_matches(&symbol.name, &opts.focus_keywords)
                {
                    // Key method: include the whole body.
                    if let Some(span) = symbol_block(symbol, lines) {
                        spans.push(span);
                    }
                } else if let Some(line) = decl_line(symbol, lines) {
                    // Signature line only.
                    spans.push((line, line));
                }
            }
            _ => {}
        }
    }
    spans
}

fn types_only_spans(file: &FileIndex, lines: &[&str]) -> Vec<Span> {
    let mut spans = Vec::new();
    for symbol in &file.symbols {
        if !symbol.kind.is_type_like() {
            continue;
        }
        if symbol.kind == SymbolKind::Class {
            // Class bodies are implementation; the header is the type.
            if let Some(line) = decl_line(symbol, lines) {
                spans.push((line, line));
            }
        } else if let Some(span) = symbol_block(symbol, lines) {
            spans.push(span);
        }
    }
    spans
}

fn comment_preserving_spans(file: &FileIndex, lines: &[&str]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut in_block_comment = false;
    for (i, line) in lines.iter().enumerate() {
        let t = line.trim_start();
        let is_comment = in_block_comment
            || t.starts_with("//")
            || t.starts_with('#')
            || t.starts_with("/*")
            || t.starts_with('*')
            || t.starts_with("\"\"\"");
        if t.contains("/*") && !t.contains("*/") {
            in_block_comment = true;
        }
        if in_block_comment && t.contains("*/") {
            in_block_comment = false;
        }
        if is_comment {
            spans.push((i, i));
        }
    }
    for symbol in &file.symbols {
        if let Some(line) = decl_line(symbol, lines) {
            spans.push((line, line));
        }
    }
    spans
}

fn keyword_window_spans(lines: &[&str], opts: &SampleOptions) -> Vec<Span> {
    if opts.focus_keywords.is_empty() {
        return Vec::new();
    }
    let keywords: Vec<String> = opts
        .focus_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();
    let mut spans = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if keywords.iter().any(|k| lower.contains(k)) {
            let start = i.saturating_sub(KEYWORD_WINDOW);
            let end = (i + KEYWORD_WINDOW).min(lines.len().saturating_sub(1));
            spans.push((start, end));
        }
    }
    spans
}

/// 0-based declaration line of a symbol, bounds-checked against the content.
fn decl_line(symbol: &Symbol, lines: &[&str]) -> Option<usize> {
    let line = (symbol.line as usize).checked_sub(1)?;
    (line < lines.len()).then_some(line)
}

/// Full block span of a symbol: brace-matched for brace languages,
/// indentation-based for Python-style blocks, capped at `MAX_BLOCK_LINES`.
fn symbol_block(symbol: &Symbol, lines: &[&str]) -> Option<Span> {
    let start = decl_line(symbol, lines)?;
    let limit = (start + MAX_BLOCK_LINES).min(lines.len() - 1);

    // Brace matching from the declaration line onward.
    let mut depth: i32 = 0;
    let mut saw_brace = false;
    for (i, line) in lines.iter().enumerate().take(limit + 1).skip(start) {
        for c in line.chars() {
            match c {
                '{' => {
                    depth += 1;
                    saw_brace = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if saw_brace && depth <= 0 {
            return Some((start, i));
        }
        // A brace language would open the block within a couple of lines.
        if !saw_brace && i > start + 2 {
            break;
        }
    }

    if saw_brace {
        // Unbalanced (mid-edit file): take what we scanned.
        return Some((start, limit));
    }

    // Indentation block (Python): lines more indented than the declaration.
    let base_indent = indent_of(lines[start]);
    let mut end = start;
    for (i, line) in lines.iter().enumerate().take(limit + 1).skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) > base_indent {
            end = i;
        } else {
            break;
        }
    }
    Some((start, end))
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Sorts spans and merges overlapping or adjacent ones.
fn merge_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_unstable();
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end + 1 => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Renders merged spans into a sample, dropping trailing lines until the
/// token estimate fits the budget. Non-contiguous spans are separated by an
/// ellipsis marker line.
fn render_within_budget(lines: &[&str], spans: &[Span], max_tokens: usize) -> ContentSample {
    if max_tokens == 0 {
        return ContentSample::default();
    }

    let mut out_lines: Vec<&str> = Vec::new();
    let mut previous_end: Option<usize> = None;
    for &(start, end) in spans {
        if let Some(prev) = previous_end {
            if start > prev + 1 {
                out_lines.push("...");
            }
        }
        for line in lines.iter().take(end + 1).skip(start) {
            out_lines.push(line);
        }
        previous_end = Some(end);
    }

    // Trim whole lines from the end until the estimate fits, keeping at
    // least one line so an oversized first line can still be truncated.
    let mut text = out_lines.join("\n");
    while estimate_tokens(&text) > max_tokens && out_lines.len() > 1 {
        out_lines.pop();
        text = out_lines.join("\n");
    }

    // A single oversized line: hard-truncate at the character budget.
    if estimate_tokens(&text) > max_tokens {
        text = text.chars().take(max_tokens * 4).collect();
    }

    let tokens = estimate_tokens(&text);
    ContentSample { text, tokens }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overlapping_and_adjacent() {
        let merged = merge_spans(vec![(6, 8), (0, 2), (1, 4), (7, 12)]);
        assert_eq!(merged, vec![(0, 4), (6, 12)]);
    }

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
