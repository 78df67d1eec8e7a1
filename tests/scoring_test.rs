use ctxgraph::index::{ImportGraph, SemanticIndex};
use ctxgraph::scoring::{
    FileRelevanceScorer, QueryContext, ScoreOptions, ScoreWeights, UserHistory,
};
use ctxgraph::types::{content_hash, FileIndex, ScoreReason, Symbol, SymbolKind};

fn record(path: &str, imports: &[&str], symbols: &[&str]) -> FileIndex {
    FileIndex {
        path: path.to_string(),
        content_hash: content_hash(path),
        size_bytes: 500,
        last_modified: 0,
        symbols: symbols
            .iter()
            .enumerate()
            .map(|(i, name)| Symbol {
                name: name.to_string(),
                kind: SymbolKind::Function,
                line: i as u32 + 1,
                exported: true,
            })
            .collect(),
        imports: imports.iter().map(|s| s.to_string()).collect(),
        exports: symbols.iter().map(|s| s.to_string()).collect(),
    }
}

/// a → b → c chain plus a disconnected file.
fn chain_index() -> (SemanticIndex, ImportGraph) {
    let mut index = SemanticIndex::new();
    index.add_file(record("src/a.ts", &["./b"], &["handleAuth"]));
    index.add_file(record("src/b.ts", &["./c"], &["sessionStore"]));
    index.add_file(record("src/c.ts", &[], &["tokenCache"]));
    index.add_file(record("src/other.ts", &[], &["unrelatedThing"]));
    let graph = index.build_import_graph();
    (index, graph)
}

fn ctx_with_current(current: &str) -> QueryContext {
    QueryContext {
        current_file: Some(current.to_string()),
        recent_files: Vec::new(),
        user_query: String::new(),
    }
}

#[test]
fn bounds_hold_for_any_context() {
    let (index, graph) = chain_index();
    let mut scorer = FileRelevanceScorer::new();
    scorer.add_to_history("src/c.ts", "src/a.ts");
    let ctx = QueryContext {
        current_file: Some("src/a.ts".to_string()),
        recent_files: vec!["src/b.ts".to_string(), "src/c.ts".to_string()],
        user_query: "handleAuth sessionStore tokenCache".to_string(),
    };
    for path in ["src/a.ts", "src/b.ts", "src/c.ts", "src/other.ts", "ghost.ts"] {
        let result = scorer.score_file(&index, &graph, path, &ctx);
        assert!((0.0..=100.0).contains(&result.score), "score {}", result.score);
        assert!((0.0..=1.0).contains(&result.confidence));
    }
}

#[test]
fn unknown_file_scores_zero() {
    let (index, graph) = chain_index();
    let scorer = FileRelevanceScorer::new();
    let result = scorer.score_file(&index, &graph, "ghost.ts", &ctx_with_current("src/a.ts"));
    assert_eq!(result.score, 0.0);
    assert!(result.reasons.is_empty());
}

#[test]
fn two_hop_chain_contributes_twenty_four_points() {
    let (index, graph) = chain_index();
    let scorer = FileRelevanceScorer::new();
    let result = scorer.score_file(&index, &graph, "src/c.ts", &ctx_with_current("src/a.ts"));
    // Only the chain factor fires: distance 2 is worth 0.6 of weight 40.
    assert!((result.score - 24.0).abs() < 1e-9, "score {}", result.score);
    assert_eq!(result.reasons, [ScoreReason::ImportChain]);
    assert!((result.confidence - 0.7).abs() < 1e-9);
}

#[test]
fn distant_but_reachable_files_score_the_chain_floor() {
    // f0 → f1 → ... → f7: seven hops, well past the graduated tiers.
    let mut index = SemanticIndex::new();
    for i in 0..8 {
        let next = format!("./f{}", i + 1);
        let imports: Vec<&str> = if i < 7 { vec![next.as_str()] } else { Vec::new() };
        index.add_file(record(&format!("src/f{}.ts", i), &imports, &[]));
    }
    let graph = index.build_import_graph();
    assert_eq!(graph.distance("src/f0.ts", "src/f7.ts", usize::MAX), Some(7));

    let scorer = FileRelevanceScorer::new();
    let far = scorer.score_file(&index, &graph, "src/f7.ts", &ctx_with_current("src/f0.ts"));
    // Reachable at any finite distance is worth the 0.1 floor, never zero.
    assert!((far.score - 4.0).abs() < 1e-9, "score {}", far.score);
    assert_eq!(far.reasons, [ScoreReason::ImportChain]);
}

#[test]
fn direct_import_saturates_the_scale() {
    let (index, graph) = chain_index();
    let scorer = FileRelevanceScorer::new();
    let result = scorer.score_file(&index, &graph, "src/b.ts", &ctx_with_current("src/a.ts"));
    // Direct (85) plus one-hop chain (40) clamps at 100.
    assert_eq!(result.score, 100.0);
    assert!(result.reasons.contains(&ScoreReason::DirectImport));
    assert!(!result.reasons.contains(&ScoreReason::ImportChain));
    assert!((result.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn reverse_import_is_weaker_than_forward() {
    let (index, graph) = chain_index();
    // Isolate the direct factor so the 0.8 reverse multiplier is observable.
    let weights = ScoreWeights {
        direct_reference: 50.0,
        symbol_match: 0.0,
        chain_distance: 0.0,
        recency: 0.0,
        user_pattern: 0.0,
    };
    let scorer = FileRelevanceScorer::new().with_weights(weights);

    let forward = scorer.score_file(&index, &graph, "src/b.ts", &ctx_with_current("src/a.ts"));
    let reverse = scorer.score_file(&index, &graph, "src/a.ts", &ctx_with_current("src/b.ts"));
    assert!((forward.score - 50.0).abs() < 1e-9);
    assert!((reverse.score - 40.0).abs() < 1e-9);
    assert!(reverse.reasons.contains(&ScoreReason::ImportedBy));
}

#[test]
fn exact_symbol_match_scores_full_symbol_weight() {
    let (index, graph) = chain_index();
    let scorer = FileRelevanceScorer::new();
    let ctx = QueryContext {
        current_file: None,
        recent_files: Vec::new(),
        user_query: "fix the handleAuth timeout".to_string(),
    };
    let hit = scorer.score_file(&index, &graph, "src/a.ts", &ctx);
    assert!((hit.score - 65.0).abs() < 1e-9, "score {}", hit.score);
    assert_eq!(hit.reasons, [ScoreReason::SymbolMatch]);

    let miss = scorer.score_file(&index, &graph, "src/other.ts", &ctx);
    assert_eq!(miss.score, 0.0);
}

#[test]
fn symbol_factor_is_dampened_by_symbol_count() {
    let mut index = SemanticIndex::new();
    index.add_file(record("focused.ts", &[], &["parseConfig"]));
    let grab_bag: Vec<String> = (0..99)
        .map(|i| format!("util{}", i))
        .chain(["parseConfig".to_string()])
        .collect();
    let names: Vec<&str> = grab_bag.iter().map(|s| s.as_str()).collect();
    index.add_file(record("grab_bag.ts", &[], &names));

    let graph = index.build_import_graph();
    let scorer = FileRelevanceScorer::new();
    let ctx = QueryContext {
        user_query: "parseConfig".to_string(),
        ..QueryContext::default()
    };
    let focused = scorer.score_file(&index, &graph, "focused.ts", &ctx);
    let grab_bag = scorer.score_file(&index, &graph, "grab_bag.ts", &ctx);
    assert!(focused.score > grab_bag.score);
}

#[test]
fn recency_falls_linearly_with_rank() {
    let (index, graph) = chain_index();
    let scorer = FileRelevanceScorer::new();
    let ctx = QueryContext {
        current_file: None,
        recent_files: vec!["src/c.ts".to_string(), "src/other.ts".to_string()],
        user_query: String::new(),
    };
    let newest = scorer.score_file(&index, &graph, "src/c.ts", &ctx);
    let older = scorer.score_file(&index, &graph, "src/other.ts", &ctx);
    assert!((newest.score - 30.0).abs() < 1e-9);
    assert!((older.score - 15.0).abs() < 1e-9);
    assert!(newest.reasons.contains(&ScoreReason::RecentlyUsed));
}

#[test]
fn user_pattern_rewards_files_accessed_in_this_context() {
    let (index, graph) = chain_index();
    let mut scorer = FileRelevanceScorer::new();
    scorer.add_to_history("src/c.ts", "src/a.ts");

    let result = scorer.score_file(&index, &graph, "src/c.ts", &ctx_with_current("src/a.ts"));
    // Chain (24) plus a full-strength pattern hit (35).
    assert!((result.score - 59.0).abs() < 1e-9, "score {}", result.score);
    assert!(result.reasons.contains(&ScoreReason::UserPattern));

    // The pattern is per-context: a different current file gets none of it.
    let elsewhere = scorer.score_file(&index, &graph, "src/c.ts", &ctx_with_current("src/b.ts"));
    assert!(!elsewhere.reasons.contains(&ScoreReason::UserPattern));
}

#[test]
fn size_and_export_penalties_dock_the_score() {
    let mut index = SemanticIndex::new();
    let heavy_exports: Vec<String> = (0..25).map(|i| format!("export{}", i)).collect();
    let mut heavy = record("heavy.ts", &[], &["parseConfig"]);
    heavy.size_bytes = 15_000;
    heavy.exports = heavy_exports;
    index.add_file(heavy);

    let mut light = record("light.ts", &[], &["parseConfig"]);
    light.size_bytes = 2_000;
    light.exports = (0..5).map(|i| format!("export{}", i)).collect();
    index.add_file(light);

    let graph = index.build_import_graph();
    let scorer = FileRelevanceScorer::new();
    let ctx = QueryContext {
        user_query: "parseConfig".to_string(),
        ..QueryContext::default()
    };

    let heavy = scorer.score_file(&index, &graph, "heavy.ts", &ctx);
    let light = scorer.score_file(&index, &graph, "light.ts", &ctx);
    assert!(heavy.score < light.score);
    assert!(heavy.reasons.contains(&ScoreReason::SizePenalty));
    assert!(heavy.reasons.contains(&ScoreReason::ExportPenalty));
    assert!(!light.reasons.contains(&ScoreReason::SizePenalty));
    // Penalties dock, never zero out.
    assert!(heavy.score > 0.0);
}

#[test]
fn batch_scoring_sorts_filters_and_truncates() {
    let (index, graph) = chain_index();
    let scorer = FileRelevanceScorer::new();
    let ctx = QueryContext {
        current_file: Some("src/a.ts".to_string()),
        recent_files: Vec::new(),
        user_query: "handleAuth".to_string(),
    };
    let files: Vec<String> = index.paths().map(|p| p.to_string()).collect();

    let results = scorer.score_multiple_files(
        &index,
        &graph,
        &files,
        &ctx,
        ScoreOptions {
            min_score: Some(5.0),
            max_files: Some(2),
        },
    );
    assert_eq!(results.len(), 2);
    // The directly imported file outranks everything else.
    assert_eq!(results[0].path, "src/b.ts");
    assert!(results[0].score >= results[1].score);
    assert!(results.iter().all(|r| r.score >= 5.0));
    assert!(results.iter().all(|r| r.path != "src/other.ts"));
}

#[test]
fn batch_order_is_deterministic_on_ties() {
    let (index, graph) = chain_index();
    let scorer = FileRelevanceScorer::new();
    let files: Vec<String> = index.paths().map(|p| p.to_string()).collect();
    let ctx = QueryContext::default();

    let first = scorer.score_multiple_files(&index, &graph, &files, &ctx, ScoreOptions::default());
    let second = scorer.score_multiple_files(&index, &graph, &files, &ctx, ScoreOptions::default());
    let order = |r: &[ctxgraph::types::RelevanceScore]| -> Vec<String> {
        r.iter().map(|s| s.path.clone()).collect()
    };
    assert_eq!(order(&first), order(&second));
}

#[test]
fn history_caps_bound_memory() {
    let mut history = UserHistory::with_caps(2, 2);
    history.record("one.ts", "ctx.ts");
    history.record("two.ts", "ctx.ts");
    history.record("three.ts", "ctx.ts");
    // Per-context cap: only the two most recent survive.
    assert_eq!(history.accessed("ctx.ts"), ["three.ts", "two.ts"]);
    assert_eq!(history.recency_factor("ctx.ts", "three.ts"), 1.0);
    assert_eq!(history.recency_factor("ctx.ts", "one.ts"), 0.0);

    history.record("x.ts", "other.ts");
    history.record("x.ts", "third.ts");
    // Global cap: the stalest context key is pruned.
    assert_eq!(history.context_count(), 2);
    assert!(history.accessed("ctx.ts").is_empty());
}

#[test]
fn rerecording_moves_a_file_to_the_front() {
    let mut history = UserHistory::new();
    history.record("a.ts", "ctx.ts");
    history.record("b.ts", "ctx.ts");
    history.record("a.ts", "ctx.ts");
    assert_eq!(history.accessed("ctx.ts"), ["a.ts", "b.ts"]);
}
