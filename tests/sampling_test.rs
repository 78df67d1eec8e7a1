use ctxgraph::index::FileAnalyzer;
use ctxgraph::sampling::{
    estimate_tokens, ContentSampler, SampleOptions, SampleRequest, SampleStrategy,
};
use ctxgraph::types::FileIndex;

const TS_SOURCE: &str = r#"// Authentication helpers.
import { store } from "./store";

export interface Session {
    token: string;
}

export function login(user: string): Session {
    // issue a fresh token
    const token = store.issue(user);
    return { token };
}

export function logout(session: Session) {
    store.revoke(session.token);
}

export class SessionRegistry {
    find(token: string): Session | null {
        return store.find(token);
    }

    purgeExpired() {
        store.purge();
    }
}
"#;

fn analyzed() -> FileIndex {
    FileAnalyzer::new().analyze("src/auth.ts", TS_SOURCE, 0)
}

#[test]
fn every_strategy_respects_the_budget() {
    let file = analyzed();
    let sampler = ContentSampler::new();
    for strategy in [
        SampleStrategy::WholeFunction,
        SampleStrategy::ClassSkeleton,
        SampleStrategy::TypesOnly,
        SampleStrategy::CommentPreserving,
        SampleStrategy::KeywordWindow,
    ] {
        for budget in [1, 5, 20, 10_000] {
            let opts = SampleOptions::new(strategy, budget).with_keywords(&["login"]);
            let sample = sampler.sample_file(&file, TS_SOURCE, &opts);
            assert!(
                sample.tokens <= budget,
                "{:?} with budget {} produced {} tokens",
                strategy,
                budget,
                sample.tokens
            );
            assert_eq!(sample.tokens, estimate_tokens(&sample.text));
        }
    }
}

#[test]
fn whole_function_keywords_focus_the_sample() {
    let file = analyzed();
    let opts =
        SampleOptions::new(SampleStrategy::WholeFunction, 10_000).with_keywords(&["login"]);
    let sample = ContentSampler::new().sample_file(&file, TS_SOURCE, &opts);
    assert!(sample.text.contains("function login"));
    assert!(sample.text.contains("store.issue"));
    assert!(!sample.text.contains("function logout"));
}

#[test]
fn whole_function_without_keywords_takes_all_bodies() {
    let file = analyzed();
    let opts = SampleOptions::new(SampleStrategy::WholeFunction, 10_000);
    let sample = ContentSampler::new().sample_file(&file, TS_SOURCE, &opts);
    assert!(sample.text.contains("function login"));
    assert!(sample.text.contains("function logout"));
    // Non-contiguous functions are joined by an ellipsis marker.
    assert!(sample.text.contains("..."));
}

#[test]
fn class_skeleton_keeps_signatures_and_expands_key_methods() {
    let file = analyzed();
    let opts =
        SampleOptions::new(SampleStrategy::ClassSkeleton, 10_000).with_keywords(&["purge"]);
    let sample = ContentSampler::new().sample_file(&file, TS_SOURCE, &opts);
    assert!(sample.text.contains("class SessionRegistry"));
    // The keyword-matched method comes with its body.
    assert!(sample.text.contains("store.purge()"));
    // The other method is a signature line only.
    assert!(sample.text.contains("find(token: string)"));
    assert!(!sample.text.contains("store.find(token)"));
}

#[test]
fn types_only_skips_function_bodies() {
    let file = analyzed();
    let opts = SampleOptions::new(SampleStrategy::TypesOnly, 10_000);
    let sample = ContentSampler::new().sample_file(&file, TS_SOURCE, &opts);
    assert!(sample.text.contains("interface Session"));
    assert!(!sample.text.contains("store.issue"));
}

#[test]
fn comment_preserving_keeps_comment_lines() {
    let file = analyzed();
    let opts = SampleOptions::new(SampleStrategy::CommentPreserving, 10_000);
    let sample = ContentSampler::new().sample_file(&file, TS_SOURCE, &opts);
    assert!(sample.text.contains("// Authentication helpers."));
    assert!(sample.text.contains("// issue a fresh token"));
}

#[test]
fn keyword_window_surrounds_each_hit() {
    let file = analyzed();
    let opts =
        SampleOptions::new(SampleStrategy::KeywordWindow, 10_000).with_keywords(&["revoke"]);
    let sample = ContentSampler::new().sample_file(&file, TS_SOURCE, &opts);
    assert!(sample.text.contains("store.revoke"));
    // The window includes the enclosing declaration line.
    assert!(sample.text.contains("function logout"));
    assert!(!sample.text.contains("interface Session"));
}

#[test]
fn empty_match_falls_back_to_the_file_head() {
    let content = "just some plain text\nwith no declarations at all\n";
    let file = FileAnalyzer::new().analyze("notes.txt", content, 0);
    let opts = SampleOptions::new(SampleStrategy::TypesOnly, 100);
    let sample = ContentSampler::new().sample_file(&file, content, &opts);
    assert!(sample.text.contains("just some plain text"));
}

#[test]
fn zero_budget_yields_an_empty_sample() {
    let file = analyzed();
    let opts = SampleOptions::new(SampleStrategy::WholeFunction, 0);
    let sample = ContentSampler::new().sample_file(&file, TS_SOURCE, &opts);
    assert!(sample.text.is_empty());
    assert_eq!(sample.tokens, 0);
}

#[test]
fn one_oversized_line_is_hard_truncated() {
    let content = "x".repeat(4000);
    let file = FileAnalyzer::new().analyze("big.txt", &content, 0);
    let opts = SampleOptions::new(SampleStrategy::WholeFunction, 5);
    let sample = ContentSampler::new().sample_file(&file, &content, &opts);
    assert!(sample.tokens <= 5);
    assert!(!sample.text.is_empty());
}

#[test]
fn multi_file_sampling_shares_one_budget() {
    let files: Vec<FileIndex> = (0..3)
        .map(|i| FileAnalyzer::new().analyze(&format!("f{}.ts", i), TS_SOURCE, 0))
        .collect();
    let requests: Vec<SampleRequest<'_>> = files
        .iter()
        .map(|file| SampleRequest {
            file,
            content: TS_SOURCE,
            options: SampleOptions::new(SampleStrategy::WholeFunction, 10_000),
        })
        .collect();

    let total_budget = 60;
    let samples = ContentSampler::new().sample_many(&requests, total_budget);
    assert_eq!(samples.len(), 3);
    let total: usize = samples.iter().map(|s| s.tokens).sum();
    assert!(total <= total_budget, "combined {} tokens", total);
    // Equal estimates split the budget evenly; nobody is starved.
    assert!(samples.iter().all(|s| s.tokens > 0));
}

#[test]
fn multi_file_sampling_honors_per_file_caps() {
    let file = analyzed();
    let requests = vec![SampleRequest {
        file: &file,
        content: TS_SOURCE,
        options: SampleOptions::new(SampleStrategy::WholeFunction, 8),
    }];
    let samples = ContentSampler::new().sample_many(&requests, 10_000);
    assert!(samples[0].tokens <= 8);
}
