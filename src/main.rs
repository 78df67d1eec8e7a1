use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ctxgraph::cache;
use ctxgraph::config::load_config;
use ctxgraph::errors::{CtxGraphError, Result};
use ctxgraph::index::{FileAnalyzer, SemanticIndex};
use ctxgraph::persist::{snapshot_state, ContextPersistenceManager};
use ctxgraph::sampling::{ContentSampler, SampleOptions, SampleStrategy};
use ctxgraph::scoring::{FileRelevanceScorer, QueryContext, ScoreOptions};
use ctxgraph::types::{current_timestamp, SessionMetadata};

/// Context selection for coding assistants.
#[derive(Parser)]
#[command(name = "ctxgraph", about = "Context selection for coding assistants")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a project tree and save the session
    Index {
        /// Project path (default: current directory)
        path: Option<String>,
        /// Show per-file progress
        #[arg(short, long)]
        verbose: bool,
    },
    /// Rank indexed files against a query
    Query {
        /// Task description or query text
        query: String,
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
        /// File currently in focus
        #[arg(short, long)]
        current: Option<String>,
        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Extract a bounded excerpt from one file
    Sample {
        /// File to sample (relative to the project root)
        file: String,
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
        /// Token budget
        #[arg(short, long, default_value = "400")]
        tokens: usize,
        /// Strategy: functions, skeleton, types, comments, keywords
        #[arg(short, long, default_value = "functions")]
        strategy: String,
        /// Focus keywords (comma separated)
        #[arg(short, long)]
        keywords: Option<String>,
    },
    /// Show index and session status
    Status {
        /// Project path
        path: Option<String>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Index { path, verbose } => {
            let root = resolve_path(path);
            let config = load_config(&root)?;
            let index = Arc::new(RwLock::new(load_index(&root)));

            let handle = cache::spawn_scan(root.clone(), config, index.clone());
            while let Ok(progress) = handle.progress().recv() {
                if verbose {
                    println!(
                        "[{} scanned / {} analyzed] {}",
                        progress.scanned, progress.analyzed, progress.current
                    );
                }
            }
            let summary = handle.join();
            println!(
                "Indexed {} files ({} analyzed, {} unchanged, {} failed) in {}ms",
                summary.scanned,
                summary.analyzed,
                summary.skipped,
                summary.failed,
                summary.duration_ms
            );

            save_session(&root, &index.read().expect("index lock poisoned"))?;
            Ok(())
        }
        Commands::Query {
            query,
            path,
            current,
            limit,
            json,
        } => {
            let root = resolve_path(path);
            let config = load_config(&root)?;
            let index = load_or_build_index(&root)?;
            let graph = index.build_import_graph();

            let scorer = FileRelevanceScorer::from_config(&config);
            let ctx = QueryContext {
                current_file: current,
                recent_files: Vec::new(),
                user_query: query,
            };
            let files: Vec<String> = index.paths().map(|p| p.to_string()).collect();
            let results = scorer.score_multiple_files(
                &index,
                &graph,
                &files,
                &ctx,
                ScoreOptions {
                    min_score: Some(config.min_score),
                    max_files: Some(limit),
                },
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No files cleared the minimum score.");
            } else {
                for result in results {
                    let reasons: Vec<&str> =
                        result.reasons.iter().map(|r| r.as_str()).collect();
                    println!(
                        "{:>6.1}  {}  [{}]",
                        result.score,
                        result.path,
                        reasons.join(", ")
                    );
                }
            }
            Ok(())
        }
        Commands::Sample {
            file,
            path,
            tokens,
            strategy,
            keywords,
        } => {
            let root = resolve_path(path);
            let analyzer = FileAnalyzer::new();
            let record = analyzer.analyze_path(&root, &file)?;
            let content =
                std::fs::read_to_string(root.join(&file)).map_err(CtxGraphError::Io)?;

            let mut opts = SampleOptions::new(parse_strategy(&strategy)?, tokens);
            if let Some(keywords) = keywords {
                opts.focus_keywords = keywords.split(',').map(|k| k.trim().to_string()).collect();
            }

            let sample = ContentSampler::new().sample_file(&record, &content, &opts);
            println!("{}", sample.text);
            eprintln!("-- {} tokens (budget {})", sample.tokens, tokens);
            Ok(())
        }
        Commands::Status { path, json } => {
            let root = resolve_path(path);
            let manager = ContextPersistenceManager::new(&root);
            let state = manager.load_from_session();

            match (&state, json) {
                (None, false) => println!("No saved session."),
                (Some(state), false) => {
                    let file_count = SemanticIndex::deserialize(&state.index)
                        .map(|i| i.len())
                        .unwrap_or(0);
                    println!(
                        "Session: {} indexed files, {} open, {} total queries",
                        file_count,
                        state.current_files.len(),
                        state.session_metadata.total_queries
                    );
                }
                (_, true) => println!("{}", serde_json::to_string_pretty(&state)?),
            }
            Ok(())
        }
    }
}

fn resolve_path(path: Option<String>) -> PathBuf {
    path.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn parse_strategy(name: &str) -> Result<SampleStrategy> {
    match name {
        "functions" => Ok(SampleStrategy::WholeFunction),
        "skeleton" => Ok(SampleStrategy::ClassSkeleton),
        "types" => Ok(SampleStrategy::TypesOnly),
        "comments" => Ok(SampleStrategy::CommentPreserving),
        "keywords" => Ok(SampleStrategy::KeywordWindow),
        other => Err(CtxGraphError::Config {
            message: format!("unknown sampling strategy '{}'", other),
        }),
    }
}

/// Loads the saved index, or an empty one when no session exists.
fn load_index(root: &std::path::Path) -> SemanticIndex {
    ContextPersistenceManager::new(root)
        .load_from_session()
        .and_then(|state| SemanticIndex::deserialize(&state.index).ok())
        .unwrap_or_default()
}

/// Loads the saved index, falling back to a fresh synchronous scan.
fn load_or_build_index(root: &std::path::Path) -> Result<SemanticIndex> {
    let saved = load_index(root);
    if !saved.is_empty() {
        return Ok(saved);
    }
    let config = load_config(root)?;
    let index = Arc::new(RwLock::new(SemanticIndex::new()));
    let analyzer = FileAnalyzer::new();
    cache::scan(
        root,
        &config,
        &analyzer,
        &index,
        &AtomicBool::new(false),
        None,
    );
    let index = Arc::try_unwrap(index)
        .map_err(|_| CtxGraphError::Storage {
            message: "index still shared after scan".to_string(),
            operation: "load_or_build_index".to_string(),
        })?
        .into_inner()
        .map_err(|_| CtxGraphError::Storage {
            message: "index lock poisoned".to_string(),
            operation: "load_or_build_index".to_string(),
        })?;
    save_session(root, &index)?;
    Ok(index)
}

fn save_session(root: &std::path::Path, index: &SemanticIndex) -> Result<()> {
    let manager = ContextPersistenceManager::new(root);
    let (metadata, current_files, preferences) = match manager.load_from_session() {
        Some(s) => (
            SessionMetadata {
                last_activity: current_timestamp(),
                ..s.session_metadata
            },
            s.current_files,
            s.user_preferences,
        ),
        None => (
            SessionMetadata::new(current_timestamp()),
            Vec::new(),
            BTreeMap::new(),
        ),
    };

    let state = snapshot_state(index, current_files, preferences, metadata)?;
    manager.save_to_session(&state)
}
