//! Shakla CLI — discourse graph extraction over a segment corpus.
//!
//! Usage:
//!   shakla extract --corpus texts.json --work Berakhot --start-page 2a --limit 50
//!   shakla extract --corpus texts.json --all --export summary.json
//!   shakla show --db path/to/shakla.db "Berakhot 2a"

use clap::{Parser, Subcommand};
use shakla::{
    AnalyzerConfig, AssistedAnalyzer, BatchOrchestrator, DiscourseStore, FileSegmentStore,
    HeuristicAnalyzer, OpenStore, SqliteStore, StructuralAnalyzer, SubprocessCompletion,
    WorkSelector,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "shakla",
    version,
    about = "Discourse graph extraction engine for Talmudic argumentation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extraction over one work or all works in the corpus
    Extract {
        /// Path to the JSON segment corpus
        #[arg(long)]
        corpus: PathBuf,
        /// Work to analyze (ignored with --all)
        #[arg(long, default_value = "Berakhot")]
        work: String,
        /// Extract from all works found in the corpus
        #[arg(long)]
        all: bool,
        /// Starting page label, e.g. "2a"
        #[arg(long)]
        start_page: Option<String>,
        /// Maximum pages to analyze per work
        #[arg(long)]
        limit: Option<usize>,
        /// Command to reach the completion service; without it the
        /// deterministic heuristic analyzer runs
        #[arg(long)]
        completion_cmd: Option<String>,
        /// Path to the SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Export the run summary to a JSON file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Show a persisted discourse unit and its steps
    Show {
        /// Page reference, e.g. "Berakhot 2a"; omit to list all units
        page_ref: Option<String>,
        /// Path to the SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Default database path (~/.local/share/shakla/shakla.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let dir = data_dir.join("shakla");
    std::fs::create_dir_all(&dir).ok();
    dir.join("shakla.db")
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<SqliteStore>, String> {
    let path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&path)
        .map(Arc::new)
        .map_err(|e| format!("failed to open database: {}", e))
}

/// Resolve the extraction mode once, at wiring time.
fn wire_analyzer(completion_cmd: Option<String>) -> Arc<dyn StructuralAnalyzer> {
    let config = AnalyzerConfig::default();
    match completion_cmd {
        Some(cmd) => {
            let mut parts = cmd.split_whitespace().map(str::to_string);
            let program = parts.next().unwrap_or_default();
            let client = SubprocessCompletion::new(program).with_args(parts.collect());
            Arc::new(AssistedAnalyzer::new(Arc::new(client), config))
        }
        None => Arc::new(HeuristicAnalyzer::new(config)),
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_extract(
    corpus: PathBuf,
    work: String,
    all: bool,
    start_page: Option<String>,
    limit: Option<usize>,
    completion_cmd: Option<String>,
    db: Option<PathBuf>,
    export: Option<PathBuf>,
) -> i32 {
    let segments = match FileSegmentStore::open(&corpus) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error: cannot open corpus '{}': {}", corpus.display(), e);
            return 1;
        }
    };
    let store = match open_store(db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let assisted = completion_cmd.is_some();
    let orchestrator = match BatchOrchestrator::builder()
        .segments(segments)
        .analyzer(wire_analyzer(completion_cmd))
        .store(store)
        .build()
    {
        Ok(orch) => orch,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let selector = if all {
        WorkSelector::All
    } else {
        WorkSelector::Named(vec![work])
    };

    let summary = match orchestrator.run(selector, start_page, limit).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!("Extraction run {}", summary.run_id);
    println!(
        "  mode: {}",
        if assisted { "assisted" } else { "heuristic" }
    );
    println!("  works: {}/{} processed", summary.works_processed, summary.works_found);
    println!("  pages seen: {}", summary.pages_seen);
    println!("  extracted:  {}", summary.extracted);
    println!("  saved:      {}", summary.saved);
    println!("  failed:     {}", summary.failed);
    println!("  fallbacks:  {}", summary.fallbacks);
    for work in &summary.works {
        match &work.error {
            Some(error) => println!("  {}: error: {}", work.work, error),
            None => println!(
                "  {}: {} pages, {} saved, {} failed",
                work.work, work.pages_seen, work.saved, work.failed
            ),
        }
    }

    if let Some(path) = export {
        let json = match serde_json::to_string_pretty(&summary) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Error: cannot serialize summary: {}", e);
                return 1;
            }
        };
        if let Err(e) = std::fs::write(&path, json) {
            eprintln!("Error: cannot write '{}': {}", path.display(), e);
            return 1;
        }
        println!("Summary exported to {}", path.display());
    }

    0
}

fn cmd_show(page_ref: Option<String>, db: Option<PathBuf>) -> i32 {
    let store = match open_store(db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let Some(page_ref) = page_ref else {
        return match store.list_units() {
            Ok(units) if units.is_empty() => {
                println!("No discourse units extracted yet.");
                0
            }
            Ok(units) => {
                println!("{:<24}  {:<10}  TITLE", "PAGE", "STRATEGY");
                println!("{}", "-".repeat(72));
                for unit in units {
                    println!("{:<24}  {:<10}  {}", unit.page_ref, unit.strategy, unit.title);
                }
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    };

    let unit = match store.unit(&page_ref) {
        Ok(Some(unit)) => unit,
        Ok(None) => {
            eprintln!("Error: no discourse unit for '{}'", page_ref);
            return 1;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!("{} — {}", unit.page_ref, unit.title);
    println!("  strategy: {}", unit.strategy);
    println!("  theme:    {}", unit.theme);
    println!("  question: {}", unit.main_question);
    println!("  summary:  {}", unit.summary);

    match store.steps_for_page(&page_ref) {
        Ok(steps) => {
            println!("  steps ({}):", steps.len());
            for step in steps {
                let parent = step
                    .parent_sequence
                    .map(|p| format!(" ← {}", p))
                    .unwrap_or_default();
                println!(
                    "    {:>3}. [{}] {}{}",
                    step.sequence, step.step_type, step.label, parent
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let level = match std::env::var("SHAKLA_LOG").as_deref() {
        Ok("debug") => tracing::Level::DEBUG,
        Ok("trace") => tracing::Level::TRACE,
        Ok("warn") => tracing::Level::WARN,
        _ => tracing::Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Extract {
            corpus,
            work,
            all,
            start_page,
            limit,
            completion_cmd,
            db,
            export,
        } => {
            cmd_extract(
                corpus,
                work,
                all,
                start_page,
                limit,
                completion_cmd,
                db,
                export,
            )
            .await
        }
        Commands::Show { page_ref, db } => cmd_show(page_ref, db),
    };
    std::process::exit(code);
}
