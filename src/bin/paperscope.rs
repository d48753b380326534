//! paperscope CLI: paper search, tiered analysis, and graph layout.
//!
//! Usage:
//!   paperscope search <query> [--limit N] [--source S] [--pages N]
//!   paperscope analyze <paper_id> [--tier basic|deep|consensus]
//!   paperscope graph [--ticks N]
//!   paperscope mcp

use clap::{Parser, Subcommand};
use paperscope::analysis::TierState;
use paperscope::graph::Point;
use paperscope::layout::{RenderFrame, Viewport};
use paperscope::store::{LoadMoreOutcome, SearchOutcome};
use paperscope::{ClientConfig, Paper, ResearchDesk, Tier};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "paperscope",
    version,
    about = "Search research papers, run AI analyses, and lay out the relationship graph"
)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Base URL of the research service (overrides config and environment)
    #[arg(long, global = true)]
    api_base: Option<String>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the paper corpus
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        source: Option<String>,
        /// Number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Analyze a paper
    Analyze {
        paper_id: String,
        /// basic, deep, or consensus
        #[arg(long, default_value = "basic")]
        tier: Tier,
        #[arg(long)]
        provider: Option<String>,
        /// Use this provider key for the request only
        #[arg(long)]
        api_key: Option<String>,
    },
    /// List papers saved to the library
    Library,
    /// List notes, or add one
    Notes {
        /// Note text to add
        #[arg(long)]
        add: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Attach the note to a paper
        #[arg(long = "paper")]
        paper_id: Option<String>,
    },
    /// Save a paper to the library
    Save { paper_id: String },
    /// Check a provider API key
    ValidateKey { provider: String, api_key: String },
    /// Lay out the relationship graph and print node coordinates
    Graph {
        /// Upper bound on simulation ticks
        #[arg(long, default_value_t = 1000)]
        ticks: u64,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
    },
    /// Start the MCP (Model Context Protocol) server on stdio
    Mcp,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>, api_base: Option<String>) -> Result<ClientConfig, String> {
    let mut config = ClientConfig::load(path.map(PathBuf::as_path)).map_err(|e| e.to_string())?;
    if let Some(base) = api_base {
        config.api_base = base;
        config.validate().map_err(|e| e.to_string())?;
    }
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn print_papers(papers: &[Paper], start: usize) {
    for (i, paper) in papers.iter().enumerate() {
        println!("{:>4}. [{}] {} ({})", start + i + 1, paper.status, paper.title, paper.id);
    }
}

async fn cmd_search(desk: &ResearchDesk, query: &str, limit: Option<usize>, source: Option<&str>, pages: usize) -> i32 {
    match desk.search(query, source, limit).await {
        SearchOutcome::Committed(papers) => print_papers(&papers, 0),
        SearchOutcome::Skipped => {
            eprintln!("Error: query must not be empty");
            return 1;
        }
        SearchOutcome::Superseded => return 1,
        SearchOutcome::Failed(message) => {
            eprintln!("Error: {}", message);
            return 1;
        }
    }

    for _ in 1..pages {
        let loaded = desk.store().snapshot();
        if !loaded.has_more {
            break;
        }
        match desk.load_more(limit).await {
            LoadMoreOutcome::Appended(papers) => print_papers(&papers, loaded.papers.len()),
            LoadMoreOutcome::Failed(message) => {
                eprintln!("Error: {}", message);
                return 1;
            }
            LoadMoreOutcome::Skipped | LoadMoreOutcome::Superseded => break,
        }
    }

    let snapshot = desk.store().snapshot();
    eprintln!("{} papers, more available: {}", snapshot.papers.len(), snapshot.has_more);
    0
}

async fn cmd_analyze(
    desk: &ResearchDesk,
    paper_id: &str,
    tier: Tier,
    provider: Option<&str>,
    api_key: Option<&str>,
) -> i32 {
    let outcome = desk.run_tier(tier, paper_id, provider, api_key).await;
    match outcome.record().map(|r| &r.state) {
        Some(TierState::Ready { payload }) => print_json(payload),
        Some(TierState::Failed { error }) => {
            eprintln!("Error: {}", error);
            1
        }
        _ => {
            eprintln!("Error: {} analysis already running for {}", tier, paper_id);
            1
        }
    }
}

async fn cmd_notes(desk: &ResearchDesk, add: Option<String>, tags: Vec<String>, paper_id: Option<String>) -> i32 {
    if let Some(content) = add {
        if !desk.store().add_note(&content, tags, paper_id.as_deref()).await {
            eprintln!("Error: failed to add note");
            return 1;
        }
        return print_json(&desk.store().notes());
    }
    let notes = desk.store().fetch_notes().await;
    if notes.is_empty() {
        println!("No notes.");
        return 0;
    }
    print_json(&notes)
}

async fn cmd_graph(desk: &ResearchDesk, ticks: u64, width: f64, height: f64) -> i32 {
    let center = Point::new(width / 2.0, height / 2.0);
    let Some(model) = desk.build_graph(center).await else {
        let message = desk.store().graph_error().unwrap_or_else(|| "Failed to load graph".to_string());
        eprintln!("Error: {}", message);
        return 1;
    };
    if model.is_empty() {
        println!("Graph is empty.");
        return 0;
    }

    let mut engine = desk.layout(model, center);
    let ran = engine.run(ticks);
    eprintln!("{} ticks, settled: {}", ran, engine.is_settled());

    let frame = RenderFrame::compose(&engine.snapshot(), &Viewport::from_config(&desk.config().layout));
    println!("{:<32}  {:<8}  {:>9}  {:>9}", "ID", "KIND", "X", "Y");
    println!("{}", "-".repeat(64));
    for node in &frame.nodes {
        println!(
            "{:<32}  {:<8}  {:>9.1}  {:>9.1}",
            node.id, node.kind.as_str(), node.center.x, node.center.y
        );
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config.as_ref(), cli.api_base) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Commands::Mcp = cli.command {
        std::process::exit(paperscope::mcp::run_mcp_server(config));
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };
    let desk = match ResearchDesk::connect(config) {
        Ok(desk) => desk,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async {
        match cli.command {
            Commands::Search {
                query,
                limit,
                source,
                pages,
            } => cmd_search(&desk, &query, limit, source.as_deref(), pages).await,
            Commands::Analyze {
                paper_id,
                tier,
                provider,
                api_key,
            } => cmd_analyze(&desk, &paper_id, tier, provider.as_deref(), api_key.as_deref()).await,
            Commands::Library => {
                let papers = desk.store().fetch_library().await;
                if papers.is_empty() {
                    println!("Library is empty.");
                } else {
                    print_papers(&papers, 0);
                }
                0
            }
            Commands::Notes { add, tags, paper_id } => cmd_notes(&desk, add, tags, paper_id).await,
            Commands::Save { paper_id } => {
                if desk.save(&paper_id).await {
                    println!("Saved {}", paper_id);
                    0
                } else {
                    eprintln!("Error: failed to save {}", paper_id);
                    1
                }
            }
            Commands::ValidateKey { provider, api_key } => {
                let response = desk.validate_key(&provider, &api_key).await;
                let code = if response.valid { 0 } else { 1 };
                print_json(&response).max(code)
            }
            Commands::Graph { ticks, width, height } => cmd_graph(&desk, ticks, width, height).await,
            Commands::Mcp => 0,
        }
    });
    std::process::exit(code);
}
