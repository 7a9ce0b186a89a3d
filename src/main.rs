//! CLI entry point for the visual similarity search service.
//!
//! Provides commands for building the product index from precomputed
//! embeddings, querying it, and inspecting configuration and index state.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use lookalike::display::{create_hits_table, create_resolved_table, create_stats_table};
use lookalike::io::{
    ExitCode, JsonResponse, OutputFormat, read_embeddings_jsonl, read_query_vector,
};
use lookalike::{
    IndexError, InMemoryProductStore, SearchRequest, SearchService, Settings, VectorIndexManager,
    resolve_hits,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Create custom styles matching cargo's color scheme
fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Visual similarity search
#[derive(Parser)]
#[command(
    name = "lookalike",
    version = env!("CARGO_PKG_VERSION"),
    about = "Visual similarity search for product catalogs",
    long_about = "Build an exact nearest-neighbor index over product image embeddings and query it for visually similar products.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .lookalike directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display effective settings after file and environment layering")]
    Config,

    /// Build the index from precomputed embeddings
    #[command(
        about = "Build and save the product index",
        after_help = "Input is JSON Lines, one product per line:\n  {\"product_id\": 17, \"embedding\": [0.12, -0.03, ...]}"
    )]
    Build {
        /// JSON Lines file of product embeddings
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Find products similar to a query embedding
    #[command(
        about = "Search the index with a query vector",
        after_help = "Examples:\n  lookalike search --vector query.json\n  lookalike search --vector query.json --k 5 --threshold 0.6 --json"
    )]
    Search {
        /// JSON file holding the query vector as an array of numbers
        #[arg(long)]
        vector: PathBuf,

        /// Maximum number of results (defaults to search.default_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Minimum similarity between 0 and 1 (defaults to search.default_threshold)
        #[arg(short, long)]
        threshold: Option<f32>,

        /// JSON catalog used to attach product details
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics
    #[command(about = "Load the index if present and report its status")]
    Stats {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn output_format(&self) -> OutputFormat {
        match self {
            Commands::Search { json, .. } | Commands::Stats { json } => {
                OutputFormat::from_json_flag(*json)
            }
            _ => OutputFormat::Text,
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::ConfigError.into();
        }
    };

    init_tracing(&settings, cli.verbose);

    let format = cli.command.output_format();
    match run(cli.command, settings) {
        Ok(code) => code.into(),
        Err(e) => report_error(&e, format).into(),
    }
}

fn init_tracing(settings: &Settings, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        settings
            .logging
            .level_filter()
            .unwrap_or(tracing::Level::INFO)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_error(error: &anyhow::Error, format: OutputFormat) -> ExitCode {
    let Some(index_error) = error.downcast_ref::<IndexError>() else {
        eprintln!("Error: {error:#}");
        return ExitCode::GeneralError;
    };

    if format.is_json() {
        let response = JsonResponse::failure(index_error);
        match serde_json::to_string_pretty(&response) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("Error: {index_error}"),
        }
    } else {
        eprintln!("Error: {index_error}");
        for suggestion in index_error.recovery_suggestions() {
            eprintln!("  Suggestion: {suggestion}");
        }
    }
    ExitCode::from_error(index_error)
}

fn run(command: Commands, settings: Settings) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force).map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            Ok(ExitCode::Success)
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(ExitCode::Success)
        }

        Commands::Build { input } => {
            settings.validate()?;
            build(&settings, &input)
        }

        Commands::Search {
            vector,
            k,
            threshold,
            catalog,
            json,
        } => {
            settings.validate()?;
            let request = SearchRequest { k, threshold };
            search(
                &settings,
                &vector,
                &request,
                catalog.as_deref(),
                OutputFormat::from_json_flag(json),
            )
        }

        Commands::Stats { json } => {
            settings.validate()?;
            let manager = VectorIndexManager::from_settings(&settings)?;
            manager.load()?;
            let stats = manager.stats();

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&JsonResponse::success(&stats))?
                );
            } else {
                println!("{}", create_stats_table(&stats));
            }
            Ok(ExitCode::Success)
        }
    }
}

fn build(settings: &Settings, input: &Path) -> anyhow::Result<ExitCode> {
    let started = Instant::now();
    let batch = read_embeddings_jsonl(input)?;
    info!(products = batch.len(), input = %input.display(), "Read embeddings");

    let manager = VectorIndexManager::from_settings(settings)?;
    manager.build(&batch.vectors, &batch.ids)?;
    manager.save()?;

    println!(
        "Indexed {} products in {:.2}s",
        batch.len(),
        started.elapsed().as_secs_f64()
    );
    println!("Index saved to: {}", settings.index.index_path.display());
    Ok(ExitCode::Success)
}

fn search(
    settings: &Settings,
    vector_path: &Path,
    request: &SearchRequest,
    catalog: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let started = Instant::now();
    let query = read_query_vector(vector_path)?;

    let manager = Arc::new(VectorIndexManager::from_settings(settings)?);
    if !manager.load()? {
        return Err(IndexError::NotLoaded.into());
    }

    let service = SearchService::new(manager, settings.search.clone());
    let hits = service.search_request(&query, request)?;

    match catalog {
        Some(path) => {
            let store = InMemoryProductStore::from_json_file(path)?;
            let resolved = resolve_hits(&store, &hits);
            if format.is_json() {
                let response = JsonResponse::success(&resolved).elapsed(started.elapsed());
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if resolved.is_empty() {
                println!("No similar products found");
            } else {
                println!("{}", create_resolved_table(&resolved));
            }
        }
        None => {
            if format.is_json() {
                let response = JsonResponse::success(&hits).elapsed(started.elapsed());
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if hits.is_empty() {
                println!("No similar products found");
            } else {
                println!("{}", create_hits_table(&hits));
            }
        }
    }

    Ok(ExitCode::Success)
}
