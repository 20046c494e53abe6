// ABOUTME: CLI entrypoint for singalong command
// ABOUTME: Handles error exit codes, logging setup, and command dispatch

use clap::Parser;
use singalong::{
    cli::{Cli, Commands},
    config::Config,
    embeddings::build_embedder,
    paths::Paths,
    LyricsService, MatchResult, Result,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    if let Err(e) = run() {
        eprintln!("singalong: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    // stdout belongs to command output and the MCP transport
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = Paths::new(cli.data_dir.clone())?;
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&paths.config_file())?,
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    match cli.command() {
        Commands::Model => download_model(&config, &paths)?,
        Commands::Songs => {
            let service = start_service(&config, &paths)?;
            for song in service.list_songs()? {
                println!(
                    "{:<20} {} - {} [{}, {}]",
                    song.id, song.title, song.artist, song.language, song.difficulty
                );
            }
        }
        Commands::Match { text, song, json } => {
            let service = start_service(&config, &paths)?;
            let result = service.get_next_line(&text, song.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_match(&result);
            }
        }
        Commands::Practice { song } => {
            let service = start_service(&config, &paths)?;
            let start = service.start_practice(&song)?;
            println!("{} - {} ({} lines)", start.title, start.artist, start.total_lines);
            if let Some(line) = start.first_line {
                println!("First line: {}", line);
            }
        }
        Commands::Index => {
            let service = start_service(&config, &paths)?;
            if let Some(stats) = service.index_status() {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        }
        Commands::Serve => serve(start_service(&config, &paths)?)?,
    }

    Ok(())
}

/// Build the embedder and index the corpus; refuses to continue on a bad corpus.
fn start_service(config: &Config, paths: &Paths) -> Result<LyricsService> {
    let embedder = build_embedder(&config.embedder, paths)?;
    let service = LyricsService::new(embedder, config.matching.clone())?;
    match &config.corpus_path {
        Some(corpus) => service.load_corpus(corpus)?,
        None => service.load_default_corpus(&paths.default_corpus())?,
    };
    Ok(service)
}

fn print_match(result: &MatchResult) {
    if !result.found {
        println!("No match (confidence 0.00)");
        return;
    }

    println!(
        "{} - {} (line {}, confidence {:.2}, {})",
        result.title.as_deref().unwrap_or("Unknown"),
        result.artist.as_deref().unwrap_or("Unknown"),
        result.matched_line_number.unwrap_or_default() + 1,
        result.confidence,
        if result.is_correct { "correct" } else { "not correct" }
    );
    if let Some(line) = &result.matched_line {
        println!("  heard: {}", line);
    }
    for line in &result.next_lines {
        println!("  next:  {}", line);
    }
}

#[cfg(feature = "embeddings")]
fn download_model(config: &Config, paths: &Paths) -> Result<()> {
    let models_dir = config
        .embedder
        .models_dir
        .clone()
        .unwrap_or_else(|| paths.models_dir.clone());
    let model = singalong::embeddings::ensure_model(&models_dir)?;
    println!("Model:     {}", model.model_path.display());
    println!("Tokenizer: {}", model.tokenizer_path.display());
    Ok(())
}

#[cfg(not(feature = "embeddings"))]
fn download_model(_config: &Config, _paths: &Paths) -> Result<()> {
    Err(singalong::Error::Config(
        "model download requires the `embeddings` feature".into(),
    ))
}

#[cfg(feature = "mcp")]
fn serve(service: LyricsService) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(singalong::mcp::serve_mcp(std::sync::Arc::new(service)))
}

#[cfg(not(feature = "mcp"))]
fn serve(_service: LyricsService) -> Result<()> {
    Err(singalong::Error::Config(
        "serve requires the `mcp` feature".into(),
    ))
}
