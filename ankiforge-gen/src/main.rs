//! ankiforge-gen - illustrated vocabulary flashcards for Anki
//!
//! Reads words from the work queue (or a single `--word`), asks Claude for
//! the card text, generates an illustration with Pollinations, and creates
//! two notes per word through AnkiConnect.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ankiforge_common::config::{
    resolve_anthropic_api_key, resolve_config_path, DataLayout, LoggingConfig, RootFolderResolver,
    TomlConfig,
};
use ankiforge_gen::services::word_queue::load_words;
use ankiforge_gen::services::{
    AnkiClient, ClaudeClient, PollinationsClient, ProcessedCache, PromptTemplate,
};
use ankiforge_gen::utils::until_shutdown;
use ankiforge_gen::{Pipeline, WordSource};

/// Command-line arguments for ankiforge-gen
#[derive(Parser, Debug)]
#[command(name = "ankiforge-gen")]
#[command(about = "Generate illustrated vocabulary flashcards in Anki")]
#[command(version)]
struct Args {
    /// Process only this word (the queue file is left untouched)
    #[arg(short, long)]
    word: Option<String>,

    /// Clear the processed-word cache before running
    #[arg(long)]
    reset_cache: bool,

    /// Root folder holding config/ and data/
    #[arg(short, long, env = "ANKIFORGE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, env = "ANKIFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Target deck, overriding the configured one
    #[arg(long)]
    deck: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = match TomlConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config.logging, args.log_level.as_deref()) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    info!(
        "Starting ankiforge-gen v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    // TomlConfig::load runs before the subscriber exists, so repeat its outcome here
    if config_path.exists() {
        info!("Config file: {}", config_path.display());
    } else {
        warn!(
            "Config file not found at {}, using built-in defaults",
            config_path.display()
        );
    }

    match until_shutdown(run(args, config), shutdown_signal()).await {
        Some(Ok(code)) => code,
        Some(Err(e)) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
        None => {
            warn!("Interrupted; words completed so far are saved");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: TomlConfig) -> Result<ExitCode> {
    let root_folder = RootFolderResolver::new(args.root_folder, config.root_folder.clone()).resolve();
    let layout = DataLayout::new(root_folder);
    layout
        .ensure_directories()
        .context("Failed to create data folders")?;
    info!("Root folder: {}", layout.root().display());

    let api_key = resolve_anthropic_api_key(&config)?;

    let anki = AnkiClient::new(&config.anki)?;
    if !anki.check_connection().await {
        bail!(
            "Could not connect to AnkiConnect at {}. Make sure Anki is open and the AnkiConnect add-on is installed.",
            config.anki.url
        );
    }
    info!("✓ Connected to AnkiConnect");

    let deck_name = args.deck.unwrap_or_else(|| config.anki.deck_name.clone());
    if let Err(e) = anki.create_deck_if_needed(&deck_name).await {
        warn!(deck = %deck_name, error = %e, "Could not verify or create deck");
    }

    let template = PromptTemplate::load(&layout.prompt_template_path())?;
    let claude = ClaudeClient::new(api_key, &config.llm, template)?;
    let images = PollinationsClient::new(layout.images_dir(), &config.image)?;

    let cache = if args.reset_cache {
        ProcessedCache::reset(layout.cache_path()).context("Failed to reset cache")?
    } else {
        ProcessedCache::load(layout.cache_path())
    };
    info!("{} words in processed cache", cache.len());

    let (words, source) = match args.word {
        Some(word) => {
            let word = word.trim().to_string();
            if word.is_empty() {
                bail!("--word must not be empty");
            }
            (vec![word], WordSource::SingleWord)
        }
        None => {
            let path = layout.words_path();
            (load_words(&path)?, WordSource::QueueFile(path))
        }
    };

    if words.is_empty() {
        info!("No words to process");
        return Ok(ExitCode::SUCCESS);
    }
    info!("{} words to process, deck '{}'", words.len(), deck_name);

    let mut pipeline = Pipeline::new(
        claude,
        images,
        anki,
        deck_name,
        config.anki.default_tags.clone(),
        cache,
    );

    let summary = pipeline.run(&words, &source).await;

    println!("{}", summary.display_string());

    if summary.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Console logging plus an optional plain-text log file
fn init_tracing(logging: &LoggingConfig, cli_level: Option<&str>) -> Result<()> {
    let level = cli_level.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level '{}'", level))?;

    let file_layer = match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

/// Resolves on Ctrl+C (or SIGTERM on unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        },
        _ = terminate => {
            info!("Received terminate signal, stopping");
        },
    }
}
