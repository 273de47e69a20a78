//! Command-line interface.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod detect;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use scribo_ner::NerConfig;

#[derive(Parser)]
#[command(name = "scribo-ner")]
#[command(about = "Named entity structuring for historical directory entries")]
#[command(version)]
pub struct Cli {
    /// Config file (default: discovered scribo-ner.{toml,yaml,json})
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Detect entities in directory entries and print them as JSON
    Detect {
        /// Entry texts (reads --input or stdin when empty)
        texts: Vec<String>,
        /// File holding a JSON array of strings, or one entry per line
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Backend to use: cnn or bert (default: from config)
        #[arg(short, long)]
        backend: Option<String>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Load every backend and report its availability
    Check,
}

/// Load configuration from `--config` or by discovery.
async fn load_config(path: Option<PathBuf>) -> anyhow::Result<NerConfig> {
    match path {
        Some(path) => Ok(NerConfig::load_from_path(&path)
            .await
            .map_err(anyhow::Error::msg)?
            .with_env_overrides()),
        None => Ok(NerConfig::load().await),
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config).await?;

    match cli.command {
        Commands::Detect {
            texts,
            input,
            backend,
            pretty,
        } => detect::cmd_detect(&config, texts, input, backend.as_deref(), pretty).await,
        Commands::Check => check::cmd_check(&config).await,
    }
}
