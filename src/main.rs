//! # docqa CLI
//!
//! The `docqa` binary serves the HTTP API and answers one-off questions
//! from the command line.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa serve` | Start the HTTP server |
//! | `docqa ask "<question>" --file <path>...` | Answer from files |
//! | `docqa ask "<question>" --text "<text>"` | Answer from inline text |
//! | `docqa passages <file>` | Print a file's passages with offsets |
//!
//! ## Examples
//!
//! ```bash
//! docqa --config ./config/docqa.toml serve
//! docqa ask "Who wrote the report?" --file report.pdf --file notes.docx
//! docqa ask "What is the capital of France?" --text "Paris is the capital of France."
//! docqa passages handbook.txt --window-size 2
//! ```
//!
//! Logs go to stderr and honour `RUST_LOG` (default `info`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docqa::ask::{self, AskSource};
use docqa::config::{self, Config};
use docqa::{passages, server};

/// docqa: ask questions about your documents.
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa: extractive question answering over PDF, DOCX and TXT documents",
    version
)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve,

    /// Answer a question from files or inline text.
    ///
    /// Files are indexed into a fresh in-memory index for this run only.
    Ask {
        /// The question to answer.
        question: String,

        /// Document to search (.pdf, .docx or .txt). Repeatable.
        #[arg(long = "file", conflicts_with = "text", required_unless_present = "text")]
        files: Vec<PathBuf>,

        /// Answer from this text instead of files.
        #[arg(long)]
        text: Option<String>,

        /// Maximum number of answers.
        #[arg(long)]
        top_k: Option<usize>,

        /// Sentences per passage.
        #[arg(long)]
        window_size: Option<usize>,
    },

    /// Print the passages a file is split into.
    Passages {
        /// Document to split (.pdf, .docx or .txt).
        file: PathBuf,

        /// Sentences per passage.
        #[arg(long)]
        window_size: Option<usize>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };

    // The pipeline may call a blocking HTTP extractor, so one-shot commands
    // run off the async runtime.
    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Ask {
            question,
            files,
            text,
            top_k,
            window_size,
        } => {
            let source = match text {
                Some(text) => AskSource::Text(text),
                None => AskSource::Files(files),
            };
            tokio::task::spawn_blocking(move || {
                ask::run_ask(&cfg, &question, source, top_k, window_size)
            })
            .await
            .context("ask task failed")??;
        }
        Commands::Passages { file, window_size } => {
            tokio::task::spawn_blocking(move || {
                passages::run_passages(&cfg, &file, window_size)
            })
            .await
            .context("passages task failed")??;
        }
    }

    Ok(())
}
