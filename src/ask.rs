//! One-shot question answering from the command line.
//!
//! `docqa ask` builds a fresh in-memory index from the given files (or
//! answers directly from `--text`), prints the ranked answers and exits.
//! Nothing persists between runs.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use docqa_core::engine::QaEngine;
use docqa_core::models::Answer;

use crate::config::Config;
use crate::extract::extract_file;
use crate::extractor::create_extractor;

/// Where the question is answered from.
pub enum AskSource {
    Files(Vec<PathBuf>),
    Text(String),
}

/// Build an engine from `config`, overriding the window size if given.
pub fn build_engine(config: &Config, window_size: Option<usize>) -> Result<QaEngine> {
    let mut settings = config.engine_settings()?;
    if let Some(w) = window_size {
        if w == 0 {
            bail!("--window-size must be >= 1");
        }
        settings.window_size = w;
    }
    let extractor = create_extractor(&config.extractor)?;
    Ok(QaEngine::new(extractor, settings)?)
}

/// Read `path` and extract its text, choosing the decoder from its extension.
pub fn read_document(path: &Path) -> Result<(String, String)> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = extract_file(&bytes, &filename)
        .with_context(|| format!("Failed to extract text from {}", path.display()))?;
    Ok((filename, text))
}

/// Answer `question` and return the answers without printing.
pub fn answer(
    config: &Config,
    question: &str,
    source: &AskSource,
    top_k: Option<usize>,
    window_size: Option<usize>,
) -> Result<Vec<Answer>> {
    if top_k == Some(0) {
        bail!("--top-k must be >= 1");
    }
    let engine = build_engine(config, window_size)?;

    let answers = match source {
        AskSource::Text(text) => engine.query_text(text, question, top_k)?,
        AskSource::Files(paths) => {
            for path in paths {
                let (filename, text) = read_document(path)?;
                let id = engine
                    .ingest(&text, &filename, None)
                    .with_context(|| format!("Failed to index {}", path.display()))?;
                tracing::debug!(%id, file = %filename, "indexed");
            }
            engine.query_corpus(question, top_k)?
        }
    };
    Ok(answers)
}

/// CLI entry point: answer and print to stdout.
pub fn run_ask(
    config: &Config,
    question: &str,
    source: AskSource,
    top_k: Option<usize>,
    window_size: Option<usize>,
) -> Result<()> {
    let answers = answer(config, question, &source, top_k, window_size)?;

    if answers.is_empty() {
        println!("No answers found.");
        return Ok(());
    }

    for (i, a) in answers.iter().enumerate() {
        println!(
            "{}. {} (confidence: {:.4})",
            i + 1,
            a.answer_text,
            a.confidence_score
        );
        println!(
            "    similarity: {:.4}  extraction: {:.4}",
            a.similarity_score, a.extraction_score
        );
        if let Some(doc) = &a.source_document {
            println!(
                "    source: {} (passage {}, chars {}..{})",
                doc.filename, a.position, a.passage_start, a.passage_end
            );
        }
        println!("    passage: \"{}\"", a.source_passage);
        println!();
    }

    Ok(())
}
