//! `docqa passages`: show how a file is cut into passages.

use anyhow::{bail, Result};
use std::path::Path;

use docqa_core::models::Passage;
use docqa_core::window::passages_for_text;

use crate::ask::read_document;
use crate::config::Config;

/// Extract `path` and window its cleaned text.
///
/// Returns the filename, the sentence count and the passages.
pub fn file_passages(
    config: &Config,
    path: &Path,
    window_size: Option<usize>,
) -> Result<(String, usize, Vec<Passage>)> {
    let window = window_size.unwrap_or(config.passages.window_size);
    if window == 0 {
        bail!("--window-size must be >= 1");
    }
    let (filename, raw) = read_document(path)?;
    let (text, sentence_count, passages) = passages_for_text(&raw, window);
    if text.is_empty() {
        bail!("{} contains no text", filename);
    }
    Ok((filename, sentence_count, passages))
}

/// CLI entry point: print each passage with its character offsets.
pub fn run_passages(config: &Config, path: &Path, window_size: Option<usize>) -> Result<()> {
    let (filename, sentence_count, passages) = file_passages(config, path, window_size)?;

    println!("--- {} ---", filename);
    println!("sentences: {}", sentence_count);
    println!("passages:  {}", passages.len());
    println!();

    for (i, p) in passages.iter().enumerate() {
        println!("[passage {}] chars {}..{}", i, p.start_offset, p.end_offset);
        println!("{}", p.text);
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_passages_with_window_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sky.txt");
        std::fs::write(&path, "The sky is blue. Water is wet. Grass is green.").unwrap();

        let (filename, count, passages) =
            file_passages(&Config::default(), &path, Some(2)).unwrap();
        assert_eq!(filename, "sky.txt");
        assert_eq!(count, 3);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[1].start_offset, 17);
    }

    #[test]
    fn test_blank_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, "  \n\t ").unwrap();
        assert!(file_passages(&Config::default(), &path, None).is_err());
    }
}
