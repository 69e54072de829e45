//! Answer-span extraction contract.
//!
//! The extractive model lives outside this crate. It is consumed through
//! [`SpanExtractor`], whose result separates the three outcomes callers
//! must treat differently:
//!
//! | Result | Meaning |
//! |--------|---------|
//! | `Ok(Some(span))` | the model found an answer |
//! | `Ok(None)` | no answer in this context |
//! | `Err(SpanError)` | the collaborator failed for this context |
//!
//! [`LexicalExtractor`] is a deterministic, model-free implementation used
//! when no model service is configured and in tests.

use std::collections::HashSet;

use thiserror::Error;

use crate::rank::{is_stop_word, tokenize};
use crate::text::split_sentences;

/// Maximum context characters sent to an extractor.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 512;

/// An answer span found inside a context.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    /// Extractor confidence in `[0, 1]`.
    pub score: f64,
    /// Character offsets into the context.
    pub start: usize,
    pub end: usize,
}

/// Failure of an extraction collaborator for one context.
#[derive(Debug, Error)]
pub enum SpanError {
    #[error("extractor request failed: {0}")]
    Request(String),

    #[error("extractor returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Trait for extractive question-answering backends.
pub trait SpanExtractor: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &str;

    /// Find the span of `context` that answers `question`.
    fn extract(&self, question: &str, context: &str) -> Result<Option<Span>, SpanError>;
}

/// Overlap-based extractor.
///
/// Picks the sentence sharing the most content terms with the question and
/// answers with its longest run of words that are neither stop words nor
/// in the question (the whole sentence if there is none). The score is the fraction of
/// question content terms found in that sentence.
#[derive(Debug, Clone, Default)]
pub struct LexicalExtractor;

impl LexicalExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl SpanExtractor for LexicalExtractor {
    fn name(&self) -> &str {
        "lexical"
    }

    fn extract(&self, question: &str, context: &str) -> Result<Option<Span>, SpanError> {
        let terms: HashSet<String> = tokenize(question).into_iter().collect();
        if terms.is_empty() || context.trim().is_empty() {
            return Ok(None);
        }

        let mut best: Option<(usize, usize, usize)> = None;
        let mut cursor = 0;
        for sentence in split_sentences(context) {
            let Some(found) = context[cursor..].find(sentence.as_str()) else {
                continue;
            };
            let start = cursor + found;
            let end = start + sentence.len();
            cursor = end;

            let sentence_terms: HashSet<String> = tokenize(&sentence).into_iter().collect();
            let overlap = terms.intersection(&sentence_terms).count();
            if overlap > best.map(|b| b.2).unwrap_or(0) {
                best = Some((start, end, overlap));
            }
        }

        let Some((s_start, s_end, overlap)) = best else {
            return Ok(None);
        };

        let question_words: HashSet<String> = question
            .split_whitespace()
            .map(normalize_word)
            .filter(|w| !w.is_empty())
            .collect();
        let (a_start, a_end) = novel_run(&context[s_start..s_end], &question_words)
            .map(|(a, b)| (s_start + a, s_start + b))
            .unwrap_or((s_start, s_end));

        Ok(Some(Span {
            text: context[a_start..a_end].to_string(),
            score: overlap as f64 / terms.len() as f64,
            start: context[..a_start].chars().count(),
            end: context[..a_end].chars().count(),
        }))
    }
}

fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

/// Byte range of the longest run of non-stop words absent from `question_words`,
/// trimmed of surrounding punctuation.
fn novel_run(sentence: &str, question_words: &HashSet<String>) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;
    let mut run: Option<(usize, usize, usize)> = None;

    for (start, word) in word_spans(sentence) {
        let end = start + word.len();
        let normalized = normalize_word(word);
        if normalized.is_empty() || is_stop_word(&normalized) || question_words.contains(&normalized)
        {
            run = None;
            continue;
        }
        run = Some(match run {
            Some((s, _, n)) => (s, end, n + 1),
            None => (start, end, 1),
        });
        if let Some(r) = run {
            if r.2 > best.map(|b| b.2).unwrap_or(0) {
                best = run;
            }
        }
    }

    let (start, end, _) = best?;
    let piece = &sentence[start..end];
    let lead = piece.len() - piece.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
    let trimmed = piece.trim_end_matches(|c: char| !c.is_alphanumeric());
    Some((start + lead, start + trimmed.len()))
}

fn word_spans(s: &str) -> impl Iterator<Item = (usize, &str)> {
    s.split_whitespace()
        .map(move |w| (w.as_ptr() as usize - s.as_ptr() as usize, w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_novel_words() {
        let span = LexicalExtractor
            .extract(
                "What is the capital of France?",
                "Paris is the capital of France.",
            )
            .unwrap()
            .unwrap();
        assert_eq!(span.text, "Paris");
        assert_eq!((span.start, span.end), (0, 5));
        assert!((span.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_picks_best_sentence() {
        let context = "Dogs bark loudly. The river Nile flows through Egypt. Cats purr.";
        let span = LexicalExtractor
            .extract("Which river flows through Egypt?", context)
            .unwrap()
            .unwrap();
        assert_eq!(span.text, "Nile");
        let chars: Vec<char> = context.chars().collect();
        let slice: String = chars[span.start..span.end].iter().collect();
        assert_eq!(slice, span.text);
    }

    #[test]
    fn test_no_overlap_returns_none() {
        let out = LexicalExtractor
            .extract("Who invented radio?", "Bananas are yellow.")
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_stop_word_question_returns_none() {
        assert!(LexicalExtractor.extract("what is it", "It is.").unwrap().is_none());
    }

    #[test]
    fn test_all_words_in_question_falls_back_to_sentence() {
        let span = LexicalExtractor
            .extract("solar panels convert light", "Solar panels convert light.")
            .unwrap()
            .unwrap();
        assert_eq!(span.text, "Solar panels convert light.");
    }

    #[test]
    fn test_offsets_are_characters() {
        let context = "Über alles. Café serves crème brûlée daily.";
        let span = LexicalExtractor
            .extract("What does the café serve daily?", context)
            .unwrap()
            .unwrap();
        let chars: Vec<char> = context.chars().collect();
        let slice: String = chars[span.start..span.end].iter().collect();
        assert_eq!(slice, span.text);
        assert_eq!(span.text, "serves crème brûlée");
    }
}
