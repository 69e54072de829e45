//! Sentence-window passage builder.
//!
//! Groups consecutive sentences into overlapping fixed-size [`Passage`]s.
//! Consecutive windows share `window_size - 1` sentences, so every
//! sentence appears near the middle of at least one passage instead of
//! only straddling a boundary.
//!
//! # Algorithm
//!
//! 1. For each start index `i` in `0..=len(sentences) - window_size`, join
//!    sentences `[i, i + window_size)` with a single space.
//! 2. `start_offset` of window `i` is the sum of `chars(sentence) + 1` over
//!    all sentences before `i` (the `+ 1` is the joining space).
//! 3. `end_offset = start_offset + chars(passage)`.
//! 4. Fewer sentences than `window_size` yields no passages.
//!
//! Offsets are exact for text produced by [`clean`](crate::text::clean)
//! and approximate for anything else; they are not positions in the raw
//! extracted file.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::text::split_sentences;
//! use docqa_core::window::window_passages;
//!
//! let sentences = split_sentences("The sky is blue. Water is wet. Grass is green.");
//! let passages = window_passages(&sentences, 2);
//! assert_eq!(passages.len(), 2);
//! assert_eq!(passages[0].text, "The sky is blue. Water is wet.");
//! assert_eq!(passages[1].text, "Water is wet. Grass is green.");
//! assert_eq!(passages[1].start_offset, 17);
//! ```

use crate::models::Passage;
use crate::text::{char_len, clean, split_sentences};

/// Build overlapping passages of `window_size` sentences.
///
/// Produces exactly `max(0, sentences.len() - window_size + 1)` passages.
/// A `window_size` of `0` produces nothing; callers validate it first.
pub fn window_passages<S: AsRef<str>>(sentences: &[S], window_size: usize) -> Vec<Passage> {
    if window_size == 0 || sentences.len() < window_size {
        return Vec::new();
    }

    let lengths: Vec<usize> = sentences.iter().map(|s| char_len(s.as_ref())).collect();
    let mut passages = Vec::with_capacity(sentences.len() - window_size + 1);
    let mut start_offset = 0;

    for i in 0..=sentences.len() - window_size {
        if i > 0 {
            start_offset += lengths[i - 1] + 1;
        }
        let text = sentences[i..i + window_size]
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(" ");
        let end_offset = start_offset + char_len(&text);
        passages.push(Passage {
            text,
            start_offset,
            end_offset,
        });
    }

    passages
}

/// Clean `raw`, split it into sentences and window them.
///
/// Returns the cleaned text, its sentence count and the passages.
pub fn passages_for_text(raw: &str, window_size: usize) -> (String, usize, Vec<Passage>) {
    let text = clean(raw);
    let sentences = split_sentences(&text);
    let passages = window_passages(&sentences, window_size);
    (text, sentences.len(), passages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Sentence number {}.", i)).collect()
    }

    #[test]
    fn test_passage_count_formula() {
        for n in 0..8 {
            for w in 1..5 {
                let expected = if n >= w { n - w + 1 } else { 0 };
                assert_eq!(
                    window_passages(&sentences(n), w).len(),
                    expected,
                    "n={} w={}",
                    n,
                    w
                );
            }
        }
    }

    #[test]
    fn test_zero_window_yields_nothing() {
        assert!(window_passages(&sentences(3), 0).is_empty());
    }

    #[test]
    fn test_short_document_yields_no_passages() {
        let (text, count, passages) = passages_for_text("Only one sentence here.", 3);
        assert_eq!(text, "Only one sentence here.");
        assert_eq!(count, 1);
        assert!(passages.is_empty());
    }

    #[test]
    fn test_offsets_slice_cleaned_text() {
        let raw = "Alpha one.\n\nBeta   two!  Gamma three? Delta four. Epsilon five.";
        let (text, _, passages) = passages_for_text(raw, 3);
        let chars: Vec<char> = text.chars().collect();
        assert_eq!(passages.len(), 3);
        for p in &passages {
            assert!(p.start_offset <= p.end_offset);
            assert!(p.end_offset <= chars.len());
            let slice: String = chars[p.start_offset..p.end_offset].iter().collect();
            assert_eq!(slice, p.text);
        }
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        let (text, _, passages) = passages_for_text("Café crème. Über alles. Fin.", 1);
        assert_eq!(passages[1].text, "Über alles.");
        assert_eq!(passages[1].start_offset, 12);
        assert_eq!(passages[2].end_offset, char_len(&text));
    }

    #[test]
    fn test_consecutive_windows_overlap() {
        let passages = window_passages(&sentences(4), 3);
        assert_eq!(passages.len(), 2);
        assert!(passages[0].text.ends_with("Sentence number 2."));
        assert!(passages[1].text.starts_with("Sentence number 1."));
    }
}
