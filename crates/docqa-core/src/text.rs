//! Text normalization and sentence splitting.
//!
//! [`clean`] turns raw extracted text into a single line of
//! space-separated words; [`split_sentences`] cuts that line at sentence
//! punctuation. The sentence splitter is a heuristic: it is not locale- or
//! abbreviation-aware, so text such as `"U.S. law"` may be over-segmented.
//! That is an accepted approximation.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::text::{clean, split_sentences};
//!
//! let text = clean("The sky is blue.\n\n  Water\tis wet!");
//! assert_eq!(text, "The sky is blue. Water is wet!");
//! assert_eq!(split_sentences(&text), vec!["The sky is blue.", "Water is wet!"]);
//! ```

/// Normalize raw text.
///
/// Removes control characters (`U+0000..U+001F` and `U+007F`) that are not
/// whitespace, collapses every whitespace run to a single space, and trims
/// both ends. Control characters are dropped before whitespace is
/// collapsed so that `clean(clean(x)) == clean(x)`.
pub fn clean(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if is_stripped_control(c) {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }

    out
}

fn is_stripped_control(c: char) -> bool {
    (c < ' ' && !c.is_whitespace()) || c == '\u{7f}'
}

/// Split text into sentences.
///
/// A boundary is any whitespace run that immediately follows `.`, `!` or
/// `?`. Fragments are trimmed and empty fragments are discarded.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            push_trimmed(&mut sentences, &text[start..i]);
            while let Some(&(_, next)) = iter.peek() {
                if !next.is_whitespace() {
                    break;
                }
                iter.next();
            }
            start = iter.peek().map(|&(j, _)| j).unwrap_or(text.len());
            prev = None;
            continue;
        }
        prev = Some(c);
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed(out: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Length of `s` in characters (not bytes).
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Return at most the first `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
