//! Answer fusion: rank, extract, merge scores.
//!
//! # Algorithm
//!
//! 1. Rank passages with [`Ranker::try_rank`] for up to `top_k` candidates.
//! 2. If ranking yields nothing while passages exist (degenerate
//!    vocabulary), fall back to the first `top_k` passages in order with a
//!    relevance score of `0`.
//! 3. Run the [`SpanExtractor`] on each candidate, with the context
//!    truncated to `max_context_chars`. Empty spans, zero scores and
//!    extractor failures drop that candidate only.
//! 4. `confidence = w_similarity × relevance + w_extraction × extraction`.
//! 5. Sort by confidence descending (stable), truncate to `top_k`.
//!
//! An empty result means "no extractable answer", not a failure.

use crate::error::{Error, Result};
use crate::models::{Answer, Passage, RankedCandidate};
use crate::rank::Ranker;
use crate::span::{SpanExtractor, DEFAULT_MAX_CONTEXT_CHARS};
use crate::text::truncate_chars;

/// Weights for combining relevance and extraction scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    similarity: f64,
    extraction: f64,
}

impl FusionWeights {
    /// # Errors
    ///
    /// [`Error::InvalidWeights`] unless both weights are finite and
    /// non-negative and `extraction > similarity`.
    pub fn new(similarity: f64, extraction: f64) -> Result<Self> {
        let valid = similarity.is_finite()
            && extraction.is_finite()
            && similarity >= 0.0
            && extraction > similarity;
        if !valid {
            return Err(Error::InvalidWeights {
                similarity,
                extraction,
            });
        }
        Ok(Self {
            similarity,
            extraction,
        })
    }

    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    pub fn extraction(&self) -> f64 {
        self.extraction
    }

    pub fn combine(&self, relevance: f64, extraction: f64) -> f64 {
        self.similarity * relevance + self.extraction * extraction
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            similarity: 0.2,
            extraction: 0.8,
        }
    }
}

/// Combines a [`Ranker`] and a [`SpanExtractor`] into ranked answers.
pub struct AnswerFuser<'a> {
    ranker: &'a Ranker,
    extractor: &'a dyn SpanExtractor,
    weights: FusionWeights,
    max_context_chars: usize,
}

impl<'a> AnswerFuser<'a> {
    pub fn new(ranker: &'a Ranker, extractor: &'a dyn SpanExtractor) -> Self {
        Self {
            ranker,
            extractor,
            weights: FusionWeights::default(),
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars.max(1);
        self
    }

    /// Answer `question` from `passages`, best first, at most `top_k`.
    ///
    /// `Answer::position` is the passage's index in `passages`;
    /// `source_document` is left `None` for the caller to fill in.
    pub fn fuse(&self, question: &str, passages: &[Passage], top_k: usize) -> Vec<Answer> {
        if passages.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let candidates = match self.ranker.try_rank(question, &texts, top_k) {
            Ok(ranked) if !ranked.is_empty() => ranked,
            Ok(_) => fallback_candidates(passages, top_k),
            Err(e) => {
                tracing::debug!(error = %e, "ranking failed; falling back to passage order");
                fallback_candidates(passages, top_k)
            }
        };

        let mut answers: Vec<Answer> = candidates
            .into_iter()
            .filter_map(|c| self.answer_candidate(question, &passages[c.passage_index], c))
            .collect();

        answers.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        answers.truncate(top_k);
        answers
    }

    fn answer_candidate(
        &self,
        question: &str,
        passage: &Passage,
        candidate: RankedCandidate,
    ) -> Option<Answer> {
        let context = truncate_chars(&candidate.passage_text, self.max_context_chars);
        let span = match self.extractor.extract(question, context) {
            Ok(Some(span)) => span,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    extractor = self.extractor.name(),
                    passage = candidate.passage_index,
                    error = %e,
                    "span extraction failed; skipping passage"
                );
                return None;
            }
        };

        if span.text.trim().is_empty() || span.score <= 0.0 || !span.score.is_finite() {
            return None;
        }
        let extraction_score = span.score.min(1.0);

        Some(Answer {
            confidence_score: self
                .weights
                .combine(candidate.relevance_score, extraction_score),
            answer_text: span.text,
            similarity_score: candidate.relevance_score,
            extraction_score,
            source_passage: candidate.passage_text,
            source_document: None,
            position: candidate.passage_index,
            answer_start: span.start,
            answer_end: span.end,
            passage_start: passage.start_offset,
            passage_end: passage.end_offset,
        })
    }
}

fn fallback_candidates(passages: &[Passage], top_k: usize) -> Vec<RankedCandidate> {
    passages
        .iter()
        .take(top_k)
        .enumerate()
        .map(|(i, p)| RankedCandidate {
            passage_text: p.text.clone(),
            relevance_score: 0.0,
            passage_index: i,
        })
        .collect()
}
