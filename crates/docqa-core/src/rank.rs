//! TF-IDF passage ranking.
//!
//! Builds a term-frequency / inverse-document-frequency vector space over
//! `{question} ∪ passages`, then scores each passage by cosine similarity
//! to the question.
//!
//! # Scoring
//!
//! 1. Tokenize case-insensitively: runs of two or more alphanumeric (or
//!    `_`) characters. English stop words are dropped.
//! 2. Keep the `max_features` terms with the highest total count across
//!    the corpus (ties by term, ascending).
//! 3. `idf(t) = ln((1 + n) / (1 + df(t))) + 1` where `n` counts the
//!    question and every passage.
//! 4. Each vector is `tf × idf`, L2-normalized; the score is the dot
//!    product, clamped to `[0, 1]`.
//! 5. Sort by score descending, stable on ties, and keep `top_k`.
//!
//! Low scores are not filtered out: a passage with score `0` can still be
//! returned so the extraction stage always has candidates.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use thiserror::Error;

use crate::models::RankedCandidate;

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 500;

/// Vectorization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("empty vocabulary: every term is a stop word or too short")]
    EmptyVocabulary,
}

/// Lexical relevance ranker.
#[derive(Debug, Clone)]
pub struct Ranker {
    max_features: usize,
}

impl Ranker {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features: max_features.max(1),
        }
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Rank passages, turning a vectorization failure into an empty list.
    pub fn rank(&self, question: &str, passages: &[&str], top_k: usize) -> Vec<RankedCandidate> {
        match self.try_rank(question, passages, top_k) {
            Ok(ranked) => ranked,
            Err(e) => {
                tracing::debug!(error = %e, "passage ranking produced no candidates");
                Vec::new()
            }
        }
    }

    /// Rank passages, reporting vectorization failure explicitly.
    ///
    /// An empty `passages` slice returns `Ok(vec![])` without vectorizing.
    pub fn try_rank(
        &self,
        question: &str,
        passages: &[&str],
        top_k: usize,
    ) -> Result<Vec<RankedCandidate>, RankError> {
        if passages.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let docs: Vec<Vec<String>> = std::iter::once(question)
            .chain(passages.iter().copied())
            .map(tokenize)
            .collect();

        let vocab = self.build_vocabulary(&docs);
        if vocab.is_empty() {
            return Err(RankError::EmptyVocabulary);
        }

        let idf = inverse_document_frequency(&docs, &vocab);
        let vectors: Vec<Vec<f64>> = docs
            .iter()
            .map(|tokens| tfidf_vector(tokens, &vocab, &idf))
            .collect();

        let query = &vectors[0];
        let mut scored: Vec<(usize, f64)> = vectors[1..]
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(query, v).clamp(0.0, 1.0)))
            .collect();

        // `sort_by` is stable, so equal scores keep passage order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| RankedCandidate {
                passage_text: passages[i].to_string(),
                relevance_score: score,
                passage_index: i,
            })
            .collect())
    }

    fn build_vocabulary(&self, docs: &[Vec<String>]) -> HashMap<String, usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tokens in docs {
            for t in tokens {
                *counts.entry(t.as_str()).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(&str, usize)> = counts.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(self.max_features);

        let mut kept: Vec<&str> = terms.into_iter().map(|(t, _)| t).collect();
        kept.sort_unstable();
        kept.into_iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect()
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

/// Lowercase, split into word tokens of at least two characters, and drop
/// English stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2 && !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

fn inverse_document_frequency(docs: &[Vec<String>], vocab: &HashMap<String, usize>) -> Vec<f64> {
    let mut df = vec![0usize; vocab.len()];
    for tokens in docs {
        let seen: HashSet<usize> = tokens.iter().filter_map(|t| vocab.get(t).copied()).collect();
        for i in seen {
            df[i] += 1;
        }
    }
    let n = docs.len() as f64;
    df.into_iter()
        .map(|d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
        .collect()
}

fn tfidf_vector(tokens: &[String], vocab: &HashMap<String, usize>, idf: &[f64]) -> Vec<f64> {
    let mut v = vec![0.0; vocab.len()];
    for t in tokens {
        if let Some(&i) = vocab.get(t) {
            v[i] += 1.0;
        }
    }
    for (x, w) in v.iter_mut().zip(idf) {
        *x *= w;
    }
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn is_stop_word(token: &str) -> bool {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
        .contains(token)
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_passages_returns_empty() {
        let r = Ranker::default();
        assert!(r.rank("anything", &[], 3).is_empty());
        assert_eq!(r.try_rank("anything", &[], 3), Ok(Vec::new()));
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        assert_eq!(
            tokenize("What is the Capital of France? A x"),
            vec!["capital", "france"]
        );
    }

    #[test]
    fn test_most_relevant_passage_first() {
        let passages = [
            "Cats sleep most of the day.",
            "Paris is the capital of France.",
            "Berlin is a large city.",
        ];
        let ranked = Ranker::default().rank("What is the capital of France?", &passages, 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].passage_index, 1);
        assert!(ranked[0].relevance_score > 0.0);
        assert_eq!(ranked[1].relevance_score, 0.0);
    }

    #[test]
    fn test_scores_sorted_and_bounded() {
        let passages = [
            "rust ownership borrowing",
            "rust rust rust",
            "python garbage collection",
            "ownership rules in rust",
        ];
        let ranked = Ranker::default().rank("rust ownership", &passages, 10);
        assert_eq!(ranked.len(), passages.len());
        for w in ranked.windows(2) {
            assert!(w[0].relevance_score >= w[1].relevance_score);
        }
        for c in &ranked {
            assert!((0.0..=1.0).contains(&c.relevance_score));
        }
    }

    #[test]
    fn test_top_k_truncates() {
        let passages = ["alpha beta", "beta gamma", "gamma delta"];
        assert_eq!(Ranker::default().rank("beta", &passages, 2).len(), 2);
        assert!(Ranker::default().rank("beta", &passages, 0).is_empty());
    }

    #[test]
    fn test_ties_keep_passage_order() {
        let passages = ["zebra", "yak", "walrus"];
        let ranked = Ranker::default().rank("unrelated query", &passages, 3);
        let order: Vec<usize> = ranked.iter().map(|c| c.passage_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_vocabulary_is_reported() {
        let passages = ["the of and", "a an is"];
        assert_eq!(
            Ranker::default().try_rank("what is it", &passages, 3),
            Err(RankError::EmptyVocabulary)
        );
        assert!(Ranker::default().rank("what is it", &passages, 3).is_empty());
    }

    #[test]
    fn test_identical_text_scores_one() {
        let ranked = Ranker::default().rank("solar panels", &["solar panels"], 1);
        assert!((ranked[0].relevance_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_vocabulary_cap_limits_terms() {
        let r = Ranker::new(1);
        let passages = ["apple apple banana", "banana cherry"];
        let ranked = r.rank("cherry", &passages, 2);
        // All three terms occur twice; the tie-break keeps "apple".
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|c| c.relevance_score == 0.0));
    }
}
