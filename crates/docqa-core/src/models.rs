//! Core data models used throughout docqa.
//!
//! Documents and passages are owned by the [`DocumentIndex`](crate::index::DocumentIndex);
//! ranked candidates and answers are per-query values that are never stored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of an indexed document.
///
/// Generated from a random v4 UUID on every ingestion, so an identifier is
/// never reused, even after the document it named is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A window of consecutive sentences from one document.
///
/// `start_offset` and `end_offset` are character positions into the
/// owning document's cleaned text. They assume exactly one space between
/// sentences, which holds for text produced by [`clean`](crate::text::clean).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passage {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// A stored document with its cleaned text and derived passages.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    pub upload_time: DateTime<Utc>,
    pub full_text: String,
    pub passages: Vec<Passage>,
    pub sentence_count: usize,
    /// Length of `full_text` in characters.
    pub text_length: usize,
    /// SHA-256 of `full_text`, hex encoded.
    pub content_hash: String,
    /// Sentences per passage used when the document was ingested.
    pub window_size: usize,
}

impl Document {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            doc_id: self.id,
            filename: self.filename.clone(),
            upload_time: self.upload_time,
            text_length: self.text_length,
            sentence_count: self.sentence_count,
            passage_count: self.passages.len(),
            content_hash: self.content_hash.clone(),
        }
    }
}

/// Document metadata without the full text or passages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub doc_id: DocumentId,
    pub filename: String,
    pub upload_time: DateTime<Utc>,
    pub text_length: usize,
    pub sentence_count: usize,
    pub passage_count: usize,
    pub content_hash: String,
}

/// A passage paired with the document it came from, as returned by
/// [`DocumentIndex::all_passages`](crate::index::DocumentIndex::all_passages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPassage {
    pub document_id: DocumentId,
    pub passage: Passage,
}

/// Aggregate figures over the whole index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub total_text_length: usize,
    pub total_passage_count: usize,
    /// Mean text length per document; `0.0` for an empty index.
    pub average_document_size: f64,
}

/// A keyword hit from [`DocumentIndex::search`](crate::index::DocumentIndex::search).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordMatch {
    pub doc_id: DocumentId,
    pub filename: String,
    pub matches: usize,
}

/// A passage selected by the ranker for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub passage_text: String,
    /// Cosine similarity in `[0, 1]`.
    pub relevance_score: f64,
    /// Index of the passage in the ranked input slice.
    pub passage_index: usize,
}

/// The document an answer was found in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub filename: String,
}

/// One ranked answer for a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer_text: String,
    /// `w_similarity * similarity_score + w_extraction * extraction_score`.
    pub confidence_score: f64,
    pub similarity_score: f64,
    pub extraction_score: f64,
    pub source_passage: String,
    /// Owning document; `None` for ad-hoc text queries.
    pub source_document: Option<SourceDocument>,
    /// Index of the source passage in the candidate pool.
    pub position: usize,
    /// Character span of the answer inside `source_passage`.
    pub answer_start: usize,
    pub answer_end: usize,
    /// Character offsets of the passage inside its document's cleaned text.
    pub passage_start: usize,
    pub passage_end: usize,
}
