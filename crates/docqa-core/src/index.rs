//! In-memory document index.
//!
//! Holds every ingested [`Document`] behind a single `std::sync::RwLock`.
//! Writers (`add`, `delete`, `clear`) take the write lock for the whole
//! mutation, so a reader never observes a document with a partially built
//! passage list. Readers receive owned snapshots; a query keeps working on
//! the passages it captured even if the index changes underneath it.
//!
//! Nothing is persisted: dropping the index drops every document.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::models::{
    Document, DocumentId, DocumentSummary, IndexStats, IndexedPassage, KeywordMatch, Passage,
};
use crate::text::char_len;
use crate::window::passages_for_text;

/// Default number of sentences per passage.
pub const DEFAULT_WINDOW_SIZE: usize = 3;

#[derive(Default)]
struct IndexState {
    docs: HashMap<DocumentId, Document>,
    /// Document ids in insertion order.
    order: Vec<DocumentId>,
}

impl IndexState {
    fn ordered(&self) -> impl Iterator<Item = &Document> {
        self.order.iter().filter_map(|id| self.docs.get(id))
    }
}

/// Registry of ingested documents and their passages.
pub struct DocumentIndex {
    state: RwLock<IndexState>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
        }
    }

    // A panic while holding the lock cannot leave the state half-written:
    // every mutation is a single insert/remove on already-built values.
    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clean, split and window `text`, then store it as a new document.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidWindowSize`] when `window_size == 0`.
    /// - [`Error::EmptyDocument`] when nothing remains after cleaning.
    pub fn add(&self, text: &str, filename: &str, window_size: usize) -> Result<DocumentId> {
        if window_size == 0 {
            return Err(Error::InvalidWindowSize(window_size));
        }

        let (full_text, sentence_count, passages) = passages_for_text(text, window_size);
        if full_text.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let content_hash = format!("{:x}", Sha256::digest(full_text.as_bytes()));
        let text_length = char_len(&full_text);

        // Built outside the lock; only the insert happens under it.
        let mut doc = Document {
            id: DocumentId::generate(),
            filename: filename.to_string(),
            upload_time: Utc::now(),
            full_text,
            passages,
            sentence_count,
            text_length,
            content_hash,
            window_size,
        };

        let mut state = self.write();
        while state.docs.contains_key(&doc.id) {
            doc.id = DocumentId::generate();
        }
        if state.docs.values().any(|d| d.content_hash == doc.content_hash) {
            tracing::warn!(
                filename = %doc.filename,
                hash = %doc.content_hash,
                "document content already indexed; storing a second copy"
            );
        }

        let id = doc.id;
        tracing::info!(
            doc_id = %id,
            filename = %doc.filename,
            sentences = doc.sentence_count,
            passages = doc.passages.len(),
            "indexed document"
        );
        state.order.push(id);
        state.docs.insert(id, doc);
        Ok(id)
    }

    /// Look up a document by id.
    pub fn get(&self, id: &DocumentId) -> Option<Document> {
        self.read().docs.get(id).cloned()
    }

    /// Remove a document. Returns whether it existed.
    pub fn delete(&self, id: &DocumentId) -> bool {
        let mut state = self.write();
        if state.docs.remove(id).is_none() {
            return false;
        }
        state.order.retain(|d| d != id);
        tracing::info!(doc_id = %id, "deleted document");
        true
    }

    /// Metadata for every document, in insertion order.
    pub fn list_all(&self) -> Vec<DocumentSummary> {
        self.read().ordered().map(Document::summary).collect()
    }

    /// Every passage of every document, in document insertion order and
    /// then passage order.
    pub fn all_passages(&self) -> Vec<IndexedPassage> {
        self.read()
            .ordered()
            .flat_map(|doc| {
                doc.passages.iter().map(|p| IndexedPassage {
                    document_id: doc.id,
                    passage: p.clone(),
                })
            })
            .collect()
    }

    /// Passages of a single document.
    pub fn passages(&self, id: &DocumentId) -> Option<Vec<Passage>> {
        self.read().docs.get(id).map(|d| d.passages.clone())
    }

    /// Cleaned full text of a single document.
    pub fn text(&self, id: &DocumentId) -> Option<String> {
        self.read().docs.get(id).map(|d| d.full_text.clone())
    }

    /// Filename of a single document.
    pub fn filename(&self, id: &DocumentId) -> Option<String> {
        self.read().docs.get(id).map(|d| d.filename.clone())
    }

    /// Case-insensitive substring search over document texts.
    ///
    /// Documents with at least one occurrence are returned, most matches
    /// first; equal counts keep insertion order.
    pub fn search(&self, keyword: &str) -> Vec<KeywordMatch> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<KeywordMatch> = self
            .read()
            .ordered()
            .filter_map(|doc| {
                let matches = doc.full_text.to_lowercase().matches(&needle).count();
                (matches > 0).then(|| KeywordMatch {
                    doc_id: doc.id,
                    filename: doc.filename.clone(),
                    matches,
                })
            })
            .collect();
        results.sort_by(|a, b| b.matches.cmp(&a.matches));
        results
    }

    /// Remove every document.
    pub fn clear(&self) {
        let mut state = self.write();
        let removed = state.docs.len();
        state.docs.clear();
        state.order.clear();
        tracing::info!(removed, "cleared index");
    }

    pub fn len(&self) -> usize {
        self.read().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn statistics(&self) -> IndexStats {
        let state = self.read();
        let document_count = state.docs.len();
        let total_text_length: usize = state.docs.values().map(|d| d.text_length).sum();
        let total_passage_count: usize = state.docs.values().map(|d| d.passages.len()).sum();
        let average_document_size = if document_count > 0 {
            total_text_length as f64 / document_count as f64
        } else {
            0.0
        };

        IndexStats {
            document_count,
            total_text_length,
            total_passage_count,
            average_document_size,
        }
    }
}

impl Default for DocumentIndex {
    fn default() -> Self {
        Self::new()
    }
}
