//! The question-answering engine.
//!
//! [`QaEngine`] owns a [`DocumentIndex`] and a [`SpanExtractor`] and
//! exposes the operations used by the server and CLI: ingest, corpus and
//! ad-hoc queries, and index management.
//!
//! Queries capture the passage list once at their start; concurrent
//! ingestion or deletion does not affect a query already running.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fuse::{AnswerFuser, FusionWeights};
use crate::index::{DocumentIndex, DEFAULT_WINDOW_SIZE};
use crate::models::{
    Answer, Document, DocumentId, DocumentSummary, IndexStats, KeywordMatch, Passage,
    SourceDocument,
};
use crate::rank::{Ranker, DEFAULT_MAX_FEATURES};
use crate::span::{SpanExtractor, DEFAULT_MAX_CONTEXT_CHARS};
use crate::text::{clean, split_sentences};
use crate::window::window_passages;

/// Default number of answers per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Tunable engine parameters.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub window_size: usize,
    pub top_k: usize,
    pub max_features: usize,
    pub max_context_chars: usize,
    pub weights: FusionWeights,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            top_k: DEFAULT_TOP_K,
            max_features: DEFAULT_MAX_FEATURES,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            weights: FusionWeights::default(),
        }
    }
}

pub struct QaEngine {
    index: DocumentIndex,
    extractor: Arc<dyn SpanExtractor>,
    ranker: Ranker,
    settings: EngineSettings,
}

impl QaEngine {
    /// # Errors
    ///
    /// [`Error::InvalidWindowSize`] when the default window size is `0`.
    pub fn new(extractor: Arc<dyn SpanExtractor>, settings: EngineSettings) -> Result<Self> {
        if settings.window_size == 0 {
            return Err(Error::InvalidWindowSize(0));
        }
        Ok(Self {
            index: DocumentIndex::new(),
            extractor,
            ranker: Ranker::new(settings.max_features),
            settings,
        })
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    /// Store a document. `window_size` defaults to the configured size.
    pub fn ingest(
        &self,
        text: &str,
        filename: &str,
        window_size: Option<usize>,
    ) -> Result<DocumentId> {
        self.index.add(
            text,
            filename,
            window_size.unwrap_or(self.settings.window_size),
        )
    }

    /// Answer `question` from every indexed passage.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyQuestion`] for a blank question.
    /// - [`Error::EmptyCorpus`] when the index holds no passages.
    pub fn query_corpus(&self, question: &str, top_k: Option<usize>) -> Result<Vec<Answer>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let snapshot = self.index.all_passages();
        if snapshot.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let passages: Vec<Passage> = snapshot.iter().map(|p| p.passage.clone()).collect();
        let mut answers = self.fuser().fuse(
            question,
            &passages,
            top_k.unwrap_or(self.settings.top_k),
        );

        for answer in &mut answers {
            let owner = snapshot[answer.position].document_id;
            // A document deleted mid-query keeps its answer but loses its name.
            answer.source_document = Some(SourceDocument {
                id: owner,
                filename: self
                    .index
                    .filename(&owner)
                    .unwrap_or_else(|| "Unknown".to_string()),
            });
        }

        tracing::debug!(
            passages = passages.len(),
            answers = answers.len(),
            "answered corpus query"
        );
        Ok(answers)
    }

    /// Answer `question` from ad-hoc text without touching the index.
    ///
    /// Text shorter than one window is treated as a single window of all
    /// its sentences, so any non-empty text yields a passage.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyQuestion`] or [`Error::EmptyDocument`].
    pub fn query_text(
        &self,
        raw_text: &str,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<Answer>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let text = clean(raw_text);
        if text.is_empty() {
            return Err(Error::EmptyDocument);
        }
        let sentences = split_sentences(&text);
        let window = self.settings.window_size.min(sentences.len()).max(1);
        let passages = window_passages(&sentences, window);

        Ok(self
            .fuser()
            .fuse(question, &passages, top_k.unwrap_or(self.settings.top_k)))
    }

    pub fn remove(&self, id: &DocumentId) -> bool {
        self.index.delete(id)
    }

    pub fn get(&self, id: &DocumentId) -> Result<Document> {
        self.index
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn stats(&self) -> IndexStats {
        self.index.statistics()
    }

    pub fn list(&self) -> Vec<DocumentSummary> {
        self.index.list_all()
    }

    pub fn search(&self, keyword: &str) -> Vec<KeywordMatch> {
        self.index.search(keyword)
    }

    pub fn clear(&self) {
        self.index.clear()
    }

    fn fuser(&self) -> AnswerFuser<'_> {
        AnswerFuser::new(&self.ranker, self.extractor.as_ref())
            .with_weights(self.settings.weights)
            .with_max_context_chars(self.settings.max_context_chars)
    }
}
