//! # docqa Core
//!
//! Retrieval-and-answer-ranking logic for docqa: text normalization,
//! sentence-window passages, the in-memory document index, TF-IDF passage
//! ranking, and the fusion of relevance and extraction scores.
//!
//! This crate contains no async runtime, network, or filesystem
//! dependencies. File-format parsing and model-backed span extraction
//! live in the `docqa` application crate; the span extractor is consumed
//! here through the [`span::SpanExtractor`] trait.
//!
//! ## Pipeline
//!
//! ```text
//! raw text ─▶ text::clean ─▶ text::split_sentences ─▶ window::window_passages
//!                                                          │
//!                                                          ▼
//!   question ─▶ rank::Ranker ◀── index::DocumentIndex::all_passages
//!                    │
//!                    ▼
//!             fuse::AnswerFuser ─▶ span::SpanExtractor ─▶ ranked answers
//! ```
//!
//! [`engine::QaEngine`] ties the stages together and exposes the
//! operations used by the server and CLI.

pub mod engine;
pub mod error;
pub mod fuse;
pub mod index;
pub mod models;
pub mod rank;
pub mod span;
pub mod text;
pub mod window;

pub use error::{Error, Result};
