//! # docqa
//!
//! Document question answering: upload PDF, DOCX or TXT files, ask
//! natural-language questions, and get literal answer spans ranked by a
//! blend of lexical relevance and extractor confidence.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │ extract      │──▶│ docqa-core     │──▶│ span extractor    │
//! │ PDF/DOCX/TXT │   │ index + rank   │   │ lexical | http    │
//! └──────────────┘   └───────┬───────┘   └──────────────────┘
//!                            │
//!                  ┌─────────┴─────────┐
//!                  ▼                   ▼
//!             ┌──────────┐       ┌──────────┐
//!             │   CLI    │       │   HTTP   │
//!             │ (docqa)  │       │  (axum)  │
//!             └──────────┘       └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`ask`] | `docqa ask` one-shot question answering |
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | File-format text extraction |
//! | [`extractor`] | Span extractor construction and the HTTP backend |
//! | [`passages`] | `docqa passages` passage inspection |
//! | [`server`] | HTTP API |
//!
//! The windowing, index, ranking and fusion pipeline lives in the
//! `docqa-core` crate; depend on it directly for library use.
//!
//! Documents live in memory only and are lost when the process exits.

pub mod ask;
pub mod config;
pub mod extract;
pub mod extractor;
pub mod passages;
pub mod server;
