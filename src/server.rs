//! HTTP API for uploading documents and asking questions.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/documents/upload` | Upload a PDF, DOCX or TXT file (multipart field `file`) |
//! | `GET`  | `/api/documents/list` | List document summaries |
//! | `GET`  | `/api/documents/stats` | Index statistics |
//! | `POST` | `/api/documents/clear` | Remove every document |
//! | `GET`  | `/api/documents/search?keyword=` | Case-insensitive keyword search |
//! | `GET`  | `/api/documents/{id}` | Full document with passages |
//! | `DELETE` | `/api/documents/{id}` | Remove a document |
//! | `POST` | `/api/qa/ask` | Answer a question from the indexed corpus |
//! | `POST` | `/api/qa/ask-direct` | Answer a question from text in the request |
//! | `GET`  | `/api/qa/health` | Pipeline status |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `timeout` (408),
//! `payload_too_large` (413), `unprocessable` (422), `internal` (500).
//!
//! # Execution
//!
//! Question answering and file extraction are CPU-bound and may call a
//! blocking extractor, so they run on `spawn_blocking` under
//! `[server].query_timeout_secs`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, Path,
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};

use docqa_core::engine::QaEngine;
use docqa_core::models::{
    Answer, Document, DocumentId, DocumentSummary, IndexStats, KeywordMatch, SourceDocument,
};

use crate::config::Config;
use crate::extract::{extract_text, FileKind};
use crate::extractor::create_extractor;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<QaEngine>,
    config: Arc<Config>,
}

impl AppState {
    /// Build an empty engine with the configured extractor.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let extractor = create_extractor(&config.extractor)?;
        let engine = QaEngine::new(extractor, config.engine_settings()?)?;
        Ok(Self::with_engine(config, engine))
    }

    pub fn with_engine(config: &Config, engine: QaEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config.clone()),
        }
    }

    pub fn engine(&self) -> &QaEngine {
        &self.engine
    }
}

/// Build the router with every route, CORS and the upload size limit.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.server.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/api/documents/upload", post(handle_upload))
        .route("/api/documents/list", get(handle_list))
        .route("/api/documents/stats", get(handle_stats))
        .route("/api/documents/clear", post(handle_clear))
        .route("/api/documents/search", get(handle_search))
        .route(
            "/api/documents/{id}",
            get(handle_get_document).delete(handle_delete_document),
        )
        .route("/api/qa/ask", post(handle_ask))
        .route("/api/qa/ask-direct", post(handle_ask_direct))
        .route("/api/qa/health", get(handle_qa_health))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    let bind_addr = config.server.bind.clone();

    tracing::info!(
        bind = %bind_addr,
        extractor = state.engine.extractor_name(),
        "document QA server listening"
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code,
        message: message.into(),
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    app_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

fn not_found(message: impl Into<String>) -> AppError {
    app_error(StatusCode::NOT_FOUND, "not_found", message)
}

fn timeout_error(message: impl Into<String>) -> AppError {
    app_error(StatusCode::REQUEST_TIMEOUT, "timeout", message)
}

fn payload_too_large(message: impl Into<String>) -> AppError {
    app_error(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", message)
}

fn unprocessable(message: impl Into<String>) -> AppError {
    app_error(StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", message)
}

fn internal(message: impl Into<String>) -> AppError {
    app_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

impl From<docqa_core::Error> for AppError {
    fn from(err: docqa_core::Error) -> Self {
        use docqa_core::Error;
        match err {
            Error::NotFound(_) => not_found(err.to_string()),
            Error::EmptyDocument
            | Error::EmptyQuestion
            | Error::EmptyCorpus
            | Error::InvalidWindowSize(_)
            | Error::InvalidWeights { .. } => bad_request(err.to_string()),
        }
    }
}

/// Malformed or incomplete JSON bodies get the same error envelope as
/// every other bad request.
fn json_error(err: JsonRejection) -> AppError {
    bad_request(err.body_text())
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        payload_too_large(err.body_text())
    } else {
        bad_request(err.body_text())
    }
}

/// Run `work` against the engine on a blocking thread, bounded by the
/// configured query timeout.
async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&QaEngine) -> Result<T, AppError> + Send + 'static,
{
    let engine = state.engine.clone();
    let limit = Duration::from_secs(state.config.server.query_timeout_secs);
    let task = tokio::task::spawn_blocking(move || work(&engine));

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(internal(format!("worker failed: {}", e))),
        Err(_) => {
            tracing::warn!(limit_secs = limit.as_secs(), "request exceeded time limit");
            Err(timeout_error(format!(
                "request timed out after {}s",
                limit.as_secs()
            )))
        }
    }
}

fn parse_id(raw: &str) -> Result<DocumentId, AppError> {
    DocumentId::from_str(raw).map_err(|_| not_found(format!("document not found: {}", raw)))
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

// ============ Documents ============

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    doc_id: DocumentId,
    filename: String,
    text_length: usize,
    passage_count: usize,
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| bad_request("file field must carry a filename"))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes));
        break;
    }
    let (filename, bytes) =
        upload.ok_or_else(|| bad_request("multipart field 'file' is required"))?;

    let kind = FileKind::from_filename(&filename).ok_or_else(|| {
        bad_request(format!(
            "unsupported file type: {} (expected .pdf, .docx or .txt)",
            filename
        ))
    })?;
    let max = state.config.server.max_upload_bytes;
    if bytes.len() > max {
        return Err(payload_too_large(format!(
            "file is {} bytes; the limit is {} bytes",
            bytes.len(),
            max
        )));
    }
    if bytes.is_empty() {
        return Err(bad_request("uploaded file is empty"));
    }

    // Only extraction is time-bounded; a timed-out upload must leave the
    // index untouched.
    let text = run_blocking(&state, move |_| {
        extract_text(&bytes, kind).map_err(|e| unprocessable(e.to_string()))
    })
    .await?;

    let engine = state.engine.clone();
    let name = filename.clone();
    let document: Document = tokio::task::spawn_blocking(move || {
        let id = engine.ingest(&text, &name, None)?;
        engine.get(&id)
    })
    .await
    .map_err(|e| internal(format!("worker failed: {}", e)))??;

    Ok(Json(UploadResponse {
        message: "Document uploaded and processed successfully".to_string(),
        doc_id: document.id,
        filename,
        text_length: document.text_length,
        passage_count: document.passages.len(),
    }))
}

#[derive(Serialize)]
struct ListResponse {
    documents: Vec<DocumentSummary>,
    total_count: usize,
}

async fn handle_list(State(state): State<AppState>) -> Json<ListResponse> {
    let documents = state.engine.list();
    Json(ListResponse {
        total_count: documents.len(),
        documents,
    })
}

async fn handle_stats(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.engine.stats())
}

#[derive(Serialize)]
struct ClearResponse {
    message: String,
    cleared: usize,
}

async fn handle_clear(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.engine.index().len();
    state.engine.clear();
    tracing::info!(cleared, "cleared all documents");
    Json(ClearResponse {
        message: "All documents cleared".to_string(),
        cleared,
    })
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    keyword: String,
}

#[derive(Serialize)]
struct SearchResponse {
    keyword: String,
    results: Vec<KeywordMatch>,
    total_matches: usize,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let keyword = params.keyword.trim().to_string();
    if keyword.is_empty() {
        return Err(bad_request("keyword must not be empty"));
    }
    let results = state.engine.search(&keyword);
    Ok(Json(SearchResponse {
        keyword,
        total_matches: results.len(),
        results,
    }))
}

async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.engine.get(&id)?))
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,
    doc_id: DocumentId,
}

async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_id(&id)?;
    if !state.engine.remove(&id) {
        return Err(not_found(format!("document not found: {}", id)));
    }
    Ok(Json(DeleteResponse {
        message: "Document deleted".to_string(),
        doc_id: id,
    }))
}

// ============ Question answering ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Deserialize)]
struct AskDirectRequest {
    text: String,
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
}

/// An [`Answer`] with scores rounded for display.
#[derive(Serialize)]
struct AnswerResponse {
    answer_text: String,
    confidence_score: f64,
    similarity_score: f64,
    extraction_score: f64,
    source_passage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_document: Option<SourceDocument>,
    position: usize,
    answer_start: usize,
    answer_end: usize,
    passage_start: usize,
    passage_end: usize,
}

impl From<Answer> for AnswerResponse {
    fn from(a: Answer) -> Self {
        Self {
            answer_text: a.answer_text,
            confidence_score: round4(a.confidence_score),
            similarity_score: round4(a.similarity_score),
            extraction_score: round4(a.extraction_score),
            source_passage: a.source_passage,
            source_document: a.source_document,
            position: a.position,
            answer_start: a.answer_start,
            answer_end: a.answer_end,
            passage_start: a.passage_start,
            passage_end: a.passage_end,
        }
    }
}

#[derive(Serialize)]
struct AskResponse {
    question: String,
    answers: Vec<AnswerResponse>,
    /// Seconds spent answering.
    processing_time: f64,
}

fn check_top_k(top_k: Option<usize>) -> Result<Option<usize>, AppError> {
    match top_k {
        Some(0) => Err(bad_request("top_k must be >= 1")),
        other => Ok(other),
    }
}

fn ask_response(question: String, answers: Vec<Answer>, started: Instant) -> AskResponse {
    let elapsed = started.elapsed().as_secs_f64();
    tracing::info!(
        answers = answers.len(),
        elapsed_ms = (elapsed * 1000.0) as u64,
        "answered question"
    );
    AskResponse {
        question,
        answers: answers.into_iter().map(AnswerResponse::from).collect(),
        processing_time: round4(elapsed),
    }
}

async fn handle_ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let started = Instant::now();
    let Json(req) = payload.map_err(json_error)?;
    let top_k = check_top_k(req.top_k)?;
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let q = question.clone();
    let answers = run_blocking(&state, move |engine| Ok(engine.query_corpus(&q, top_k)?)).await?;

    Ok(Json(ask_response(question, answers, started)))
}

async fn handle_ask_direct(
    State(state): State<AppState>,
    payload: Result<Json<AskDirectRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let started = Instant::now();
    let Json(req) = payload.map_err(json_error)?;
    let top_k = check_top_k(req.top_k)?;
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let q = question.clone();
    let answers = run_blocking(&state, move |engine| {
        Ok(engine.query_text(&req.text, &q, top_k)?)
    })
    .await?;

    Ok(Json(ask_response(question, answers, started)))
}

#[derive(Serialize)]
struct QaHealthResponse {
    status: String,
    extractor: String,
    document_count: usize,
    window_size: usize,
    top_k: usize,
}

async fn handle_qa_health(State(state): State<AppState>) -> Json<QaHealthResponse> {
    let settings = state.engine.settings();
    Json(QaHealthResponse {
        status: "healthy".to_string(),
        extractor: state.engine.extractor_name().to_string(),
        document_count: state.engine.index().len(),
        window_size: settings.window_size,
        top_k: settings.top_k,
    })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
