//! Span extractor backends.
//!
//! - **`lexical`**: [`LexicalExtractor`], deterministic and offline.
//! - **`http`**: [`HttpSpanExtractor`], posts each question/context pair to
//!   an extractive question-answering service.
//!
//! Use [`create_extractor`] to build the backend named in `[extractor]`.
//!
//! # Wire format
//!
//! ```text
//! POST <endpoint>
//! Authorization: Bearer $DOCQA_API_TOKEN     (only when set)
//! {"inputs": {"question": "...", "context": "..."}}
//!
//! 200 {"answer": "...", "score": 0.93, "start": 10, "end": 15}
//! ```
//!
//! A one-element array around the object is also accepted.
//!
//! # Retry Strategy
//!
//! - HTTP 429 and 5xx → retry
//! - HTTP 4xx (not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, ... (capped at 2^5)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use docqa_core::span::{LexicalExtractor, Span, SpanError, SpanExtractor};

use crate::config::ExtractorConfig;

/// Environment variable holding the optional bearer token.
pub const API_TOKEN_ENV: &str = "DOCQA_API_TOKEN";

/// Extractor backed by a remote question-answering endpoint.
///
/// Calls are blocking; async callers run the pipeline on a blocking
/// thread.
pub struct HttpSpanExtractor {
    endpoint: String,
    model: String,
    timeout: Duration,
    max_retries: u32,
    api_token: Option<String>,
}

#[derive(Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
struct QaResponse {
    answer: String,
    score: f64,
    #[serde(default)]
    start: usize,
    #[serde(default)]
    end: usize,
}

impl HttpSpanExtractor {
    /// # Errors
    ///
    /// Returns an error if `endpoint` is not set.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("extractor.endpoint required for http provider"))?;
        let model = config.model.clone().unwrap_or_else(|| endpoint.clone());
        let api_token = std::env::var(API_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            endpoint,
            model,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            api_token,
        })
    }

    fn call(&self, question: &str, context: &str) -> Result<Option<Span>, SpanError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| SpanError::Request(e.to_string()))?;

        let body = QaRequest {
            inputs: QaInputs { question, context },
        };

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                std::thread::sleep(delay);
            }

            let mut request = client.post(&self.endpoint).json(&body);
            if let Some(token) = &self.api_token {
                request = request.bearer_auth(token);
            }

            match request.send() {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .map_err(|e| SpanError::InvalidResponse(e.to_string()))?;
                        return parse_response(json);
                    }

                    let body_text = response.text().unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::debug!(%status, attempt, "extractor endpoint busy; retrying");
                        last_err = Some(SpanError::Request(format!(
                            "endpoint error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    return Err(SpanError::Request(format!(
                        "endpoint error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    last_err = Some(SpanError::Request(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| SpanError::Request("extraction failed after retries".to_string())))
    }
}

impl SpanExtractor for HttpSpanExtractor {
    fn name(&self) -> &str {
        &self.model
    }

    fn extract(&self, question: &str, context: &str) -> Result<Option<Span>, SpanError> {
        self.call(question, context)
    }
}

fn parse_response(json: serde_json::Value) -> Result<Option<Span>, SpanError> {
    let json = match json {
        serde_json::Value::Array(mut items) => {
            if items.is_empty() {
                return Ok(None);
            }
            items.swap_remove(0)
        }
        other => other,
    };
    let parsed: QaResponse =
        serde_json::from_value(json).map_err(|e| SpanError::InvalidResponse(e.to_string()))?;

    if parsed.answer.trim().is_empty() {
        return Ok(None);
    }
    if !parsed.score.is_finite() {
        return Err(SpanError::InvalidResponse(format!(
            "non-finite score {}",
            parsed.score
        )));
    }
    Ok(Some(Span {
        text: parsed.answer,
        score: parsed.score.clamp(0.0, 1.0),
        start: parsed.start,
        end: parsed.end,
    }))
}

/// Create the [`SpanExtractor`] named by `config.provider`.
///
/// | Config Value | Extractor |
/// |-------------|-----------|
/// | `"lexical"` | [`LexicalExtractor`] |
/// | `"http"` | [`HttpSpanExtractor`] |
pub fn create_extractor(config: &ExtractorConfig) -> Result<Arc<dyn SpanExtractor>> {
    match config.provider.as_str() {
        "lexical" => Ok(Arc::new(LexicalExtractor::new())),
        "http" => Ok(Arc::new(HttpSpanExtractor::new(config)?)),
        other => bail!("Unknown extractor provider: {}", other),
    }
}
