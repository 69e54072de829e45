use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use docqa_core::engine::EngineSettings;
use docqa_core::fuse::FusionWeights;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub passages: PassageConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            query_timeout_secs: default_query_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_query_timeout_secs() -> u64 {
    60
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct PassageConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl Default for PassageConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

fn default_window_size() -> usize {
    docqa_core::index::DEFAULT_WINDOW_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f64,
    #[serde(default = "default_extraction_weight")]
    pub extraction_weight: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_features: default_max_features(),
            similarity_weight: default_similarity_weight(),
            extraction_weight: default_extraction_weight(),
        }
    }
}

fn default_top_k() -> usize {
    docqa_core::engine::DEFAULT_TOP_K
}
fn default_max_features() -> usize {
    docqa_core::rank::DEFAULT_MAX_FEATURES
}
fn default_similarity_weight() -> f64 {
    0.2
}
fn default_extraction_weight() -> f64 {
    0.8
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    /// `"lexical"` or `"http"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Question-answering endpoint, required for `"http"`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Model name reported by `/api/qa/health`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: None,
            model: None,
            max_context_chars: default_max_context_chars(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "lexical".to_string()
}
fn default_max_context_chars() -> usize {
    docqa_core::span::DEFAULT_MAX_CONTEXT_CHARS
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}

impl Config {
    /// Engine parameters derived from `[passages]`, `[retrieval]` and `[extractor]`.
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let weights = FusionWeights::new(
            self.retrieval.similarity_weight,
            self.retrieval.extraction_weight,
        )?;
        Ok(EngineSettings {
            window_size: self.passages.window_size,
            top_k: self.retrieval.top_k,
            max_features: self.retrieval.max_features,
            max_context_chars: self.extractor.max_context_chars,
            weights,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.query_timeout_secs == 0 {
            bail!("server.query_timeout_secs must be >= 1");
        }
        if self.passages.window_size == 0 {
            bail!("passages.window_size must be >= 1");
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be >= 1");
        }
        if self.retrieval.max_features == 0 {
            bail!("retrieval.max_features must be >= 1");
        }
        FusionWeights::new(
            self.retrieval.similarity_weight,
            self.retrieval.extraction_weight,
        )
        .with_context(|| "retrieval.extraction_weight must exceed retrieval.similarity_weight")?;
        if self.extractor.max_context_chars == 0 {
            bail!("extractor.max_context_chars must be >= 1");
        }

        match self.extractor.provider.as_str() {
            "lexical" => {}
            "http" => {
                if self.extractor.endpoint.is_none() {
                    bail!("extractor.endpoint must be specified when provider is 'http'");
                }
            }
            other => bail!(
                "Unknown extractor provider: '{}'. Must be lexical or http.",
                other
            ),
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
