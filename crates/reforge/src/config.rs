//! TOML configuration parsing and validation.
//!
//! All runtime settings live in one TOML file (default:
//! `config/reforge.toml`). [`load_config`] parses it and rejects
//! configurations that would fail later in a confusing place, such as a
//! zero embedding dimension or an empty retrieval depth.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where durable state lives: the SQLite analysis database, the vector
/// index files, and exported archives.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("reforge.db")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

/// Chat-completion settings shared by the analyzer, summarizer,
/// architect, generators, and refiner.
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            max_retries: 5,
            timeout_secs: 120,
        }
    }
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}
fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyzerConfig {
    /// Source files longer than this are summarized before analysis.
    #[serde(default = "default_summarize_threshold")]
    pub summarize_threshold_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            summarize_threshold_chars: default_summarize_threshold(),
        }
    }
}

fn default_summarize_threshold() -> usize {
    15_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Consecutive refine attempts allowed before giving up.
    #[serde(default = "default_max_refine_attempts")]
    pub max_refine_attempts: u32,
    /// Skip build validation entirely and package straight away.
    #[serde(default)]
    pub skip_validation: bool,
    /// Substituted into generated settings files when present.
    #[serde(default)]
    pub connection_string: Option<String>,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_refine_attempts: default_max_refine_attempts(),
            skip_validation: false,
            connection_string: None,
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_max_refine_attempts() -> u32 {
    3
}
fn default_cache_capacity() -> usize {
    1024
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BuilderConfig {
    /// Shell command run against the materialized file set, e.g.
    /// `dotnet build`. Unset means validation cannot run.
    #[serde(default)]
    pub command: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if config.analyzer.summarize_threshold_chars == 0 {
        anyhow::bail!("analyzer.summarize_threshold_chars must be > 0");
    }

    if config.generation.cache_capacity == 0 {
        anyhow::bail!("generation.cache_capacity must be >= 1");
    }

    if !config.generation.skip_validation && config.builder.command.is_none() {
        anyhow::bail!(
            "builder.command must be set unless generation.skip_validation is true"
        );
    }

    Ok(())
}
