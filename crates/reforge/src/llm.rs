//! Chat-completion client and the LLM-backed pipeline collaborators.
//!
//! One [`ChatClient`] (OpenAI-compatible, reqwest + rustls) backs every
//! collaborator:
//!
//! | Type | Trait | Role |
//! |------|-------|------|
//! | [`LlmAnalyzer`] | `Analyzer` | source file → structured analysis |
//! | [`LlmSummarizer`] | `Summarizer` | long source → short summary |
//! | [`LlmArchitect`] | `Architect` | lean projection → architecture JSON |
//! | [`LlmGenerator`] | `Generator` | file spec + context → artifact text |
//! | [`LlmRefiner`] | `Refiner` | file set + errors → repaired file set |
//!
//! # Retry Strategy
//!
//! Same as the embedding client: HTTP 429 and 5xx retry with exponential
//! backoff (1s doubling, capped at 32s), other 4xx fail immediately.
//!
//! # Response Hygiene
//!
//! Models wrap JSON in markdown fences or chatter around it. [`clean_json`]
//! extracts the fenced block when present, otherwise the outermost
//! `{...}` span, before any structured parsing.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reforge_core::models::{
    ArtifactKind, FileAnalysis, GeneratedFiles, LeanProjection, TargetFileSpec,
};
use reforge_core::traits::{Analyzer, Architect, Generator, Refiner, Summarizer};

use crate::config::LlmConfig;

/// Sentinel returned when summarization fails; analysis proceeds with it.
pub const SUMMARY_FAILED: &str = "Error: Could not summarize code.";

/// Minimal OpenAI-compatible chat client.
///
/// Requires the `OPENAI_API_KEY` environment variable. The base URL is
/// configurable to support compatible gateways.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Run one system + user exchange and return the assistant text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return extract_message_content(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("chat API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("chat API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("chat completion failed after retries")))
    }
}

/// Pull `choices[0].message.content` out of a chat response.
fn extract_message_content(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing message content"))
}

/// Strip markdown fences and surrounding chatter from a JSON response.
///
/// Prefers a ```json fenced block; falls back to the span between the
/// first `{` and the last `}`; otherwise returns the trimmed input and
/// lets the parser report the failure.
pub fn clean_json(raw: &str) -> String {
    if let Some(fenced) = extract_fenced_block(raw) {
        return fenced.trim().to_string();
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return raw[start..=end].trim().to_string();
        }
    }

    raw.trim().to_string()
}

fn extract_fenced_block(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_open = &raw[open + 3..];
    // Skip an optional language tag on the fence line.
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

// ============ Analyzer ============

pub struct LlmAnalyzer {
    client: Arc<ChatClient>,
}

impl LlmAnalyzer {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Analyzer for LlmAnalyzer {
    async fn analyze(
        &self,
        file_name: &str,
        content: &str,
        features: &[String],
    ) -> Result<FileAnalysis> {
        let system = "You are an expert at analyzing legacy VB6 code for migration to .NET. \
            Respond with a single JSON object and nothing else, using the keys: \
            file, purpose, functionality, dependencies, controls, events, adoQueries.";
        let user = format!(
            "Analyze this legacy source file.\n\nFile name: {}\nDeclared API imports:\n{}\n\nSource:\n{}",
            file_name,
            features.join("\n"),
            content
        );

        let raw = self.client.complete(system, &user).await?;
        let mut analysis: FileAnalysis = serde_json::from_str(&clean_json(&raw))
            .with_context(|| format!("parse analysis for {}", file_name))?;

        // The model sometimes echoes a different name; the input wins.
        analysis.file_name = file_name.to_string();
        Ok(analysis)
    }
}

// ============ Summarizer ============

pub struct LlmSummarizer {
    client: Arc<ChatClient>,
}

impl LlmSummarizer {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, content: &str) -> String {
        let system = "You are an expert VB6 developer. Summarize the purpose, key \
            functions, and important logic of the given code. Provide a high-level \
            summary, not a line-by-line explanation.";

        match self.client.complete(system, content).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "summarization failed, using sentinel");
                SUMMARY_FAILED.to_string()
            }
        }
    }
}

// ============ Architect ============

pub struct LlmArchitect {
    client: Arc<ChatClient>,
}

impl LlmArchitect {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Architect for LlmArchitect {
    async fn propose(&self, projection: &LeanProjection) -> Result<serde_json::Value> {
        let system = "You are a .NET solution architect. Given an analysis of a legacy \
            application, propose a complete target project layout. Respond with a single \
            JSON object: { \"project_name\": string, \"files\": [ { \"file_path\": string, \
            \"type\": one of model|interface|service|worker|controller|view|config|program|csproj, \
            \"namespace\": string, \"dependencies\": [string], plus type-specific fields \
            (properties for models, methods for interfaces and services, description for \
            workers, uiComponents for views) } ] }.";
        let user = serde_json::to_string_pretty(projection).context("serialize projection")?;

        let raw = self.client.complete(system, &user).await?;
        serde_json::from_str(&clean_json(&raw)).context("parse architecture proposal")
    }
}

// ============ Generator registry ============

/// Dispatch table from artifact kind to its generator.
///
/// A spec whose kind has no registered generator is skipped with a
/// warning at generation time; it never fails the run.
pub struct GeneratorRegistry {
    generators: HashMap<ArtifactKind, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Registry with one LLM generator per generatable kind.
    pub fn with_llm(client: Arc<ChatClient>) -> Self {
        let mut registry = Self::new();
        for kind in [
            ArtifactKind::Model,
            ArtifactKind::Interface,
            ArtifactKind::Service,
            ArtifactKind::Worker,
            ArtifactKind::Controller,
            ArtifactKind::View,
        ] {
            registry.register(kind, Box::new(LlmGenerator::new(client.clone(), kind)));
        }
        registry
    }

    pub fn register(&mut self, kind: ArtifactKind, generator: Box<dyn Generator>) {
        self.generators.insert(kind, generator);
    }

    pub fn find(&self, kind: ArtifactKind) -> Option<&dyn Generator> {
        self.generators.get(&kind).map(|g| g.as_ref())
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// LLM generator for one artifact kind.
pub struct LlmGenerator {
    client: Arc<ChatClient>,
    kind: ArtifactKind,
}

impl LlmGenerator {
    pub fn new(client: Arc<ChatClient>, kind: ArtifactKind) -> Self {
        Self { client, kind }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, spec: &TargetFileSpec, context: &str) -> Result<String> {
        let system = format!(
            "You are an expert .NET developer. Generate the complete content of one {} \
             file for a migrated application. Respond with raw file content only, no \
             markdown fences, no commentary.",
            self.kind
        );
        let spec_json = serde_json::to_string_pretty(spec).context("serialize file spec")?;
        let user = format!(
            "Target file specification:\n{}\n\nRelevant context from the legacy analysis:\n{}",
            spec_json, context
        );

        let raw = self.client.complete(&system, &user).await?;
        // Some models fence code anyway.
        Ok(strip_code_fence(&raw))
    }
}

/// Remove a surrounding markdown code fence if the whole payload is fenced.
fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    match extract_fenced_block(trimmed) {
        Some(body) => body.trim().to_string(),
        None => trimmed.to_string(),
    }
}

// ============ Refiner ============

pub struct LlmRefiner {
    client: Arc<ChatClient>,
}

impl LlmRefiner {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Refiner for LlmRefiner {
    async fn refine(&self, files: &GeneratedFiles, errors: &[String]) -> Result<GeneratedFiles> {
        let system = "You are an expert .NET developer fixing build errors in a generated \
            project. Respond with a single JSON object mapping every file path to its \
            complete corrected content. Include all files, changed or not.";
        let user = format!(
            "Build errors:\n{}\n\nCurrent files:\n{}",
            errors.join("\n"),
            serde_json::to_string_pretty(files).context("serialize file set")?
        );

        let raw = self.client.complete(system, &user).await?;
        serde_json::from_str(&clean_json(&raw)).context("parse refined file set")
    }
}
