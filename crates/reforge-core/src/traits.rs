//! Collaborator seams for the migration pipeline.
//!
//! Every external capability — embedding, analysis, summarization,
//! architecture proposal, artifact generation, build validation, and
//! refinement — sits behind one of these traits, enabling pluggable
//! backends and mock collaborators in tests.
//!
//! All operations are async (via `async-trait`) and implementations must
//! be `Send + Sync` to work with async runtimes.
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Embedder`] | Text → fixed-dimension vector |
//! | [`Analyzer`] | Source file → [`FileAnalysis`] |
//! | [`Summarizer`] | Long source text → short summary |
//! | [`Architect`] | [`LeanProjection`] → raw architecture JSON |
//! | [`Generator`] | [`TargetFileSpec`] + context → artifact text |
//! | [`ProjectBuilder`] | File mapping → [`ValidationOutcome`] |
//! | [`Refiner`] | File mapping + errors → replacement mapping |

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    FileAnalysis, GeneratedFiles, LeanProjection, TargetFileSpec, ValidationOutcome,
};

/// Embedding provider: turns text into fixed-length vectors.
///
/// Failures must propagate — a silently zeroed vector would poison every
/// later similarity query against it.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-large"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `3072`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single query text.
///
/// Convenience wrapper around [`Embedder::embed`] for single-text use
/// cases (e.g. embedding a retrieval query).
pub async fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let results = embedder.embed(&[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("empty embedding response"))
}

/// Produces a structured analysis of one source file.
///
/// A per-file failure is tolerated by the analyze stage: the file is
/// logged and skipped, never aborting the run.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        file_name: &str,
        content: &str,
        features: &[String],
    ) -> Result<FileAnalysis>;
}

/// Condenses source text that exceeds the analysis size threshold.
///
/// The surface is infallible: implementations return a sentinel
/// "could not summarize" string on failure rather than erroring, so an
/// oversized file degrades instead of aborting the stage.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, content: &str) -> String;
}

/// Proposes a target architecture from the lean analysis projection.
///
/// Returns the raw structured response; the caller validates it against
/// the [`TargetArchitecture`](crate::models::TargetArchitecture) schema
/// and treats a violation as fatal.
#[async_trait]
pub trait Architect: Send + Sync {
    async fn propose(&self, projection: &LeanProjection) -> Result<serde_json::Value>;
}

/// Produces the text of one target artifact from its spec and retrieved
/// context. One implementation per artifact kind.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, spec: &TargetFileSpec, context: &str) -> Result<String>;
}

/// Validates a generated file set, e.g. by compiling it.
#[async_trait]
pub trait ProjectBuilder: Send + Sync {
    async fn build(&self, files: &GeneratedFiles) -> Result<ValidationOutcome>;
}

/// Repairs a generated file set given build errors.
///
/// Returns a full replacement mapping, not a diff.
#[async_trait]
pub trait Refiner: Send + Sync {
    async fn refine(&self, files: &GeneratedFiles, errors: &[String]) -> Result<GeneratedFiles>;
}
