//! Generate stage: retrieval-augmented generation, build validation,
//! bounded refinement, and packaging.
//!
//! Target files are produced in architecture order. Static templates win
//! over generation; otherwise retrieved context plus the file spec goes
//! to the kind-specific generator, with cache reuse when two specs
//! resolve to the same (path, context) key. Duplicate file paths
//! overwrite deterministically, later spec wins.
//!
//! Validation is a bounded loop: build, and on failure hand the full
//! file set plus errors to the refiner for a full replacement, at most
//! `max_refine_attempts` times. Fast mode skips the loop entirely.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use reforge_core::cache::cache_key;
use reforge_core::models::{ArtifactKind, GeneratedFiles, TargetArchitecture};
use reforge_core::templates;

use crate::error::{PipelineError, PipelineResult};
use crate::package;
use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateStatus {
    /// The final file set passed build validation.
    Validated,
    /// Validation was skipped; the archive is unchecked.
    Unvalidated,
}

#[derive(Debug)]
pub struct GenerateOutcome {
    pub archive_path: PathBuf,
    pub status: GenerateStatus,
    /// Target files skipped because no generator handles their kind.
    pub skipped: Vec<String>,
}

/// Run the generate stage for a stored analysis.
///
/// `architecture_override`, when given, replaces the stored architecture
/// wholesale for this run only; it is never persisted back.
/// `skip_validation` overrides the configured default when set.
pub async fn run_generate(
    pipeline: &Pipeline,
    analysis_id: &str,
    architecture_override: Option<serde_json::Value>,
    skip_validation: Option<bool>,
) -> PipelineResult<GenerateOutcome> {
    let record = pipeline
        .analysis_store
        .get(analysis_id)
        .await
        .map_err(PipelineError::Persistence)?
        .ok_or_else(|| PipelineError::NotFound(analysis_id.to_string()))?;

    let architecture = match architecture_override {
        Some(raw) => {
            info!("using caller-supplied architecture override");
            TargetArchitecture::from_value(raw).map_err(|e| PipelineError::Schema(e.to_string()))?
        }
        None => record.architecture,
    };

    let (files, skipped) = generate_files(pipeline, &architecture).await?;

    let skip = skip_validation.unwrap_or(pipeline.settings.skip_validation);
    let (files, status) = if skip {
        info!("validation skipped, packaging unchecked output");
        (files, GenerateStatus::Unvalidated)
    } else {
        let validated = validate_and_refine(pipeline, files).await?;
        (validated, GenerateStatus::Validated)
    };

    let archive_path = package::package(&pipeline.settings.exports_dir, analysis_id, &files)
        .map_err(PipelineError::Persistence)?;

    Ok(GenerateOutcome {
        archive_path,
        status,
        skipped,
    })
}

/// Produce the file mapping for an architecture.
async fn generate_files(
    pipeline: &Pipeline,
    architecture: &TargetArchitecture,
) -> PipelineResult<(GeneratedFiles, Vec<String>)> {
    let namespace = architecture.project_name.as_str();
    let connection_string = pipeline.settings.connection_string.as_deref();

    let mut files = GeneratedFiles::new();
    let mut skipped = Vec::new();

    for (i, spec) in architecture.files.iter().enumerate() {
        info!(
            step = i + 1,
            total = architecture.files.len(),
            file = %spec.file_path,
            kind = %spec.kind,
            "processing target file"
        );

        if let Some(template) = templates::lookup(spec) {
            let content = templates::render(template, namespace, connection_string);
            files.insert(spec.file_path.clone(), content);
            continue;
        }

        if spec.kind == ArtifactKind::Unknown {
            warn!(file = %spec.file_path, "no generator for artifact kind, skipping");
            skipped.push(spec.file_path.clone());
            continue;
        }

        let Some(generator) = pipeline.generators.find(spec.kind) else {
            warn!(file = %spec.file_path, kind = %spec.kind, "artifact kind not registered, skipping");
            skipped.push(spec.file_path.clone());
            continue;
        };

        let need = format!("{} {}", spec.kind, spec.file_path);
        let context = pipeline.retrieval.context_for(&need).await;
        let key = cache_key(&spec.file_path, &context);

        let cached = {
            let mut cache = pipeline.cache.lock().expect("generation cache poisoned");
            cache.get(&key)
        };

        let content = match cached {
            Some(hit) => {
                info!(file = %spec.file_path, "generation cache hit");
                hit
            }
            None => {
                let generated = generator
                    .generate(spec, &context)
                    .await
                    .map_err(PipelineError::Other)?;
                let mut cache = pipeline.cache.lock().expect("generation cache poisoned");
                cache.insert(key, generated.clone());
                generated
            }
        };

        let content = templates::render(&content, namespace, connection_string);
        files.insert(spec.file_path.clone(), content);
    }

    Ok((files, skipped))
}

/// Build, and on failure refine, until success or the attempt bound.
///
/// Invokes the builder at most `max_refine_attempts + 1` times. An
/// exhausted bound surfaces the last error list; invalid output is never
/// returned as success.
async fn validate_and_refine(
    pipeline: &Pipeline,
    files: GeneratedFiles,
) -> PipelineResult<GeneratedFiles> {
    let Some(builder) = pipeline.builder.as_ref() else {
        return Err(PipelineError::Other(anyhow::anyhow!(
            "builder.command is not configured; rerun with validation skipped"
        )));
    };

    let max_refines = pipeline.settings.max_refine_attempts;
    let mut current = files;
    let mut refines: u32 = 0;

    loop {
        let outcome = builder
            .build(&current)
            .await
            .map_err(PipelineError::Other)?;

        if outcome.success {
            info!(builds = refines + 1, "build validation passed");
            return Ok(current);
        }

        if refines >= max_refines {
            return Err(PipelineError::BuildFailed {
                attempts: refines + 1,
                errors: outcome.errors,
            });
        }

        warn!(
            attempt = refines + 1,
            errors = outcome.errors.len(),
            "build failed, refining"
        );
        current = pipeline
            .refiner
            .refine(&current, &outcome.errors)
            .await
            .map_err(PipelineError::Other)?;
        refines += 1;
    }
}
