//! Pipeline error taxonomy.
//!
//! Internal modules use `anyhow::Result` with `?`. The orchestrator
//! boundary maps failures into [`PipelineError`] so callers (the CLI and
//! the HTTP layer) can distinguish schema violations, unknown analysis
//! ids, and exhausted refinement from generic internal errors.
//!
//! Per-file analysis failures, degraded retrieval, and unsupported
//! artifact kinds are not errors at this level. They are logged and
//! surfaced through diagnostics fields on the stage outputs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The Architect's response did not match the architecture schema.
    #[error("architecture schema violation: {0}")]
    Schema(String),

    /// No stored analysis exists for the requested id.
    #[error("analysis not found: {0}")]
    NotFound(String),

    /// The refine loop exhausted its attempt bound without a clean build.
    #[error("build failed after {attempts} attempts: {}", errors.join("; "))]
    BuildFailed {
        attempts: u32,
        errors: Vec<String>,
    },

    /// A durable store (analysis or vector) could not be written.
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failed_message_includes_errors() {
        let err = PipelineError::BuildFailed {
            attempts: 4,
            errors: vec!["CS0103: name does not exist".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("CS0103"));
    }

    #[test]
    fn test_anyhow_converts_to_other() {
        fn inner() -> PipelineResult<()> {
            let r: anyhow::Result<()> = Err(anyhow::anyhow!("boom"));
            r?;
            Ok(())
        }
        let err = inner().unwrap_err();
        assert!(matches!(err, PipelineError::Other(_)));
    }
}
