//! Analyze stage: scan → per-file analysis → architecture proposal →
//! persist → index.
//!
//! Per-file failures never abort the stage: binary files and files whose
//! analysis fails are logged, skipped, and reported through
//! [`AnalyzeOutcome::skipped`]. Oversized files are summarized first so
//! the analyzer never sees more than the configured threshold warrants.
//! The Architect only ever sees the lean projection, never raw source.

use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use reforge_core::models::{
    AnalysisRecord, AnalysisSummary, FileAnalysis, IndexChunk, TargetArchitecture,
};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::Pipeline;
use crate::source;

/// Marker prepended to summarizer output standing in for raw source.
const SUMMARIZED_MARKER: &str = "[Summarized content]";

#[derive(Debug)]
pub struct AnalyzeOutcome {
    pub analysis_id: String,
    pub architecture: TargetArchitecture,
    /// Names of files that were scanned but not analyzed.
    pub skipped: Vec<String>,
}

/// Run the analyze stage over a project directory or `.zip` archive.
pub async fn run_analyze(pipeline: &Pipeline, source_path: &Path) -> PipelineResult<AnalyzeOutcome> {
    let records = source::scan(source_path).map_err(PipelineError::Other)?;
    info!(files = records.len(), "starting analysis");

    let mut summary = AnalysisSummary::new("Generated summary");
    let mut skipped = Vec::new();
    // Analyzed text per file, kept for index chunk construction.
    let mut analyzed_text: HashMap<String, String> = HashMap::new();

    for record in &records {
        let Some(text) = record.text() else {
            warn!(file = %record.name, "skipping binary file");
            skipped.push(record.name.clone());
            continue;
        };

        let mut content = if text.chars().count() > pipeline.settings.summarize_threshold_chars {
            info!(file = %record.name, "file exceeds threshold, summarizing before analysis");
            let summary_text = pipeline.summarizer.summarize(text).await;
            format!("{}\n{}", SUMMARIZED_MARKER, summary_text)
        } else {
            text.to_string()
        };
        if !record.dependencies.is_empty() {
            content.push_str("\n\nProject references:\n");
            content.push_str(&record.dependencies.join("\n"));
        }

        match pipeline
            .analyzer
            .analyze(&record.name, &content, &record.features)
            .await
        {
            Ok(analysis) => {
                analyzed_text.insert(analysis.file_name.clone(), content);
                summary.push(analysis);
            }
            Err(e) => {
                warn!(file = %record.name, error = %e, "analysis failed, skipping file");
                skipped.push(record.name.clone());
            }
        }
    }

    let projection = summary.lean_projection();
    let raw = pipeline
        .architect
        .propose(&projection)
        .await
        .map_err(PipelineError::Other)?;
    let architecture =
        TargetArchitecture::from_value(raw).map_err(|e| PipelineError::Schema(e.to_string()))?;

    let analysis_id = Uuid::new_v4().to_string();
    let record = AnalysisRecord {
        analysis_id: analysis_id.clone(),
        summary,
        architecture,
    };

    pipeline
        .analysis_store
        .put(&record)
        .await
        .map_err(PipelineError::Persistence)?;

    let chunks = build_chunks(&record, &analyzed_text).map_err(PipelineError::Other)?;
    pipeline
        .vector_store
        .add(&chunks)
        .await
        .map_err(PipelineError::Persistence)?;

    info!(
        analysis_id = %record.analysis_id,
        analyzed = record.summary.files.len(),
        skipped = skipped.len(),
        indexed = chunks.len(),
        "analysis complete"
    );

    Ok(AnalyzeOutcome {
        analysis_id,
        architecture: record.architecture,
        skipped,
    })
}

/// One rich chunk per analyzed file plus one for the architecture plan.
fn build_chunks(
    record: &AnalysisRecord,
    analyzed_text: &HashMap<String, String>,
) -> anyhow::Result<Vec<IndexChunk>> {
    let mut chunks = Vec::with_capacity(record.summary.files.len() + 1);

    for analysis in &record.summary.files {
        chunks.push(IndexChunk {
            tag: record.analysis_id.clone(),
            text: chunk_text(analysis, analyzed_text.get(&analysis.file_name)),
        });
    }

    let plan = serde_json::to_string_pretty(&record.architecture)?;
    chunks.push(IndexChunk {
        tag: record.analysis_id.clone(),
        text: format!("Proposed target architecture:\n{}", plan),
    });

    Ok(chunks)
}

fn chunk_text(analysis: &FileAnalysis, source_text: Option<&String>) -> String {
    let mut text = format!(
        "File: {}\nPurpose: {}\nFunctionality: {}\nDependencies: {}\nControls: {}\nEvents: {}\nQueries: {}",
        analysis.file_name,
        analysis.purpose,
        analysis.functionality,
        analysis.dependencies.join(", "),
        analysis.controls.join(", "),
        analysis.events.join(", "),
        analysis.queries.join(", "),
    );
    if let Some(source) = source_text {
        text.push_str("\nSource:\n");
        text.push_str(source);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(name: &str) -> FileAnalysis {
        FileAnalysis {
            file_name: name.to_string(),
            purpose: "billing".to_string(),
            functionality: "invoices".to_string(),
            dependencies: vec!["ADO".to_string()],
            controls: vec!["tmrPoll".to_string()],
            events: vec!["Form_Load".to_string()],
            queries: vec!["SELECT 1".to_string()],
        }
    }

    #[test]
    fn test_chunk_text_includes_source_when_present() {
        let source = "Sub Form_Load()\nEnd Sub".to_string();
        let text = chunk_text(&analysis("Main.frm"), Some(&source));
        assert!(text.contains("File: Main.frm"));
        assert!(text.contains("Sub Form_Load()"));
    }

    #[test]
    fn test_chunk_text_without_source() {
        let text = chunk_text(&analysis("Main.frm"), None);
        assert!(!text.contains("Source:"));
        assert!(text.contains("Queries: SELECT 1"));
    }

    #[test]
    fn test_build_chunks_adds_architecture_chunk() {
        let mut summary = AnalysisSummary::new("app");
        summary.push(analysis("Main.frm"));
        let record = AnalysisRecord {
            analysis_id: "a-1".to_string(),
            summary,
            architecture: TargetArchitecture::from_value(serde_json::json!({
                "project_name": "Migrated",
                "files": [{ "file_path": "Program.cs", "type": "program" }]
            }))
            .unwrap(),
        };

        let chunks = build_chunks(&record, &HashMap::new()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].text.contains("Proposed target architecture"));
        assert!(chunks.iter().all(|c| c.tag == "a-1"));
    }
}
