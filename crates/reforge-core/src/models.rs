//! Core data models for the migration pipeline.
//!
//! These types represent the source files, per-file analyses, and target
//! architecture that flow through the analyze and generate stages. Wire
//! field aliases (`file`, `filePath`, `projectName`, …) match the JSON the
//! analysis and architecture collaborators produce, so their responses
//! deserialize directly.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Category of a legacy source file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Form,
    Module,
    Class,
    Project,
    Resource,
    Other,
}

/// Raw contents of a scanned source file.
///
/// Binary payloads (resources, compiled blobs) are never analyzed or
/// indexed; they are carried only so diagnostics can name them.
#[derive(Debug, Clone)]
pub enum SourceContents {
    Text(String),
    Binary,
}

/// One scanned file from the legacy project. Immutable per run and
/// discarded after indexing.
#[derive(Debug, Clone)]
pub struct SourceFileRecord {
    pub name: String,
    pub kind: SourceKind,
    pub contents: SourceContents,
    /// Extracted declaration lines (e.g. Win32 API imports).
    pub features: Vec<String>,
    pub dependencies: Vec<String>,
}

impl SourceFileRecord {
    /// The raw text, or `None` for binary files.
    pub fn text(&self) -> Option<&str> {
        match &self.contents {
            SourceContents::Text(t) => Some(t),
            SourceContents::Binary => None,
        }
    }
}

/// Structured analysis of a single source file, as returned by the
/// Analyzer collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    #[serde(alias = "file")]
    pub file_name: String,
    pub purpose: String,
    #[serde(default)]
    pub functionality: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub controls: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default, alias = "adoQueries", alias = "ado_queries")]
    pub queries: Vec<String>,
}

/// Aggregate of all per-file analyses for one run.
///
/// File names are unique: pushing an analysis whose `file_name` already
/// exists replaces the earlier entry (later wins), preserving position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub files: Vec<FileAnalysis>,
    pub overall_purpose: String,
}

impl AnalysisSummary {
    pub fn new(overall_purpose: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            overall_purpose: overall_purpose.into(),
        }
    }

    /// Add a per-file analysis, replacing any earlier entry with the same
    /// file name.
    pub fn push(&mut self, analysis: FileAnalysis) {
        if let Some(existing) = self
            .files
            .iter_mut()
            .find(|f| f.file_name == analysis.file_name)
        {
            *existing = analysis;
        } else {
            self.files.push(analysis);
        }
    }

    /// Build the size-reduced projection sent to the Architect.
    ///
    /// Carries file names, purposes, timer-like controls, query counts,
    /// and dependencies — never raw source text or full functionality
    /// descriptions, which would blow the Architect's input bound.
    pub fn lean_projection(&self) -> LeanProjection {
        LeanProjection {
            overall_purpose: self.overall_purpose.clone(),
            files: self
                .files
                .iter()
                .map(|f| LeanFileView {
                    file: f.file_name.clone(),
                    purpose: f.purpose.clone(),
                    timers_found: f
                        .controls
                        .iter()
                        .filter(|c| c.to_lowercase().contains("timer"))
                        .cloned()
                        .collect(),
                    query_count: f.queries.len(),
                    dependencies: f.dependencies.clone(),
                })
                .collect(),
        }
    }
}

/// Per-file entry of the [`LeanProjection`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeanFileView {
    pub file: String,
    pub purpose: String,
    pub timers_found: Vec<String>,
    pub query_count: usize,
    pub dependencies: Vec<String>,
}

/// Size-reduced view of an [`AnalysisSummary`] used only for architecture
/// proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeanProjection {
    pub overall_purpose: String,
    pub files: Vec<LeanFileView>,
}

/// Category of a target artifact, determining which generator variant and
/// static template apply.
///
/// Parsed from the architecture's free-form `type` string via
/// [`ArtifactKind::parse`]; serialized back as that string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Model,
    Interface,
    Service,
    Worker,
    Controller,
    View,
    Config,
    Program,
    Project,
    /// Any kind the architecture names that this pipeline has no generator
    /// for. Parsed, carried through, and skipped at generation time.
    Unknown,
}

impl ArtifactKind {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "model" => Self::Model,
            "interface" => Self::Interface,
            "service" => Self::Service,
            "worker" => Self::Worker,
            "controller" => Self::Controller,
            "view" => Self::View,
            "config" => Self::Config,
            "program" => Self::Program,
            "project" | "csproj" => Self::Project,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Interface => "interface",
            Self::Service => "service",
            Self::Worker => "worker",
            Self::Controller => "controller",
            Self::View => "view",
            Self::Config => "config",
            Self::Program => "program",
            Self::Project => "project",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property of a generated model class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProperty {
    pub name: String,
    #[serde(alias = "dataType")]
    pub data_type: String,
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// A parameter of a generated method signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodParameter {
    pub name: String,
    #[serde(alias = "dataType", alias = "type")]
    pub data_type: String,
}

/// A method on a generated service or interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMethod {
    pub name: String,
    #[serde(default = "default_return_type", alias = "returnType")]
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<MethodParameter>,
}

fn default_return_type() -> String {
    "void".to_string()
}

/// Kind-specific metadata of a [`TargetFileSpec`].
///
/// One variant per artifact category, carrying only the fields that apply
/// — rather than one struct with many optional fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactDetail {
    /// Models carry typed properties.
    Model { properties: Vec<ModelProperty> },
    /// Interfaces, services, and controllers carry method signatures.
    Api { methods: Vec<ServiceMethod> },
    /// Workers carry a free-form behavior description.
    Worker { description: Option<String> },
    /// Views carry the UI components they render.
    View { components: Vec<String> },
    /// Config, program, and project files need no extra metadata.
    Plain,
}

/// Wire shape of one architecture file entry, as the Architect emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTargetFile {
    #[serde(alias = "filePath")]
    file_path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<Vec<ModelProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    methods: Option<Vec<ServiceMethod>>,
    #[serde(default, alias = "uiComponents", skip_serializing_if = "Option::is_none")]
    components: Option<Vec<String>>,
}

/// One planned target artifact: path, kind, namespace, dependencies, and
/// kind-specific detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTargetFile", into = "RawTargetFile")]
pub struct TargetFileSpec {
    pub file_path: String,
    pub kind: ArtifactKind,
    pub namespace: Option<String>,
    pub dependencies: Vec<String>,
    pub detail: ArtifactDetail,
}

impl From<RawTargetFile> for TargetFileSpec {
    fn from(raw: RawTargetFile) -> Self {
        let kind = ArtifactKind::parse(&raw.kind);
        let detail = match kind {
            ArtifactKind::Model => ArtifactDetail::Model {
                properties: raw.properties.unwrap_or_default(),
            },
            ArtifactKind::Interface | ArtifactKind::Service | ArtifactKind::Controller => {
                ArtifactDetail::Api {
                    methods: raw.methods.unwrap_or_default(),
                }
            }
            ArtifactKind::Worker => ArtifactDetail::Worker {
                description: raw.description,
            },
            ArtifactKind::View => ArtifactDetail::View {
                components: raw.components.unwrap_or_default(),
            },
            _ => ArtifactDetail::Plain,
        };
        Self {
            file_path: raw.file_path,
            kind,
            namespace: raw.namespace,
            dependencies: raw.dependencies,
            detail,
        }
    }
}

impl From<TargetFileSpec> for RawTargetFile {
    fn from(spec: TargetFileSpec) -> Self {
        let mut raw = RawTargetFile {
            file_path: spec.file_path,
            kind: spec.kind.as_str().to_string(),
            namespace: spec.namespace,
            dependencies: spec.dependencies,
            description: None,
            properties: None,
            methods: None,
            components: None,
        };
        match spec.detail {
            ArtifactDetail::Model { properties } => raw.properties = Some(properties),
            ArtifactDetail::Api { methods } => raw.methods = Some(methods),
            ArtifactDetail::Worker { description } => raw.description = description,
            ArtifactDetail::View { components } => raw.components = Some(components),
            ArtifactDetail::Plain => {}
        }
        raw
    }
}

/// The declarative plan of target artifacts to generate.
///
/// Immutable once proposed. A caller-supplied override replaces it
/// wholesale before generation; there is no partial merge, and the
/// override is never persisted back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetArchitecture {
    #[serde(alias = "projectName", default = "default_project_name")]
    pub project_name: String,
    pub files: Vec<TargetFileSpec>,
    #[serde(default)]
    pub customizations: BTreeMap<String, serde_json::Value>,
}

fn default_project_name() -> String {
    "MigratedProject".to_string()
}

impl TargetArchitecture {
    /// Validate a raw Architect response against the architecture schema.
    ///
    /// Any structural violation — missing `files`, an entry without
    /// `file_path` or `type`, malformed detail fields — is an error; the
    /// caller treats it as fatal for the whole request.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let arch: Self = serde_json::from_value(value)?;
        for file in &arch.files {
            if file.file_path.trim().is_empty() {
                bail!("architecture file entry has an empty file_path");
            }
        }
        Ok(arch)
    }
}

/// Persisted pairing of an analysis and its proposed architecture.
/// Created once per analyze run; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub analysis_id: String,
    pub summary: AnalysisSummary,
    pub architecture: TargetArchitecture,
}

/// One indexed unit of text in the vector store, tagged by the analysis
/// that produced it. Append-only; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexChunk {
    pub tag: String,
    pub text: String,
}

/// Result of running the Builder over a generated file set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub success: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
        }
    }
}

/// The generated artifact set: file path → content, rebuilt from scratch
/// on every generation attempt.
pub type GeneratedFiles = BTreeMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(name: &str, purpose: &str) -> FileAnalysis {
        FileAnalysis {
            file_name: name.to_string(),
            purpose: purpose.to_string(),
            functionality: String::new(),
            dependencies: vec![],
            controls: vec![],
            events: vec![],
            queries: vec![],
        }
    }

    #[test]
    fn test_summary_push_later_wins() {
        let mut summary = AnalysisSummary::new("test");
        summary.push(analysis("Main.bas", "first"));
        summary.push(analysis("Other.bas", "other"));
        summary.push(analysis("Main.bas", "second"));

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.files[0].file_name, "Main.bas");
        assert_eq!(summary.files[0].purpose, "second");
        assert_eq!(summary.files[1].file_name, "Other.bas");
    }

    #[test]
    fn test_lean_projection_filters_timers() {
        let mut summary = AnalysisSummary::new("scheduler app");
        let mut a = analysis("Sched.frm", "schedules jobs");
        a.controls = vec![
            "tmrPoll (Timer)".to_string(),
            "btnStart (CommandButton)".to_string(),
        ];
        a.queries = vec!["SELECT * FROM jobs".to_string()];
        a.dependencies = vec!["DbHelper.bas".to_string()];
        summary.push(a);

        let lean = summary.lean_projection();
        assert_eq!(lean.files.len(), 1);
        assert_eq!(lean.files[0].timers_found, vec!["tmrPoll (Timer)"]);
        assert_eq!(lean.files[0].query_count, 1);
        assert_eq!(lean.files[0].dependencies, vec!["DbHelper.bas"]);
    }

    #[test]
    fn test_file_analysis_wire_aliases() {
        let json = serde_json::json!({
            "file": "Main.bas",
            "purpose": "entry point",
            "adoQueries": ["SELECT 1"]
        });
        let parsed: FileAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.file_name, "Main.bas");
        assert_eq!(parsed.queries, vec!["SELECT 1"]);
    }

    #[test]
    fn test_architecture_from_value() {
        let json = serde_json::json!({
            "projectName": "Billing",
            "files": [
                {
                    "filePath": "Models/Invoice.cs",
                    "type": "model",
                    "properties": [{"name": "Id", "dataType": "int"}]
                },
                {
                    "file_path": "Services/InvoiceService.cs",
                    "type": "service",
                    "methods": [{"name": "Process", "returnType": "Task"}]
                }
            ]
        });
        let arch = TargetArchitecture::from_value(json).unwrap();
        assert_eq!(arch.project_name, "Billing");
        assert_eq!(arch.files.len(), 2);
        assert_eq!(arch.files[0].kind, ArtifactKind::Model);
        match &arch.files[0].detail {
            ArtifactDetail::Model { properties } => {
                assert_eq!(properties[0].data_type, "int");
            }
            other => panic!("expected model detail, got {:?}", other),
        }
        assert_eq!(arch.files[1].kind, ArtifactKind::Service);
    }

    #[test]
    fn test_architecture_unknown_kind_survives_parsing() {
        let json = serde_json::json!({
            "files": [{"filePath": "scripts/deploy.ps1", "type": "script"}]
        });
        let arch = TargetArchitecture::from_value(json).unwrap();
        assert_eq!(arch.files[0].kind, ArtifactKind::Unknown);
        assert_eq!(arch.project_name, "MigratedProject");
    }

    #[test]
    fn test_architecture_missing_type_is_schema_error() {
        let json = serde_json::json!({
            "files": [{"filePath": "Models/Invoice.cs"}]
        });
        assert!(TargetArchitecture::from_value(json).is_err());
    }

    #[test]
    fn test_architecture_empty_path_is_schema_error() {
        let json = serde_json::json!({
            "files": [{"filePath": "  ", "type": "model"}]
        });
        assert!(TargetArchitecture::from_value(json).is_err());
    }

    #[test]
    fn test_architecture_roundtrip() {
        let json = serde_json::json!({
            "projectName": "Billing",
            "files": [{"filePath": "Worker.cs", "type": "worker", "description": "polls queue"}]
        });
        let arch = TargetArchitecture::from_value(json).unwrap();
        let serialized = serde_json::to_value(&arch).unwrap();
        let reparsed = TargetArchitecture::from_value(serialized).unwrap();
        assert_eq!(reparsed.files[0].kind, ArtifactKind::Worker);
        match &reparsed.files[0].detail {
            ArtifactDetail::Worker { description } => {
                assert_eq!(description.as_deref(), Some("polls queue"));
            }
            other => panic!("expected worker detail, got {:?}", other),
        }
    }
}
