//! Build validation via an external command.
//!
//! [`CommandBuilder`] materializes a generated file set into a scoped
//! temporary directory and runs the configured build command (for
//! example `dotnet build`) inside it. Lines containing `error` in the
//! combined output become the validation error list. The temp directory
//! is removed on drop.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path};
use std::process::Stdio;
use tracing::info;

use reforge_core::models::{GeneratedFiles, ValidationOutcome};
use reforge_core::traits::ProjectBuilder;

pub struct CommandBuilder {
    command: String,
}

impl CommandBuilder {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl ProjectBuilder for CommandBuilder {
    async fn build(&self, files: &GeneratedFiles) -> Result<ValidationOutcome> {
        let work_dir = tempfile::tempdir().context("create build work dir")?;
        materialize(work_dir.path(), files)?;

        info!(command = %self.command, files = files.len(), "running build validation");

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(work_dir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("run build command: {}", self.command))?;

        if output.status.success() {
            return Ok(ValidationOutcome::ok());
        }

        let combined = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        let mut errors: Vec<String> = combined
            .lines()
            .filter(|l| l.to_lowercase().contains("error"))
            .map(|l| l.trim().to_string())
            .collect();

        if errors.is_empty() {
            errors.push(format!("build command exited with {}", output.status));
        }

        Ok(ValidationOutcome::failed(errors))
    }
}

/// Write the file mapping under `root`, creating parent directories.
///
/// Paths are relative to the work dir; absolute paths and `..` segments
/// are rejected so a malformed architecture cannot escape it.
fn materialize(root: &Path, files: &GeneratedFiles) -> Result<()> {
    for (rel_path, content) in files {
        let rel = Path::new(rel_path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            bail!("refusing to write outside work dir: {}", rel_path);
        }

        let full = root.join(rel);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir for {}", rel_path))?;
        }
        std::fs::write(&full, content).with_context(|| format!("write {}", rel_path))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn files(entries: &[(&str, &str)]) -> GeneratedFiles {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect::<BTreeMap<_, _>>()
    }

    #[tokio::test]
    async fn test_successful_command_validates() {
        let builder = CommandBuilder::new("true");
        let outcome = builder
            .build(&files(&[("src/Main.cs", "class Main {}")]))
            .await
            .unwrap();
        assert!(outcome.success);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_failing_command_collects_error_lines() {
        let builder = CommandBuilder::new("echo 'CS0103: error here' >&2; exit 1");
        let outcome = builder.build(&files(&[("a.txt", "x")])).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.errors.iter().any(|e| e.contains("CS0103")));
    }

    #[tokio::test]
    async fn test_failing_command_without_error_lines_reports_status() {
        let builder = CommandBuilder::new("exit 3");
        let outcome = builder.build(&files(&[("a.txt", "x")])).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_materialize_creates_nested_paths() {
        let builder = CommandBuilder::new("test -f Services/Deep/Foo.cs");
        let outcome = builder
            .build(&files(&[("Services/Deep/Foo.cs", "class Foo {}")]))
            .await
            .unwrap();
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let builder = CommandBuilder::new("true");
        let result = builder.build(&files(&[("../escape.txt", "x")])).await;
        assert!(result.is_err());
    }
}
