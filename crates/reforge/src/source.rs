//! Legacy project scanning.
//!
//! Accepts either a project directory or a `.zip` archive (extracted
//! into a scoped temp dir first). Files are typed by extension, non-UTF-8
//! content becomes a binary marker, `Declare Function` / `Declare Sub`
//! lines are collected as extracted features, and project files
//! contribute their member and library references as dependencies.
//! Anything deeper than that is the Analyzer's job.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use reforge_core::models::{SourceContents, SourceFileRecord, SourceKind};

/// Scan a legacy project from a directory or `.zip` archive.
pub fn scan(path: &Path) -> Result<Vec<SourceFileRecord>> {
    if !path.exists() {
        bail!("source path does not exist: {}", path.display());
    }

    if path.is_file() {
        if path.extension().and_then(|e| e.to_str()) == Some("zip") {
            return scan_archive(path);
        }
        bail!(
            "source path must be a directory or .zip archive: {}",
            path.display()
        );
    }

    scan_dir(path)
}

fn scan_dir(root: &Path) -> Result<Vec<SourceFileRecord>> {
    let mut records = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .to_string();

        records.push(read_record(entry.path(), name)?);
    }

    info!(root = %root.display(), files = records.len(), "scanned source directory");
    Ok(records)
}

fn scan_archive(archive_path: &Path) -> Result<Vec<SourceFileRecord>> {
    let extract_dir = tempfile::tempdir().context("create extraction dir")?;

    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("open archive: {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("read zip archive")?;
    archive
        .extract(extract_dir.path())
        .context("extract zip archive")?;

    debug!(archive = %archive_path.display(), "extracted archive for scanning");
    scan_dir(extract_dir.path())
}

fn read_record(path: &Path, name: String) -> Result<SourceFileRecord> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;

    let kind = kind_for(&name);

    let (contents, features, dependencies) = match String::from_utf8(bytes) {
        Ok(text) => {
            let features = extract_features(&text);
            let dependencies = if kind == SourceKind::Project {
                extract_dependencies(&text)
            } else {
                Vec::new()
            };
            (SourceContents::Text(text), features, dependencies)
        }
        Err(_) => (SourceContents::Binary, Vec::new(), Vec::new()),
    };

    Ok(SourceFileRecord {
        name,
        kind,
        contents,
        features,
        dependencies,
    })
}

fn kind_for(name: &str) -> SourceKind {
    let ext = name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "frm" => SourceKind::Form,
        "bas" => SourceKind::Module,
        "cls" => SourceKind::Class,
        "vbp" => SourceKind::Project,
        "res" | "frx" => SourceKind::Resource,
        _ => SourceKind::Other,
    }
}

/// Collect member files and library references from a `.vbp` project.
///
/// `Form=Main.frm` names the member directly; `Module=Name; File.bas` and
/// `Class=Name; File.cls` name it after the semicolon; `Reference=...` ends
/// in a backslash-separated library path whose last segment is kept.
fn extract_dependencies(text: &str) -> Vec<String> {
    let mut deps = Vec::new();
    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Reference=") {
            let name = rest.rsplit('\\').next().unwrap_or(rest).trim();
            if !name.is_empty() {
                deps.push(name.to_string());
            }
        } else if let Some(rest) = line.strip_prefix("Form=") {
            let name = rest.split(';').next().unwrap_or(rest).trim();
            if !name.is_empty() {
                deps.push(name.to_string());
            }
        } else if let Some(rest) = line
            .strip_prefix("Module=")
            .or_else(|| line.strip_prefix("Class="))
        {
            let file = rest.rsplit(';').next().unwrap_or(rest).trim();
            if !file.is_empty() {
                deps.push(file.to_string());
            }
        }
    }
    deps
}

/// Collect external API declaration lines.
fn extract_features(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| {
            let lower = l.to_ascii_lowercase();
            lower.contains("declare function") || lower.contains("declare sub")
        })
        .map(|l| l.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_scan_dir_types_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Main.frm"), "Sub Form_Load()\nEnd Sub").unwrap();
        std::fs::write(dir.path().join("Utils.bas"), "Function Add()\nEnd Function").unwrap();
        std::fs::write(dir.path().join("App.vbp"), "Type=Exe").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "readme").unwrap();

        let records = scan(dir.path()).unwrap();
        assert_eq!(records.len(), 4);

        let kind_of = |n: &str| records.iter().find(|r| r.name == n).unwrap().kind;
        assert_eq!(kind_of("Main.frm"), SourceKind::Form);
        assert_eq!(kind_of("Utils.bas"), SourceKind::Module);
        assert_eq!(kind_of("App.vbp"), SourceKind::Project);
        assert_eq!(kind_of("notes.txt"), SourceKind::Other);
    }

    #[test]
    fn test_scan_extracts_declare_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Api.bas"),
            "Private Declare Function GetTickCount Lib \"kernel32\" () As Long\n\
             Public Declare Sub Sleep Lib \"kernel32\" (ByVal ms As Long)\n\
             Function Local()\nEnd Function",
        )
        .unwrap();

        let records = scan(dir.path()).unwrap();
        assert_eq!(records[0].features.len(), 2);
        assert!(records[0].features[0].contains("GetTickCount"));
    }

    #[test]
    fn test_vbp_members_and_references_become_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("App.vbp"),
            "Type=Exe\n\
             Reference=*\\G{00020430-0000-0000-C000-000000000046}#2.0#0#C:\\Windows\\stdole2.tlb#OLE Automation\n\
             Form=Main.frm\n\
             Module=Utils; Utils.bas\n\
             Class=Invoice; Invoice.cls\n\
             Startup=\"Main\"",
        )
        .unwrap();
        std::fs::write(dir.path().join("Main.frm"), "Sub Form_Load()\nEnd Sub").unwrap();

        let records = scan(dir.path()).unwrap();
        let vbp = records.iter().find(|r| r.name == "App.vbp").unwrap();
        assert_eq!(
            vbp.dependencies,
            vec![
                "stdole2.tlb#OLE Automation",
                "Main.frm",
                "Utils.bas",
                "Invoice.cls"
            ]
        );

        // Dependencies are a project-file concern only.
        let frm = records.iter().find(|r| r.name == "Main.frm").unwrap();
        assert!(frm.dependencies.is_empty());
    }

    #[test]
    fn test_non_utf8_becomes_binary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("icons.res"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let records = scan(dir.path()).unwrap();
        assert!(records[0].text().is_none());
        assert_eq!(records[0].kind, SourceKind::Resource);
    }

    #[test]
    fn test_scan_zip_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("project.zip");

        let file = std::fs::File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("Main.frm", options).unwrap();
        writer.write_all(b"Sub Form_Load()\nEnd Sub").unwrap();
        writer.finish().unwrap();

        let records = scan(&archive_path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, SourceKind::Form);
    }

    #[test]
    fn test_missing_path_errors() {
        assert!(scan(Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn test_non_zip_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("project.tar");
        std::fs::write(&file, "x").unwrap();
        assert!(scan(&file).is_err());
    }
}
