//! Archive packaging for generated projects.
//!
//! Serializes the final file mapping into one zip archive under the
//! exports directory and returns its path.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;

use reforge_core::models::GeneratedFiles;

/// Write `files` as `<exports_dir>/<analysis_id>.zip`.
pub fn package(exports_dir: &Path, analysis_id: &str, files: &GeneratedFiles) -> Result<PathBuf> {
    std::fs::create_dir_all(exports_dir)
        .with_context(|| format!("create exports dir: {}", exports_dir.display()))?;

    let archive_path = exports_dir.join(format!("{}.zip", analysis_id));
    let file = std::fs::File::create(&archive_path)
        .with_context(|| format!("create archive: {}", archive_path.display()))?;

    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (path, content) in files {
        writer
            .start_file(path.as_str(), options)
            .with_context(|| format!("add archive entry: {}", path))?;
        writer
            .write_all(content.as_bytes())
            .with_context(|| format!("write archive entry: {}", path))?;
    }

    writer.finish().context("finalize archive")?;

    info!(archive = %archive_path.display(), files = files.len(), "packaged project");
    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Read;

    #[test]
    fn test_package_writes_all_entries() {
        let dir = tempfile::tempdir().unwrap();
        let files: GeneratedFiles = BTreeMap::from([
            ("Program.cs".to_string(), "class Program {}".to_string()),
            (
                "Services/Order.cs".to_string(),
                "class Order {}".to_string(),
            ),
        ]);

        let path = package(dir.path(), "abc-123", &files).unwrap();
        assert!(path.ends_with("abc-123.zip"));

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("Services/Order.cs")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "class Order {}");
    }

    #[test]
    fn test_package_empty_mapping_yields_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = package(dir.path(), "empty", &BTreeMap::new()).unwrap();
        let archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
