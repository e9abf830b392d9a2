// src/core/report/store.rs

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::models::ScanResult;
use crate::core::report::{assemble, pdf, ReportDocument};
use crate::error::{Result, ScanError};

/// Identifies one generated report. A timestamp prefix keeps listings
/// sorted; the UUID part keeps same-second reports apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn generate() -> Self {
        Self(format!("{}_{}", Local::now().format("%Y%m%d%H%M%S"), Uuid::new_v4().simple()))
    }

    /// Accepts only ids that could have been generated: ASCII alphanumerics
    /// and `_`, so an id can never name a path outside the store.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= 64
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn file_name(&self) -> String {
        format!("report_{}.pdf", self.0)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a saved report lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHandle {
    pub id: ReportId,
    pub path: PathBuf,
}

/// The reports directory. Each report is written once and never modified.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lays out and saves the report for `result`.
    pub fn render(&self, result: &ScanResult, target_url: &str) -> Result<ReportHandle> {
        let document = assemble(result, target_url);
        self.save(&document)
    }

    /// Serializes `document` to PDF under a fresh id. Creates the directory
    /// when missing and refuses to overwrite an existing artifact.
    pub fn save(&self, document: &ReportDocument) -> Result<ReportHandle> {
        let bytes = pdf::to_pdf_bytes(document)?;

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ScanError::Render(format!("cannot create {}: {}", self.dir.display(), e)))?;

        let id = ReportId::generate();
        let path = self.dir.join(id.file_name());
        debug!(path = %path.display(), "Writing report.");

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| ScanError::Render(format!("cannot create {}: {}", path.display(), e)))?;
        file.write_all(&bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| ScanError::Render(format!("cannot write {}: {}", path.display(), e)))?;

        info!(report_id = %id, pages = document.pages.len(), "Report saved.");
        Ok(ReportHandle { id, path })
    }

    /// Resolves an id to its artifact, if the id is well-formed and the file exists.
    pub fn path_for(&self, id: &str) -> Option<PathBuf> {
        let id = ReportId::parse(id)?;
        let path = self.dir.join(id.file_name());
        path.is_file().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Section;
    use serde_json::json;
    use std::collections::HashSet;

    fn sample() -> ScanResult {
        ScanResult::new("https://example.com", vec![(Section::Headers, json!({"status": "success"}))], "t")
    }

    #[test]
    fn creates_missing_directory_and_resolves_by_id() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path().join("nested").join("reports"));

        let handle = store.render(&sample(), "https://example.com").unwrap();

        assert!(handle.path.is_file());
        assert!(handle.path.file_name().unwrap().to_string_lossy().starts_with("report_"));
        assert_eq!(store.path_for(handle.id.as_str()), Some(handle.path.clone()));
        let bytes = std::fs::read(&handle.path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn same_second_saves_do_not_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        let ids: HashSet<ReportId> = (0..5).map(|_| store.render(&sample(), "u").unwrap().id).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn rejects_ids_that_escape_the_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        assert_eq!(store.path_for("../etc/passwd"), None);
        assert_eq!(store.path_for(""), None);
        assert_eq!(store.path_for("a/b"), None);
        assert_eq!(store.path_for("20240101000000_deadbeef"), None);
    }

    #[test]
    fn unwritable_directory_is_a_render_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let store = ReportStore::new(blocker.join("reports"));
        assert!(matches!(store.render(&sample(), "u"), Err(ScanError::Render(_))));
    }
}
