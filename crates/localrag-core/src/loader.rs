use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::Document;

/// Walks a directory tree and turns matching files into [`Document`]s.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    extensions: Vec<String>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(["txt", "md"])
    }
}

impl DocumentLoader {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self { extensions }
    }

    /// Loads every matching file under `dir`, sorted by path.
    ///
    /// Unreadable files are skipped with a warning; a missing `dir` is `NotFound`.
    pub fn load_directory(&self, dir: &Path) -> Result<Vec<Document>> {
        if !dir.is_dir() {
            return Err(Error::NotFound(dir.to_path_buf()));
        }
        let files = self.list_files(dir);
        let mut documents = Vec::with_capacity(files.len());
        for file_path in &files {
            match read_file_content(file_path) {
                Ok(content) => documents.push(Document {
                    content,
                    source: file_path.to_string_lossy().to_string(),
                    title: file_stem(file_path),
                }),
                Err(e) => warn!(path = %file_path.display(), error = %e, "skipping unreadable file"),
            }
        }
        info!(dir = %dir.display(), documents = documents.len(), "loaded documents");
        Ok(documents)
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.matches(p))
            .collect();
        files.sort();
        files
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

fn read_file_content(file_path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(file_path)?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).to_string()),
    }
}

fn file_stem(file_path: &Path) -> String {
    file_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
}
