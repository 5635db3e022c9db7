use crate::document::SpecDocument;
use crate::error::Result;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read/write access to the specification document.
///
/// Implementors only provide text access; document parsing and the atomic
/// write discipline are shared.
pub trait DocumentStore {
    /// Read the document text as it currently is on disk.
    fn read_text(&self, path: &Path) -> Result<String>;

    /// Replace the document text so readers never observe a partial write.
    fn write_text_atomically(&self, path: &Path, content: &str) -> Result<()>;

    fn read_document(&self, path: &Path) -> Result<SpecDocument> {
        let content = self.read_text(path)?;
        SpecDocument::from_yaml_str(&content)
    }

    fn write_document_atomically(&self, path: &Path, document: &SpecDocument) -> Result<()> {
        let content = document.to_yaml_string()?;
        self.write_text_atomically(path, &content)
    }
}

/// Document store backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentStore;

impl FsDocumentStore {
    pub fn new() -> Self {
        FsDocumentStore
    }
}

impl DocumentStore for FsDocumentStore {
    fn read_text(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn write_text_atomically(&self, path: &Path, content: &str) -> Result<()> {
        Ok(write_atomic(path, content.as_bytes())?)
    }
}

/// Write to a sibling temp file, fsync, then rename over the target.
fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = temp_path_for(path);
    debug!("Writing document to temp file {:?}", temp_path);

    let original_permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let written = (|| -> io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        if let Some(permissions) = original_permissions {
            fs::set_permissions(&temp_path, permissions)?;
        }
        fs::rename(&temp_path, path)
    })();

    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    } else {
        debug!("Replaced {:?}", path);
    }
    written
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let temp_name = format!(".{}.tmp-{}", file_name, std::process::id());
    match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SemanticVersion;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("demo.spec.yaml");
        let store = FsDocumentStore::new();

        let doc = SpecDocument::from_yaml_str(
            "project:\n  id: demo\n  versioning:\n    current: \"0.1.0\"\n",
        )
        .unwrap();
        store.write_document_atomically(&path, &doc).unwrap();

        let back = store.read_document(&path).unwrap();
        assert_eq!(back.version().unwrap(), SemanticVersion::new(0, 1, 0));
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("demo.spec.yaml");
        let store = FsDocumentStore::new();

        store.write_text_atomically(&path, "first: 1\n").unwrap();
        store.write_text_atomically(&path, "second: 2\n").unwrap();

        assert_eq!(store.read_text(&path).unwrap(), "second: 2\n");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_write_cleans_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("doc.yaml");
        let store = FsDocumentStore::new();

        assert!(store.write_text_atomically(&path, "x: 1\n").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_read_missing_document() {
        let store = FsDocumentStore::new();
        assert!(store.read_document(Path::new("/definitely/not/here.yaml")).is_err());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let temp = temp_path_for(Path::new("/a/b/spec.yaml"));
        assert_eq!(temp.parent(), Some(Path::new("/a/b")));
        assert!(temp
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with(".spec.yaml.tmp-"));
    }
}
