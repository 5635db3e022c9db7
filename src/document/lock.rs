use crate::error::{Result, SpecLedgerError};
use chrono::Utc;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sidecar lock path for a document: `<document>.lock`.
pub fn lock_path_for(document_path: &Path) -> PathBuf {
    let mut path: OsString = document_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

/// Advisory lock held for the duration of a mutating operation.
///
/// Acquisition creates the sidecar file exclusively; it is removed on drop.
/// Only cooperating spec-ledger processes honour it.
#[derive(Debug)]
pub struct DocumentLock {
    lock_path: PathBuf,
    _file: File,
}

impl DocumentLock {
    pub fn acquire(document_path: &Path) -> Result<Self> {
        let lock_path = lock_path_for(document_path);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(
                    file,
                    "pid={}\nutc={}",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                debug!("Acquired document lock {:?}", lock_path);
                Ok(DocumentLock {
                    lock_path,
                    _file: file,
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(SpecLedgerError::LockBusy(
                lock_path.display().to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!("Failed to remove document lock {:?}: {}", self.lock_path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path_for(Path::new("/x/app.spec.yaml")),
            PathBuf::from("/x/app.spec.yaml.lock")
        );
    }

    #[test]
    fn test_second_acquire_is_busy() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("app.spec.yaml");

        let first = DocumentLock::acquire(&doc).unwrap();
        assert!(first.path().exists());

        match DocumentLock::acquire(&doc) {
            Err(SpecLedgerError::LockBusy(path)) => assert!(path.ends_with(".lock")),
            other => panic!("expected LockBusy, got {:?}", other),
        }
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("app.spec.yaml");

        {
            let _lock = DocumentLock::acquire(&doc).unwrap();
        }
        assert!(!lock_path_for(&doc).exists());
        assert!(DocumentLock::acquire(&doc).is_ok());
    }
}
