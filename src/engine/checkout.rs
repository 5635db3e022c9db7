use crate::document::{DocumentLock, DocumentStore};
use crate::domain::{SemanticVersion, TagPattern};
use crate::error::{Result, SpecLedgerError};
use crate::git::Repository;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const TAG_HINT_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Version as typed by the user; a leading tag prefix is accepted.
    pub version: String,
    pub branch: Option<String>,
    pub force: bool,
}

impl CheckoutRequest {
    pub fn new(version: impl Into<String>) -> Self {
        CheckoutRequest {
            version: version.into(),
            branch: None,
            force: false,
        }
    }
}

/// Where the working tree ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    /// HEAD points at the tagged commit with no branch; new commits there
    /// are unreachable unless a branch is created.
    Detached { commit_hash: String },
    OnBranch { branch: String },
}

/// The document found after checkout does not declare the tagged version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDrift {
    pub expected: SemanticVersion,
    pub found: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub tag_name: String,
    pub commit_hash: String,
    pub state: CheckoutState,
    pub discarded_changes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<VersionDrift>,
}

/// Moves the working tree to the commit a version tag points at.
pub struct CheckoutController<'a> {
    store: &'a dyn DocumentStore,
    vcs: Option<&'a dyn Repository>,
    tags: TagPattern,
    document_path: Option<PathBuf>,
}

impl<'a> CheckoutController<'a> {
    pub fn new(store: &'a dyn DocumentStore, vcs: Option<&'a dyn Repository>, tags: TagPattern) -> Self {
        CheckoutController {
            store,
            vcs,
            tags,
            document_path: None,
        }
    }

    /// Lock this document during the switch and verify its version afterwards.
    pub fn with_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.document_path = Some(path.into());
        self
    }

    pub fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResult> {
        let vcs = self.vcs.ok_or_else(|| {
            SpecLedgerError::VcsUnavailable("checkout requires a git repository".to_string())
        })?;
        if !vcs.is_repository() {
            return Err(SpecLedgerError::NotARepository(
                "repository has no working tree".to_string(),
            ));
        }

        let clean = vcs.is_working_tree_clean()?;
        if !clean && !request.force {
            return Err(SpecLedgerError::UncommittedChanges);
        }

        let tag_name = self.tags.tag_for_input(&request.version);
        let commit_hash = match vcs.resolve_tag(&tag_name)? {
            Some(hash) => hash,
            None => {
                let available = self.tags.relevant_tags(&vcs.list_tags()?, TAG_HINT_LIMIT);
                return Err(SpecLedgerError::TagNotFound {
                    tag: tag_name,
                    available,
                });
            }
        };

        let _lock = match &self.document_path {
            Some(path) => Some(DocumentLock::acquire(path)?),
            None => None,
        };

        if !clean {
            warn!("Discarding local modifications before checking out {}", tag_name);
        }
        vcs.checkout_ref(&tag_name, request.branch.as_deref(), request.force)?;
        info!("Checked out {} ({})", tag_name, commit_hash);

        let state = match &request.branch {
            Some(branch) => CheckoutState::OnBranch {
                branch: branch.clone(),
            },
            None => CheckoutState::Detached {
                commit_hash: commit_hash.clone(),
            },
        };

        let drift = match (&self.document_path, self.tags.version_of(&tag_name)) {
            (Some(path), Some(expected)) => self.verify_document(path, expected),
            _ => None,
        };

        Ok(CheckoutResult {
            tag_name,
            commit_hash,
            state,
            discarded_changes: !clean,
            drift,
        })
    }

    fn verify_document(&self, path: &Path, expected: SemanticVersion) -> Option<VersionDrift> {
        let found = match self.store.read_document(path) {
            Ok(document) => document.version_raw(),
            Err(e) => {
                debug!("Could not read {} after checkout: {}", path.display(), e);
                None
            }
        };

        let matches = found
            .as_deref()
            .and_then(|raw| SemanticVersion::parse(raw).ok())
            .map_or(false, |version| version == expected);
        if matches {
            None
        } else {
            warn!("Document at {} declares {:?}, expected {}", path.display(), found, expected);
            Some(VersionDrift { expected, found })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FsDocumentStore;
    use crate::git::MockRepository;
    use std::fs;
    use tempfile::TempDir;

    fn doc(version: &str) -> String {
        format!("project:\n  versioning:\n    current: \"{}\"\nhistory: []\n", version)
    }

    fn setup() -> (TempDir, PathBuf, MockRepository) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.spec.yaml");
        let mock = MockRepository::new();
        let first = mock.add_commit("1.0.0", &path, &doc("1.0.0"));
        mock.add_tag("v1.0.0", first);
        let second = mock.add_commit("2.0.0", &path, &doc("2.0.0"));
        mock.add_tag("v2.0.0", second);
        let third = mock.add_commit("2.1.0", &path, &doc("2.1.0"));
        mock.add_tag("v2.1.0", third);
        fs::write(&path, doc("2.1.0")).unwrap();
        (dir, path, mock)
    }

    #[test]
    fn test_checkout_detaches_at_tag() {
        let (_dir, path, mock) = setup();
        let store = FsDocumentStore::new();
        let controller =
            CheckoutController::new(&store, Some(&mock), TagPattern::default()).with_document(&path);

        let result = controller.checkout(&CheckoutRequest::new("2.0.0")).unwrap();
        assert_eq!(result.tag_name, "v2.0.0");
        assert!(matches!(result.state, CheckoutState::Detached { .. }));
        assert_eq!(result.drift, None);
        assert!(!result.discarded_changes);
        assert_eq!(mock.current_branch(), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), doc("2.0.0"));
    }

    #[test]
    fn test_checkout_accepts_prefixed_input_and_branch() {
        let (_dir, path, mock) = setup();
        let store = FsDocumentStore::new();
        let controller =
            CheckoutController::new(&store, Some(&mock), TagPattern::default()).with_document(&path);

        let mut request = CheckoutRequest::new("v1.0.0");
        request.branch = Some("hotfix-1.0".to_string());
        let result = controller.checkout(&request).unwrap();
        assert_eq!(
            result.state,
            CheckoutState::OnBranch {
                branch: "hotfix-1.0".to_string()
            }
        );
        assert_eq!(mock.current_branch().as_deref(), Some("hotfix-1.0"));
    }

    #[test]
    fn test_missing_tag_lists_relevant_tags() {
        let (_dir, path, mock) = setup();
        mock.add_tag("other-9.9.9", mock.head().unwrap());
        let store = FsDocumentStore::new();
        let controller =
            CheckoutController::new(&store, Some(&mock), TagPattern::default()).with_document(&path);

        match controller.checkout(&CheckoutRequest::new("3.0.0")) {
            Err(SpecLedgerError::TagNotFound { tag, available }) => {
                assert_eq!(tag, "v3.0.0");
                assert_eq!(available, vec!["v2.1.0", "v2.0.0", "v1.0.0"]);
            }
            other => panic!("expected TagNotFound, got {:?}", other),
        }
        assert!(mock.checkouts().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), doc("2.1.0"));
    }

    #[test]
    fn test_dirty_tree_requires_force() {
        let (_dir, path, mock) = setup();
        mock.set_dirty(true);
        fs::write(&path, "local edits\n").unwrap();
        let store = FsDocumentStore::new();
        let controller =
            CheckoutController::new(&store, Some(&mock), TagPattern::default()).with_document(&path);

        assert!(matches!(
            controller.checkout(&CheckoutRequest::new("2.0.0")),
            Err(SpecLedgerError::UncommittedChanges)
        ));
        assert!(mock.checkouts().is_empty());

        let mut forced = CheckoutRequest::new("2.0.0");
        forced.force = true;
        let result = controller.checkout(&forced).unwrap();
        assert!(result.discarded_changes);
        assert!(matches!(result.state, CheckoutState::Detached { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), doc("2.0.0"));
    }

    #[test]
    fn test_checkout_without_git() {
        let store = FsDocumentStore::new();
        let controller = CheckoutController::new(&store, None, TagPattern::default());
        assert!(matches!(
            controller.checkout(&CheckoutRequest::new("1.0.0")),
            Err(SpecLedgerError::VcsUnavailable(_))
        ));
    }

    #[test]
    fn test_drift_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.spec.yaml");
        let mock = MockRepository::new();
        let commit = mock.add_commit("mislabelled", &path, &doc("0.9.0"));
        mock.add_tag("v1.0.0", commit);

        let store = FsDocumentStore::new();
        let controller =
            CheckoutController::new(&store, Some(&mock), TagPattern::default()).with_document(&path);
        let result = controller.checkout(&CheckoutRequest::new("1.0.0")).unwrap();
        assert_eq!(
            result.drift,
            Some(VersionDrift {
                expected: SemanticVersion::new(1, 0, 0),
                found: Some("0.9.0".to_string()),
            })
        );
    }
}
