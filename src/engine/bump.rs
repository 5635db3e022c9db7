use crate::document::{DocumentLock, DocumentStore, SpecDocument};
use crate::domain::{validate_changes, BumpType, ChangeEntry, HistoryEntry, SemanticVersion, TagPattern};
use crate::error::{Result, SpecLedgerError};
use crate::git::Repository;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything a bump needs to know.
#[derive(Debug, Clone)]
pub struct BumpRequest {
    pub document_path: PathBuf,
    pub bump_type: BumpType,
    pub message: String,
    pub changes: Vec<ChangeEntry>,
    pub skip_commit: bool,
    pub skip_tag: bool,
    pub dry_run: bool,
}

impl BumpRequest {
    pub fn new(document_path: impl Into<PathBuf>, bump_type: BumpType, message: impl Into<String>) -> Self {
        BumpRequest {
            document_path: document_path.into(),
            bump_type,
            message: message.into(),
            changes: Vec::new(),
            skip_commit: false,
            skip_tag: false,
            dry_run: false,
        }
    }
}

/// How far a bump got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpOutcome {
    /// Document written and every requested git step succeeded.
    Applied,
    /// Nothing was touched.
    DryRun,
    /// A git step failed and the previous document was restored.
    RolledBack,
    /// The document (and possibly a commit) is in place but a later step failed.
    PartiallyApplied,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BumpResult {
    pub success: bool,
    pub outcome: BumpOutcome,
    pub previous_version: SemanticVersion,
    pub new_version: SemanticVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl BumpResult {
    fn new(outcome: BumpOutcome, previous_version: SemanticVersion, new_version: SemanticVersion) -> Self {
        BumpResult {
            success: true,
            outcome,
            previous_version,
            new_version,
            commit_hash: None,
            tag_name: None,
            errors: Vec::new(),
            suggestion: None,
        }
    }
}

/// Computes the next version, records it and anchors it in git.
///
/// Validation problems and anything detected before the document is written
/// come back as `Err`. Once the document has been written, failures are
/// reported through [`BumpResult`] so the caller learns exactly what state was
/// left behind.
pub struct BumpEngine<'a> {
    store: &'a dyn DocumentStore,
    vcs: Option<&'a dyn Repository>,
    tags: TagPattern,
}

impl<'a> BumpEngine<'a> {
    pub fn new(store: &'a dyn DocumentStore, vcs: Option<&'a dyn Repository>, tags: TagPattern) -> Self {
        BumpEngine { store, vcs, tags }
    }

    pub fn bump(&self, request: &BumpRequest) -> Result<BumpResult> {
        if request.message.trim().is_empty() {
            return Err(SpecLedgerError::format("Bump message must not be empty"));
        }
        validate_changes(&request.changes)?;
        if request.skip_commit && !request.skip_tag {
            return Err(SpecLedgerError::format(
                "A version tag must point at the bump commit; pass --no-tag together with --no-commit",
            ));
        }

        let path = request.document_path.as_path();
        let _lock = if request.dry_run {
            None
        } else {
            Some(DocumentLock::acquire(path)?)
        };

        let original = self.store.read_text(path)?;
        let mut document = SpecDocument::from_yaml_str(&original)?;
        let previous = document.version()?;
        let next = previous.bump(request.bump_type)?;
        debug!("{} bump: {} -> {}", request.bump_type, previous, next);

        if document.records_version(&next) {
            return Err(SpecLedgerError::document(format!(
                "history already records version {} although the document declares {}",
                next, previous
            )));
        }

        if request.dry_run {
            info!("Dry run: would bump {} -> {}", previous, next);
            return Ok(BumpResult::new(BumpOutcome::DryRun, previous, next));
        }

        let wants_commit = !request.skip_commit;
        let wants_tag = !request.skip_tag;
        let vcs = if wants_commit || wants_tag {
            Some(self.require_vcs()?)
        } else {
            None
        };

        let tag_name = self.tags.tag_for(&next);
        if let (true, Some(vcs)) = (wants_tag, vcs) {
            if vcs.resolve_tag(&tag_name)?.is_some() {
                return Err(SpecLedgerError::TagExists(tag_name));
            }
        }

        let mut entry = HistoryEntry::new(next);
        entry.based_on = Some(previous);
        entry.notes = Some(request.message.clone());
        entry.changes = request.changes.clone();
        document.apply_entry(entry)?;

        self.store.write_document_atomically(path, &document)?;
        info!("Recorded version {} in {}", next, path.display());

        let mut result = BumpResult::new(BumpOutcome::Applied, previous, next);
        let vcs = match vcs {
            Some(vcs) => vcs,
            None => return Ok(result),
        };

        if wants_commit {
            match vcs.stage_and_commit(path, &request.message) {
                Ok(hash) => {
                    info!("Committed {} as {}", path.display(), hash);
                    result.commit_hash = Some(hash);
                }
                Err(e) => return Ok(self.roll_back(path, &original, result, "commit", e)),
            }
        }

        if wants_tag {
            match vcs.create_annotated_tag(&tag_name, &format!("Version {}", next)) {
                Ok(()) => {
                    info!("Tagged {}", tag_name);
                    result.tag_name = Some(tag_name);
                }
                Err(e) => {
                    warn!("Tagging {} failed after commit: {}", tag_name, e);
                    result.success = false;
                    result.outcome = BumpOutcome::PartiallyApplied;
                    result.errors.push(e.to_string());
                    result.suggestion = Some(format!(
                        "The commit exists but is untagged; run `spec-ledger version tag` to create {}",
                        tag_name
                    ));
                }
            }
        }

        Ok(result)
    }

    /// Tag HEAD with the document's current version, e.g. after a bump whose
    /// tag step failed. Returns the tag name.
    ///
    /// HEAD must already contain the document at that version.
    pub fn tag_current(&self, path: &Path) -> Result<String> {
        let vcs = self.require_vcs()?;
        let version = self.store.read_document(path)?.version()?;
        let tag_name = self.tags.tag_for(&version);

        let committed = SpecDocument::from_yaml_str(&vcs.content_at_ref("HEAD", path)?)?.version()?;
        if committed != version {
            return Err(SpecLedgerError::document(format!(
                "HEAD records version {} but the document declares {}; commit the document before tagging",
                committed, version
            )));
        }

        vcs.create_annotated_tag(&tag_name, &format!("Version {}", version))?;
        info!("Tagged {}", tag_name);
        Ok(tag_name)
    }

    fn require_vcs(&self) -> Result<&'a dyn Repository> {
        match self.vcs {
            Some(vcs) if vcs.is_repository() => Ok(vcs),
            Some(_) => Err(SpecLedgerError::VcsUnavailable(
                "repository has no working tree".to_string(),
            )),
            None => Err(SpecLedgerError::VcsUnavailable(
                "no git repository found for the document".to_string(),
            )),
        }
    }

    fn roll_back(
        &self,
        path: &Path,
        original: &str,
        mut result: BumpResult,
        step: &str,
        error: SpecLedgerError,
    ) -> BumpResult {
        warn!("{} step failed, restoring {}: {}", step, path.display(), error);
        result.success = false;
        result.suggestion = error.suggestion();
        result.errors.push(error.to_string());

        match self.store.write_text_atomically(path, original) {
            Ok(()) => result.outcome = BumpOutcome::RolledBack,
            Err(restore) => {
                result.outcome = BumpOutcome::PartiallyApplied;
                result
                    .errors
                    .push(format!("restoring the previous document failed: {}", restore));
                result.suggestion =
                    Some("Run `spec-ledger version check` before trusting repository state".to_string());
            }
        }
        result
    }
}
