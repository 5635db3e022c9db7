use crate::document::{DocumentStore, SpecDocument};
use crate::domain::{AnchoredEntry, GitAnchor, HistoryEntry, SemanticVersion, TagPattern};
use crate::error::Result;
use crate::git::{short_hash, Repository};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Outcome of one consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ConsistencyCheck {
    fn pass(name: &str, message: impl Into<String>) -> Self {
        ConsistencyCheck {
            name: name.to_string(),
            passed: true,
            message: message.into(),
            suggestion: None,
        }
    }

    fn fail(name: &str, message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        ConsistencyCheck {
            name: name.to_string(),
            passed: false,
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub ok: bool,
    pub checks: Vec<ConsistencyCheck>,
}

impl ConsistencyReport {
    fn new(checks: Vec<ConsistencyCheck>) -> Self {
        ConsistencyReport {
            ok: checks.iter().all(|c| c.passed),
            checks,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConsistencyCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

pub const CHECK_VERSION_FORMAT: &str = "Version format";
pub const CHECK_LEDGER_HEAD: &str = "Ledger head";
pub const CHECK_GIT_TAG: &str = "Git tag";
pub const CHECK_UNIQUE_VERSIONS: &str = "Unique versions";
pub const CHECK_LEDGER_ORDER: &str = "Ledger order";

/// Read access to the ledger, plus drift detection against git.
pub struct HistoryLedger<'a> {
    store: &'a dyn DocumentStore,
    vcs: Option<&'a dyn Repository>,
    tags: TagPattern,
}

impl<'a> HistoryLedger<'a> {
    pub fn new(store: &'a dyn DocumentStore, vcs: Option<&'a dyn Repository>, tags: TagPattern) -> Self {
        HistoryLedger { store, vcs, tags }
    }

    /// Ledger entries in append order.
    pub fn get_history(&self, path: &Path) -> Result<Vec<HistoryEntry>> {
        Ok(self.store.read_document(path)?.history().to_vec())
    }

    /// Ledger entries in append order, each with its tag's commit when git knows it.
    pub fn get_history_with_git(&self, path: &Path) -> Result<Vec<AnchoredEntry>> {
        let history = self.get_history(path)?;
        Ok(history
            .into_iter()
            .map(|entry| {
                let git = self.anchor_for(&entry.version);
                AnchoredEntry { entry, git }
            })
            .collect())
    }

    /// Locate the tag for a version. Lookup failures are treated as absence.
    pub fn anchor_for(&self, version: &SemanticVersion) -> Option<GitAnchor> {
        let vcs = self.vcs?;
        let tag_name = self.tags.tag_for(version);

        match lookup_anchor(vcs, &tag_name) {
            Ok(anchor) => anchor,
            Err(e) => {
                debug!("Could not resolve {}: {}", tag_name, e);
                None
            }
        }
    }

    pub fn check_version_consistency(&self, path: &Path) -> Result<ConsistencyReport> {
        let document = self.store.read_document(path)?;
        Ok(self.check_document(&document))
    }

    /// Run every check against an already loaded document.
    pub fn check_document(&self, document: &SpecDocument) -> ConsistencyReport {
        let (format_check, version) = check_version_format(document);
        let checks = vec![
            format_check,
            check_ledger_head(document, version.as_ref()),
            self.check_git_tag(version.as_ref()),
            check_unique_versions(document.history()),
            check_ledger_order(document.history()),
        ];
        ConsistencyReport::new(checks)
    }

    fn check_git_tag(&self, version: Option<&SemanticVersion>) -> ConsistencyCheck {
        let version = match version {
            Some(version) => version,
            None => {
                return ConsistencyCheck::fail(
                    CHECK_GIT_TAG,
                    "Cannot look up a tag: the document version is invalid",
                    "Fix the document version first",
                )
            }
        };
        let tag_name = self.tags.tag_for(version);

        let vcs = match self.vcs {
            Some(vcs) if vcs.is_repository() => vcs,
            _ => {
                return ConsistencyCheck::fail(
                    CHECK_GIT_TAG,
                    format!("Git is unavailable, so tag {} could not be checked", tag_name),
                    "Run the check inside the project's git repository",
                )
            }
        };

        match vcs.resolve_tag(&tag_name) {
            Ok(Some(hash)) => ConsistencyCheck::pass(
                CHECK_GIT_TAG,
                format!("Tag {} points at {}", tag_name, short_hash(&hash)),
            ),
            Ok(None) => {
                let head = match vcs.recent_commits(1) {
                    Ok(commits) => commits
                        .first()
                        .map(|c| format!(" (HEAD is {} {})", c.short_hash(), c.summary()))
                        .unwrap_or_default(),
                    Err(_) => String::new(),
                };
                ConsistencyCheck::fail(
                    CHECK_GIT_TAG,
                    format!("Tag {} does not exist{}", tag_name, head),
                    format!("Create the missing tag: spec-ledger version tag (creates {})", tag_name),
                )
            }
            Err(e) => ConsistencyCheck::fail(
                CHECK_GIT_TAG,
                format!("Tag {} could not be checked: {}", tag_name, e),
                "Make sure the repository is readable",
            ),
        }
    }
}

fn lookup_anchor(vcs: &dyn Repository, tag_name: &str) -> Result<Option<GitAnchor>> {
    let hash = match vcs.resolve_tag(tag_name)? {
        Some(hash) => hash,
        None => return Ok(None),
    };
    let info = vcs.commit_info(&hash)?;
    Ok(Some(GitAnchor {
        tag_name: tag_name.to_string(),
        commit_message: info.summary().to_string(),
        commit_hash: info.hash,
        commit_date: info.date,
    }))
}

fn check_version_format(document: &SpecDocument) -> (ConsistencyCheck, Option<SemanticVersion>) {
    let suggestion = "Set project.versioning.current to MAJOR.MINOR.PATCH";
    match document.version_raw() {
        None => (
            ConsistencyCheck::fail(CHECK_VERSION_FORMAT, "Document declares no version", suggestion),
            None,
        ),
        Some(raw) => match SemanticVersion::parse(&raw) {
            Ok(version) => (
                ConsistencyCheck::pass(
                    CHECK_VERSION_FORMAT,
                    format!("Document version {} is valid", version),
                ),
                Some(version),
            ),
            Err(_) => (
                ConsistencyCheck::fail(
                    CHECK_VERSION_FORMAT,
                    format!("Document version '{}' is not a valid semantic version", raw),
                    suggestion,
                ),
                None,
            ),
        },
    }
}

fn check_ledger_head(document: &SpecDocument, version: Option<&SemanticVersion>) -> ConsistencyCheck {
    let latest = match document.latest_entry() {
        Some(entry) => entry.version,
        None => {
            return ConsistencyCheck::fail(
                CHECK_LEDGER_HEAD,
                "History is empty",
                "Add a history entry for the current version",
            )
        }
    };

    match version {
        None => ConsistencyCheck::fail(
            CHECK_LEDGER_HEAD,
            format!("Latest history entry is {} but the document version is invalid", latest),
            format!("Set project.versioning.current to {}", latest),
        ),
        Some(version) if *version == latest => ConsistencyCheck::pass(
            CHECK_LEDGER_HEAD,
            format!("Latest history entry matches {}", version),
        ),
        Some(version) => ConsistencyCheck::fail(
            CHECK_LEDGER_HEAD,
            format!(
                "Document declares {} but the latest history entry is {}",
                version, latest
            ),
            "Restore the document from git or bump again so both agree",
        ),
    }
}

fn check_unique_versions(history: &[HistoryEntry]) -> ConsistencyCheck {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for entry in history {
        if !seen.insert(entry.version) {
            duplicates.insert(entry.version);
        }
    }

    if duplicates.is_empty() {
        ConsistencyCheck::pass(
            CHECK_UNIQUE_VERSIONS,
            format!("{} history entries, all distinct", history.len()),
        )
    } else {
        let listed: Vec<String> = duplicates.iter().map(|v| v.to_string()).collect();
        ConsistencyCheck::fail(
            CHECK_UNIQUE_VERSIONS,
            format!("Duplicate history versions: {}", listed.join(", ")),
            "Remove or renumber the duplicated history entries",
        )
    }
}

fn check_ledger_order(history: &[HistoryEntry]) -> ConsistencyCheck {
    let regressions: Vec<String> = history
        .windows(2)
        .filter(|pair| pair[1].version < pair[0].version)
        .map(|pair| format!("{} after {}", pair[1].version, pair[0].version))
        .collect();

    if regressions.is_empty() {
        ConsistencyCheck::pass(CHECK_LEDGER_ORDER, "History versions never decrease")
    } else {
        ConsistencyCheck::fail(
            CHECK_LEDGER_ORDER,
            format!("History goes backwards: {}", regressions.join("; ")),
            "The history was edited by hand; restore it from git",
        )
    }
}
