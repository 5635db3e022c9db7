use crate::document::DocumentStore;
use crate::domain::{TagPattern, VersionReference};
use crate::error::{Result, SpecLedgerError};
use crate::git::Repository;
use std::path::Path;
use tracing::debug;

/// Turns a [`VersionReference`] into the document text it denotes.
pub struct ContentResolver<'a> {
    store: &'a dyn DocumentStore,
    vcs: Option<&'a dyn Repository>,
    tags: TagPattern,
}

impl<'a> ContentResolver<'a> {
    pub fn new(store: &'a dyn DocumentStore, vcs: Option<&'a dyn Repository>, tags: TagPattern) -> Self {
        ContentResolver { store, vcs, tags }
    }

    pub fn resolve_content(&self, reference: &VersionReference, path: &Path) -> Result<String> {
        match reference {
            VersionReference::WorkingCopy => self.store.read_text(path),
            VersionReference::Semantic(version) => {
                let vcs = self.require_vcs(reference)?;
                let tag_name = self.tags.tag_for(version);
                let commit = vcs.resolve_tag(&tag_name)?.ok_or_else(|| {
                    SpecLedgerError::not_found(format!("tag {} for version {}", tag_name, version))
                })?;
                debug!("Resolved {} to {}", tag_name, commit);
                vcs.content_at_ref(&commit, path)
            }
            VersionReference::VcsRef(revision) => {
                let vcs = self.require_vcs(reference)?;
                vcs.content_at_ref(revision, path)
            }
        }
    }

    fn require_vcs(&self, reference: &VersionReference) -> Result<&'a dyn Repository> {
        self.vcs.ok_or_else(|| {
            SpecLedgerError::VcsUnavailable(format!("resolving {} requires a git repository", reference))
        })
    }
}
