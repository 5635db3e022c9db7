use crate::git::short_hash;
use std::fmt;

/// Non-fatal conditions around the edges of the repository and the document.
/// These are reported to the user but do not by themselves fail a command.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No git repository was found; only document-level operations are possible
    VcsUnavailable { reason: String },
    /// The working tree was left on a commit without a branch
    DetachedHead { tag: String, commit_hash: String },
    /// Local modifications were thrown away by a forced checkout
    DiscardedChanges,
    /// A bump left the document (and maybe a commit) behind after a later step failed
    PartialBump { version: String, detail: String },
    /// The document at a tag does not declare the tag's version
    DocumentVersionDrift {
        tag: String,
        expected: String,
        found: Option<String>,
    },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::VcsUnavailable { reason } => {
                write!(f, "Git is unavailable ({}); git features are disabled", reason)
            }
            BoundaryWarning::DetachedHead { tag, commit_hash } => {
                write!(
                    f,
                    "You are in 'detached HEAD' state at {} ({}); commits made here belong to no branch",
                    tag,
                    short_hash(commit_hash)
                )
            }
            BoundaryWarning::DiscardedChanges => {
                write!(f, "Uncommitted changes were discarded")
            }
            BoundaryWarning::PartialBump { version, detail } => {
                write!(f, "Version {} was only partially applied: {}", version, detail)
            }
            BoundaryWarning::DocumentVersionDrift {
                tag,
                expected,
                found,
            } => match found {
                Some(found) => write!(
                    f,
                    "Document at {} declares version {} instead of {}",
                    tag, found, expected
                ),
                None => write!(
                    f,
                    "Document at {} has no readable version (expected {})",
                    tag, expected
                ),
            },
        }
    }
}
