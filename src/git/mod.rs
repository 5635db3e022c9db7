//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! operations the version lifecycle needs, so the engine can run against a
//! real repository or an in-memory double.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation for testing
//!
//! # Usage
//!
//! Engine code takes `Option<&dyn Repository>`; `None` means git is not
//! available and each operation decides whether that is fatal.
//!
//! ```rust
//! # use spec_ledger::git::Repository;
//! # fn example(repo: &dyn Repository) -> Result<(), Box<dyn std::error::Error>> {
//! if let Some(commit) = repo.resolve_tag("v1.0.0")? {
//!     let info = repo.commit_info(&commit)?;
//!     println!("v1.0.0 -> {} {}", info.hash, info.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use serde::Serialize;
use std::path::Path;

/// Commit information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// Commit date, formatted as `YYYY-MM-DD HH:MM:SS +ZZZZ`
    pub date: String,
    /// The commit message
    pub message: String,
    /// The commit author
    pub author: String,
}

impl CommitInfo {
    /// First seven characters of the hash.
    pub fn short_hash(&self) -> &str {
        short_hash(&self.hash)
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Abbreviate a commit hash for display.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

/// Version-control operations used by the version lifecycle.
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map a
/// missing revision or path to [crate::error::SpecLedgerError::NotFound] and a
/// colliding tag to [crate::error::SpecLedgerError::TagExists].
///
/// ## Paths
///
/// Document paths are passed as the caller sees them (absolute or relative to
/// the process working directory); implementations translate them to
/// repository-relative paths.
pub trait Repository {
    /// Whether this handle points at a repository with a working tree.
    fn is_repository(&self) -> bool;

    /// Whether tracked files match HEAD (untracked files are ignored).
    fn is_working_tree_clean(&self) -> Result<bool>;

    /// All tag names in the repository.
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Commit hash a tag points at, or `None` if there is no such tag.
    fn resolve_tag(&self, name: &str) -> Result<Option<String>>;

    /// Details of one commit.
    fn commit_info(&self, hash: &str) -> Result<CommitInfo>;

    /// Stage a single file and commit it on the current HEAD.
    ///
    /// Returns the new commit hash.
    fn stage_and_commit(&self, path: &Path, message: &str) -> Result<String>;

    /// Create an annotated tag at HEAD. Fails if the name is taken.
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Content of `path` as stored at a revision expression.
    fn content_at_ref(&self, reference: &str, path: &Path) -> Result<String>;

    /// Switch the working tree to a revision.
    ///
    /// With `new_branch`, a branch is created at the revision and checked out;
    /// otherwise HEAD is detached. `force` discards local modifications.
    fn checkout_ref(&self, reference: &str, new_branch: Option<&str>, force: bool) -> Result<()>;

    /// Most recent commits reachable from HEAD, newest first.
    fn recent_commits(&self, limit: usize) -> Result<Vec<CommitInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_commit_summary() {
        let info = CommitInfo {
            hash: "0123456789".to_string(),
            date: "2026-01-01 00:00:00 +0000".to_string(),
            message: "Bump to 1.1.0\n\nDetails".to_string(),
            author: "Test".to_string(),
        };
        assert_eq!(info.summary(), "Bump to 1.1.0");
        assert_eq!(info.short_hash(), "0123456");
    }
}
