use crate::error::{Result, SpecLedgerError};
use crate::git::{CommitInfo, Repository};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct MockCommit {
    info: CommitInfo,
    parent: Option<String>,
    files: BTreeMap<PathBuf, String>,
}

#[derive(Debug, Default)]
struct MockState {
    commits: Vec<MockCommit>,
    tags: BTreeMap<String, String>,
    branches: BTreeMap<String, String>,
    head: Option<String>,
    branch: Option<String>,
    dirty: bool,
    fail_commit: bool,
    fail_tag: bool,
    commit_calls: usize,
    tag_calls: usize,
    checkouts: Vec<String>,
}

impl MockState {
    fn find(&self, hash: &str) -> Option<&MockCommit> {
        self.commits.iter().find(|c| c.info.hash == hash)
    }

    fn resolve(&self, reference: &str) -> Option<String> {
        if let Some(rest) = reference.strip_prefix("HEAD") {
            let steps = match rest.strip_prefix('~') {
                Some(n) => n.parse::<usize>().ok()?,
                None if rest.is_empty() => 0,
                None => return None,
            };
            let mut current = self.head.clone()?;
            for _ in 0..steps {
                current = self.find(&current)?.parent.clone()?;
            }
            return Some(current);
        }

        if let Some(hash) = self.tags.get(reference).or_else(|| self.branches.get(reference)) {
            return Some(hash.clone());
        }

        if reference.len() >= 4 {
            let mut matching = self
                .commits
                .iter()
                .filter(|c| c.info.hash.starts_with(reference));
            if let (Some(commit), None) = (matching.next(), matching.next()) {
                return Some(commit.info.hash.clone());
            }
        }
        None
    }

    fn record(&mut self, message: &str, files: BTreeMap<PathBuf, String>) -> String {
        let hash = format!("c{:06x}{}", self.commits.len() + 1, "0".repeat(33));
        let parent = self.head.clone();
        self.commits.push(MockCommit {
            info: CommitInfo {
                hash: hash.clone(),
                date: format!("2026-01-{:02} 12:00:00 +0000", (self.commits.len() % 28) + 1),
                message: message.to_string(),
                author: "Mock Author".to_string(),
            },
            parent,
            files,
        });
        self.head = Some(hash.clone());
        if let Some(branch) = &self.branch {
            self.branches.insert(branch.clone(), hash.clone());
        }
        hash
    }

    fn head_files(&self) -> BTreeMap<PathBuf, String> {
        self.head
            .as_deref()
            .and_then(|h| self.find(h))
            .map(|c| c.files.clone())
            .unwrap_or_default()
    }
}

/// In-memory repository for exercising the engine without libgit2.
///
/// Commits snapshot file contents; `stage_and_commit` reads the file from
/// disk and `checkout_ref` writes the snapshot back, so engine code observes
/// the same effects it would with a real working tree.
pub struct MockRepository {
    state: RefCell<MockState>,
}

impl MockRepository {
    /// Create an empty repository on branch "main"
    pub fn new() -> Self {
        let state = MockState {
            branch: Some("main".to_string()),
            ..MockState::default()
        };
        MockRepository {
            state: RefCell::new(state),
        }
    }

    /// Record a commit containing `path` with `content` on top of HEAD.
    ///
    /// The file on disk is not touched.
    pub fn add_commit(&self, message: &str, path: impl AsRef<Path>, content: &str) -> String {
        let mut state = self.state.borrow_mut();
        let mut files = state.head_files();
        files.insert(path.as_ref().to_path_buf(), content.to_string());
        state.record(message, files)
    }

    /// Add a tag pointing to a commit
    pub fn add_tag(&self, name: impl Into<String>, hash: impl Into<String>) {
        self.state.borrow_mut().tags.insert(name.into(), hash.into());
    }

    /// Pretend tracked files have local modifications
    pub fn set_dirty(&self, dirty: bool) {
        self.state.borrow_mut().dirty = dirty;
    }

    /// Make every subsequent commit fail
    pub fn fail_commits(&self, fail: bool) {
        self.state.borrow_mut().fail_commit = fail;
    }

    /// Make every subsequent tag creation fail
    pub fn fail_tags(&self, fail: bool) {
        self.state.borrow_mut().fail_tag = fail;
    }

    pub fn head(&self) -> Option<String> {
        self.state.borrow().head.clone()
    }

    /// Current branch, or `None` when HEAD is detached.
    pub fn current_branch(&self) -> Option<String> {
        self.state.borrow().branch.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.state.borrow().commits.len()
    }

    /// Number of `stage_and_commit` calls, successful or not.
    pub fn commit_calls(&self) -> usize {
        self.state.borrow().commit_calls
    }

    /// Number of `create_annotated_tag` calls, successful or not.
    pub fn tag_calls(&self) -> usize {
        self.state.borrow().tag_calls
    }

    /// References passed to successful checkouts, in order.
    pub fn checkouts(&self) -> Vec<String> {
        self.state.borrow().checkouts.clone()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn is_repository(&self) -> bool {
        true
    }

    fn is_working_tree_clean(&self) -> Result<bool> {
        Ok(!self.state.borrow().dirty)
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self.state.borrow().tags.keys().cloned().collect())
    }

    fn resolve_tag(&self, name: &str) -> Result<Option<String>> {
        Ok(self.state.borrow().tags.get(name).cloned())
    }

    fn commit_info(&self, hash: &str) -> Result<CommitInfo> {
        let state = self.state.borrow();
        state
            .resolve(hash)
            .and_then(|h| state.find(&h))
            .map(|c| c.info.clone())
            .ok_or_else(|| SpecLedgerError::not_found(format!("commit {}", hash)))
    }

    fn stage_and_commit(&self, path: &Path, message: &str) -> Result<String> {
        let mut state = self.state.borrow_mut();
        state.commit_calls += 1;
        if state.fail_commit {
            return Err(SpecLedgerError::Io(std::io::Error::other(
                "mock commit failure",
            )));
        }

        let content = fs::read_to_string(path)?;
        let mut files = state.head_files();
        files.insert(path.to_path_buf(), content);
        Ok(state.record(message, files))
    }

    fn create_annotated_tag(&self, name: &str, _message: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.tag_calls += 1;
        if state.tags.contains_key(name) {
            return Err(SpecLedgerError::TagExists(name.to_string()));
        }
        if state.fail_tag {
            return Err(SpecLedgerError::Io(std::io::Error::other("mock tag failure")));
        }

        let head = state
            .head
            .clone()
            .ok_or_else(|| SpecLedgerError::not_found("HEAD has no commit to tag"))?;
        state.tags.insert(name.to_string(), head);
        Ok(())
    }

    fn content_at_ref(&self, reference: &str, path: &Path) -> Result<String> {
        let state = self.state.borrow();
        let commit = state
            .resolve(reference)
            .and_then(|h| state.find(&h))
            .ok_or_else(|| SpecLedgerError::not_found(format!("revision '{}'", reference)))?;

        commit.files.get(path).cloned().ok_or_else(|| {
            SpecLedgerError::not_found(format!("{} does not exist at {}", path.display(), reference))
        })
    }

    fn checkout_ref(&self, reference: &str, new_branch: Option<&str>, force: bool) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let hash = state
            .resolve(reference)
            .ok_or_else(|| SpecLedgerError::not_found(format!("revision '{}'", reference)))?;

        if state.dirty && !force {
            return Err(SpecLedgerError::UncommittedChanges);
        }
        if let Some(name) = new_branch {
            if state.branches.contains_key(name) {
                return Err(SpecLedgerError::document(format!(
                    "branch '{}' already exists",
                    name
                )));
            }
        }

        let files = state.find(&hash).map(|c| c.files.clone()).unwrap_or_default();
        for (path, content) in &files {
            fs::write(path, content)?;
        }

        match new_branch {
            Some(name) => {
                state.branches.insert(name.to_string(), hash.clone());
                state.branch = Some(name.to_string());
            }
            None => state.branch = None,
        }
        state.head = Some(hash);
        state.dirty = false;
        state.checkouts.push(reference.to_string());
        Ok(())
    }

    fn recent_commits(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        let state = self.state.borrow();
        let mut commits = Vec::new();
        let mut current = state.head.clone();
        while let Some(hash) = current {
            if commits.len() >= limit {
                break;
            }
            match state.find(&hash) {
                Some(commit) => {
                    commits.push(commit.info.clone());
                    current = commit.parent.clone();
                }
                None => break,
            }
        }
        Ok(commits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mock_commits_and_tags() {
        let mock = MockRepository::new();
        let first = mock.add_commit("one", "doc.yaml", "a: 1\n");
        mock.add_tag("v1.0.0", first.clone());
        let second = mock.add_commit("two", "doc.yaml", "a: 2\n");

        assert_eq!(mock.resolve_tag("v1.0.0").unwrap(), Some(first.clone()));
        assert_eq!(mock.resolve_tag("v2.0.0").unwrap(), None);
        assert_eq!(mock.head(), Some(second));
        assert_eq!(
            mock.content_at_ref("v1.0.0", Path::new("doc.yaml")).unwrap(),
            "a: 1\n"
        );
        assert_eq!(
            mock.content_at_ref("HEAD~1", Path::new("doc.yaml")).unwrap(),
            "a: 1\n"
        );
        assert_eq!(
            mock.content_at_ref(&first[..7], Path::new("doc.yaml")).unwrap(),
            "a: 1\n"
        );
        assert!(mock.content_at_ref("nope", Path::new("doc.yaml")).is_err());
    }

    #[test]
    fn test_mock_stage_and_commit_reads_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.yaml");
        fs::write(&path, "x: 1\n").unwrap();

        let mock = MockRepository::new();
        let hash = mock.stage_and_commit(&path, "commit").unwrap();
        assert_eq!(mock.content_at_ref(&hash, &path).unwrap(), "x: 1\n");
        assert_eq!(mock.commit_calls(), 1);

        mock.create_annotated_tag("v1.0.0", "Version 1.0.0").unwrap();
        assert!(matches!(
            mock.create_annotated_tag("v1.0.0", "again"),
            Err(SpecLedgerError::TagExists(_))
        ));
    }

    #[test]
    fn test_mock_failure_toggles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.yaml");
        fs::write(&path, "x: 1\n").unwrap();

        let mock = MockRepository::new();
        mock.fail_commits(true);
        assert!(mock.stage_and_commit(&path, "commit").is_err());
        assert_eq!(mock.commit_count(), 0);

        mock.fail_commits(false);
        mock.stage_and_commit(&path, "commit").unwrap();
        mock.fail_tags(true);
        assert!(mock.create_annotated_tag("v1.0.0", "msg").is_err());
        assert_eq!(mock.tag_calls(), 1);
    }

    #[test]
    fn test_mock_checkout_restores_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.yaml");

        let mock = MockRepository::new();
        let first = mock.add_commit("one", &path, "v: 1\n");
        mock.add_tag("v1.0.0", first.clone());
        mock.add_commit("two", &path, "v: 2\n");

        mock.checkout_ref("v1.0.0", None, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v: 1\n");
        assert_eq!(mock.current_branch(), None);
        assert_eq!(mock.head(), Some(first));

        mock.checkout_ref("HEAD", Some("hotfix"), false).unwrap();
        assert_eq!(mock.current_branch().as_deref(), Some("hotfix"));
        assert_eq!(mock.checkouts(), vec!["v1.0.0", "HEAD"]);
    }

    #[test]
    fn test_mock_dirty_checkout_requires_force() {
        let mock = MockRepository::new();
        let dir = TempDir::new().unwrap();
        let first = mock.add_commit("one", dir.path().join("doc.yaml"), "v: 1\n");
        mock.set_dirty(true);

        assert!(matches!(
            mock.checkout_ref(&first, None, false),
            Err(SpecLedgerError::UncommittedChanges)
        ));
        mock.checkout_ref(&first, None, true).unwrap();
        assert!(mock.is_working_tree_clean().unwrap());
    }

    #[test]
    fn test_mock_recent_commits_newest_first() {
        let mock = MockRepository::new();
        mock.add_commit("one", "doc.yaml", "1");
        mock.add_commit("two", "doc.yaml", "2");
        mock.add_commit("three", "doc.yaml", "3");

        let recent = mock.recent_commits(2).unwrap();
        let messages: Vec<_> = recent.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["three", "two"]);
    }
}
