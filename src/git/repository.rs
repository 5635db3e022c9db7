use crate::error::{Result, SpecLedgerError};
use crate::git::CommitInfo;
use chrono::{DateTime, FixedOffset, Utc};
use git2::build::CheckoutBuilder;
use git2::{ErrorCode, Object, Repository as Git2Repo, StatusOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Git2Repo::discover(path) {
            Ok(repo) => Ok(Git2Repository { repo }),
            Err(e) if e.code() == ErrorCode::NotFound => {
                Err(SpecLedgerError::NotARepository(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| SpecLedgerError::NotARepository("bare repository".to_string()))
    }

    /// Translate a caller path into a path relative to the working tree root.
    fn relative_path(&self, path: &Path) -> Result<PathBuf> {
        let workdir = fs::canonicalize(self.workdir()?)?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        // The file may not exist in the working tree (e.g. after a checkout),
        // so fall back to canonicalizing its parent.
        let resolved = match fs::canonicalize(&absolute) {
            Ok(resolved) => resolved,
            Err(_) => {
                let parent = absolute.parent().unwrap_or(Path::new("."));
                let file_name = absolute.file_name().ok_or_else(|| {
                    SpecLedgerError::not_found(format!("{} has no file name", path.display()))
                })?;
                fs::canonicalize(parent)?.join(file_name)
            }
        };

        resolved
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                SpecLedgerError::not_found(format!(
                    "{} is outside the repository at {}",
                    path.display(),
                    workdir.display()
                ))
            })
    }

    fn revparse(&self, reference: &str) -> Result<Object<'_>> {
        self.repo.revparse_single(reference).map_err(|e| match e.code() {
            ErrorCode::NotFound | ErrorCode::InvalidSpec | ErrorCode::Ambiguous => {
                SpecLedgerError::not_found(format!("revision '{}' ({})", reference, e.message()))
            }
            _ => e.into(),
        })
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn to_commit_info(commit: &git2::Commit) -> CommitInfo {
        CommitInfo {
            hash: commit.id().to_string(),
            date: format_time(commit.time()),
            message: commit.message().unwrap_or("").trim_end().to_string(),
            author: commit.author().name().unwrap_or("unknown").to_string(),
        }
    }
}

fn format_time(time: git2::Time) -> String {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60);
    match (DateTime::<Utc>::from_timestamp(time.seconds(), 0), offset) {
        (Some(utc), Some(offset)) => utc
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S %z")
            .to_string(),
        _ => time.seconds().to_string(),
    }
}

impl super::Repository for Git2Repository {
    fn is_repository(&self) -> bool {
        !self.repo.is_bare()
    }

    fn is_working_tree_clean(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.is_empty())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn resolve_tag(&self, name: &str) -> Result<Option<String>> {
        let reference_name = format!("refs/tags/{}", name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?.id().to_string())),
            Err(e) if e.code() == ErrorCode::NotFound || e.code() == ErrorCode::InvalidSpec => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn commit_info(&self, hash: &str) -> Result<CommitInfo> {
        let commit = self.revparse(hash)?.peel_to_commit()?;
        Ok(Self::to_commit_info(&commit))
    }

    fn stage_and_commit(&self, path: &Path, message: &str) -> Result<String> {
        let relative = self.relative_path(path)?;
        debug!("Staging {:?}", relative);

        let mut index = self.repo.index()?;
        index.add_path(&relative)?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;

        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        // Persist the staged entry only once the commit exists.
        index.write()?;
        debug!("Created commit {}", oid);
        Ok(oid.to_string())
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        if self.resolve_tag(name)?.is_some() {
            return Err(SpecLedgerError::TagExists(name.to_string()));
        }

        let head = self
            .head_commit()?
            .ok_or_else(|| SpecLedgerError::not_found("HEAD has no commit to tag"))?;
        let signature = self.repo.signature()?;

        match self
            .repo
            .tag(name, head.as_object(), &signature, message, false)
        {
            Ok(oid) => {
                debug!("Created tag {} ({})", name, oid);
                Ok(())
            }
            Err(e) if e.code() == ErrorCode::Exists => {
                Err(SpecLedgerError::TagExists(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn content_at_ref(&self, reference: &str, path: &Path) -> Result<String> {
        let relative = self.relative_path(path)?;
        let commit = self.revparse(reference)?.peel_to_commit()?;
        let tree = commit.tree()?;

        let entry = tree.get_path(&relative).map_err(|e| match e.code() {
            ErrorCode::NotFound => SpecLedgerError::not_found(format!(
                "{} does not exist at {}",
                relative.display(),
                reference
            )),
            _ => e.into(),
        })?;

        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        let content = std::str::from_utf8(blob.content()).map_err(|_| {
            SpecLedgerError::document(format!(
                "{} at {} is not valid UTF-8",
                relative.display(),
                reference
            ))
        })?;
        Ok(content.to_string())
    }

    fn checkout_ref(&self, reference: &str, new_branch: Option<&str>, force: bool) -> Result<()> {
        let commit = self.revparse(reference)?.peel_to_commit()?;

        let mut builder = CheckoutBuilder::new();
        if force {
            builder.force();
        } else {
            builder.safe();
        }

        match new_branch {
            Some(name) => {
                // Create the branch first so a name clash leaves the tree untouched.
                let mut branch = self.repo.branch(name, &commit, false)?;
                let ref_name = format!("refs/heads/{}", name);

                let switched = self
                    .repo
                    .checkout_tree(commit.as_object(), Some(&mut builder))
                    .and_then(|()| self.repo.set_head(&ref_name));
                if let Err(e) = switched {
                    if let Err(cleanup) = branch.delete() {
                        warn!("Could not remove branch {} after failed checkout: {}", name, cleanup);
                    }
                    return Err(e.into());
                }
                debug!("Checked out new branch {} at {}", name, commit.id());
            }
            None => {
                self.repo
                    .checkout_tree(commit.as_object(), Some(&mut builder))?;
                self.repo.set_head_detached(commit.id())?;
                debug!("Detached HEAD at {}", commit.id());
            }
        }

        Ok(())
    }

    fn recent_commits(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        match revwalk.push_head() {
            Ok(()) => {}
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        }
        revwalk.set_sorting(git2::Sort::TIME)?;

        revwalk
            .take(limit)
            .map(|oid| -> Result<CommitInfo> {
                let commit = self.repo.find_commit(oid?)?;
                Ok(Self::to_commit_info(&commit))
            })
            .collect()
    }
}
