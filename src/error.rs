use thiserror::Error;

/// Unified error type for spec-ledger operations
#[derive(Error, Debug)]
pub enum SpecLedgerError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid change entry #{index}: {reason}")]
    InvalidChange { index: usize, reason: String },

    #[error("Version control unavailable: {0}")]
    VcsUnavailable(String),

    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("Working tree has uncommitted changes")]
    UncommittedChanges,

    #[error("Tag {0} already exists")]
    TagExists(String),

    #[error("Tag {tag} not found")]
    TagNotFound { tag: String, available: Vec<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document is locked by another process: {0}")]
    LockBusy(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in spec-ledger
pub type Result<T> = std::result::Result<T, SpecLedgerError>;

/// Coarse error category used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unparseable version, malformed change entry or contradictory request.
    /// Raised before any mutation.
    Format,
    /// Repository or working-tree state prevents the operation.
    State,
    /// The specification document or configuration could not be understood.
    Document,
    /// Underlying filesystem or libgit2 failure.
    Io,
}

impl SpecLedgerError {
    /// Create a format error with context
    pub fn format(msg: impl Into<String>) -> Self {
        SpecLedgerError::Format(msg.into())
    }

    /// Create a not-found error with context
    pub fn not_found(msg: impl Into<String>) -> Self {
        SpecLedgerError::NotFound(msg.into())
    }

    /// Create a document error with context
    pub fn document(msg: impl Into<String>) -> Self {
        SpecLedgerError::Document(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        SpecLedgerError::Config(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SpecLedgerError::Format(_) | SpecLedgerError::InvalidChange { .. } => ErrorKind::Format,
            SpecLedgerError::VcsUnavailable(_)
            | SpecLedgerError::NotARepository(_)
            | SpecLedgerError::UncommittedChanges
            | SpecLedgerError::TagExists(_)
            | SpecLedgerError::TagNotFound { .. }
            | SpecLedgerError::NotFound(_)
            | SpecLedgerError::LockBusy(_) => ErrorKind::State,
            SpecLedgerError::Document(_)
            | SpecLedgerError::Config(_)
            | SpecLedgerError::Yaml(_) => ErrorKind::Document,
            SpecLedgerError::Git(_) | SpecLedgerError::Io(_) => ErrorKind::Io,
        }
    }

    /// Remediation hint for state errors that have an obvious fix.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            SpecLedgerError::UncommittedChanges => {
                Some("Use --force to discard changes, or commit/stash first".to_string())
            }
            SpecLedgerError::TagExists(tag) => Some(format!(
                "Choose a different version or delete the stale tag: git tag -d {}",
                tag
            )),
            SpecLedgerError::VcsUnavailable(_) => {
                Some("Pass --no-commit --no-tag to update the document only".to_string())
            }
            SpecLedgerError::LockBusy(path) => Some(format!(
                "Wait for the other invocation to finish, or remove {} if it is stale",
                path
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpecLedgerError::format("bad version");
        assert_eq!(err.to_string(), "Format error: bad version");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SpecLedgerError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_invalid_change_carries_index() {
        let err = SpecLedgerError::InvalidChange {
            index: 2,
            reason: "empty target".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid change entry #2: empty target");
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_state_errors_are_classified() {
        let errors = vec![
            SpecLedgerError::UncommittedChanges,
            SpecLedgerError::TagExists("v1.0.0".to_string()),
            SpecLedgerError::NotARepository(".".to_string()),
            SpecLedgerError::VcsUnavailable("no git".to_string()),
            SpecLedgerError::TagNotFound {
                tag: "v2.0.0".to_string(),
                available: vec![],
            },
        ];

        for err in errors {
            assert_eq!(err.kind(), ErrorKind::State, "{}", err);
        }
    }

    #[test]
    fn test_suggestions() {
        assert!(SpecLedgerError::UncommittedChanges
            .suggestion()
            .unwrap()
            .contains("--force"));
        assert!(SpecLedgerError::TagExists("v1.2.0".to_string())
            .suggestion()
            .unwrap()
            .contains("git tag -d v1.2.0"));
        assert!(SpecLedgerError::format("x").suggestion().is_none());
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (SpecLedgerError::format("x"), "Format error"),
            (SpecLedgerError::not_found("x"), "Not found"),
            (SpecLedgerError::document("x"), "Document error"),
            (SpecLedgerError::config("x"), "Configuration error"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
