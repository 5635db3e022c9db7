use crate::domain::{SemanticVersion, TagPattern};
use std::fmt;

/// What a diff or resolve call points at.
///
/// Built once at the command-line boundary so the engine never has to guess
/// from the shape of a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionReference {
    /// A released version, located through its tag.
    Semantic(SemanticVersion),
    /// Any revision expression git understands (HEAD~1, a hash, a branch).
    VcsRef(String),
    /// The live document on disk, committed or not.
    WorkingCopy,
}

impl VersionReference {
    /// Classify user input: anything that is a version once the tag prefix is
    /// stripped is semantic, everything else is handed to git untouched.
    pub fn parse(input: &str, tags: &TagPattern) -> Self {
        let trimmed = input.trim();
        match SemanticVersion::parse(tags.strip(trimmed)) {
            Ok(version) => VersionReference::Semantic(version),
            Err(_) => VersionReference::VcsRef(trimmed.to_string()),
        }
    }

    /// Like [`VersionReference::parse`], with an absent argument meaning the working copy.
    pub fn parse_optional(input: Option<&str>, tags: &TagPattern) -> Self {
        match input {
            Some(raw) => VersionReference::parse(raw, tags),
            None => VersionReference::WorkingCopy,
        }
    }
}

impl fmt::Display for VersionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionReference::Semantic(version) => write!(f, "v{}", version),
            VersionReference::VcsRef(reference) => f.write_str(reference),
            VersionReference::WorkingCopy => f.write_str("working copy"),
        }
    }
}
