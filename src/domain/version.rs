use crate::error::{Result, SpecLedgerError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Semantic version of the specification document.
///
/// Field order matters: the derived `Ord` compares major, then minor, then
/// patch, numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse a plain dotted triple such as "1.2.3".
    ///
    /// No prefix, whitespace, pre-release or build metadata is accepted.
    pub fn parse(input: &str) -> Result<Self> {
        let parsed = semver::Version::parse(input).map_err(|e| {
            SpecLedgerError::format(format!(
                "Invalid version '{}' - expected X.Y.Z ({})",
                input, e
            ))
        })?;

        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(SpecLedgerError::format(format!(
                "Invalid version '{}' - pre-release and build metadata are not supported",
                input
            )));
        }

        Ok(SemanticVersion::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// Compute the next version for a bump type.
    pub fn bump(&self, bump_type: BumpType) -> Result<Self> {
        let overflow = || {
            SpecLedgerError::format(format!(
                "Cannot apply {} bump to {}: component overflow",
                bump_type, self
            ))
        };

        let next = match bump_type {
            BumpType::Major => SemanticVersion::new(
                self.major.checked_add(1).ok_or_else(overflow)?,
                0,
                0,
            ),
            BumpType::Minor => SemanticVersion::new(
                self.major,
                self.minor.checked_add(1).ok_or_else(overflow)?,
                0,
            ),
            BumpType::Patch => SemanticVersion::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        };

        Ok(next)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = SpecLedgerError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SemanticVersion::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Version bump type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    Major,
    Minor,
    Patch,
}

impl FromStr for BumpType {
    type Err = SpecLedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "major" => Ok(BumpType::Major),
            "minor" => Ok(BumpType::Minor),
            "patch" => Ok(BumpType::Patch),
            other => Err(SpecLedgerError::format(format!(
                "Invalid bump type '{}' - specify major, minor, or patch",
                other
            ))),
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BumpType::Major => "major",
            BumpType::Minor => "minor",
            BumpType::Patch => "patch",
        };
        f.write_str(name)
    }
}
