use crate::error::{Result, SpecLedgerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of structural change recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Add,
    Remove,
    Modify,
    Rename,
    Deprecate,
}

impl ChangeOp {
    pub const ALL: [ChangeOp; 5] = [
        ChangeOp::Add,
        ChangeOp::Remove,
        ChangeOp::Modify,
        ChangeOp::Rename,
        ChangeOp::Deprecate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOp::Add => "add",
            ChangeOp::Remove => "remove",
            ChangeOp::Modify => "modify",
            ChangeOp::Rename => "rename",
            ChangeOp::Deprecate => "deprecate",
        }
    }
}

impl FromStr for ChangeOp {
    type Err = SpecLedgerError;

    fn from_str(s: &str) -> Result<Self> {
        ChangeOp::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                SpecLedgerError::format(format!(
                    "Unknown change operation '{}' (expected add, remove, modify, rename or deprecate)",
                    s
                ))
            })
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured change attached to a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    #[serde(alias = "operation")]
    pub op: ChangeOp,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

impl ChangeEntry {
    pub fn new(op: ChangeOp, target: impl Into<String>) -> Self {
        ChangeEntry {
            op,
            target: target.into(),
            field: None,
            r#type: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_type(mut self, r#type: impl Into<String>) -> Self {
        self.r#type = Some(r#type.into());
        self
    }

    /// Parse a CLI change spec of the form `op:target[:field[:type]]`.
    ///
    /// Empty `field`/`type` segments are treated as absent, so `add:user::uuid`
    /// records a type without a field.
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split(':').collect();
        if parts.len() < 2 || parts.len() > 4 {
            return Err(SpecLedgerError::format(format!(
                "Invalid change '{}' - expected op:target[:field[:type]]",
                spec
            )));
        }

        let op = parts[0].trim().parse::<ChangeOp>()?;
        let optional = |idx: usize| {
            parts
                .get(idx)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        let entry = ChangeEntry {
            op,
            target: parts[1].trim().to_string(),
            field: optional(2),
            r#type: optional(3),
        };
        entry.check().map_err(SpecLedgerError::format)?;
        Ok(entry)
    }

    /// Structural validity of an entry, independent of document content.
    fn check(&self) -> std::result::Result<(), String> {
        if self.target.trim().is_empty() {
            return Err("target must not be empty".to_string());
        }
        if self.target.chars().any(char::is_whitespace) {
            return Err(format!("target '{}' must not contain whitespace", self.target));
        }
        if matches!(&self.field, Some(f) if f.trim().is_empty()) {
            return Err("field must not be blank when present".to_string());
        }
        if matches!(&self.r#type, Some(t) if t.trim().is_empty()) {
            return Err("type must not be blank when present".to_string());
        }
        Ok(())
    }

    /// Human-readable form: `op: target.field (type)`
    pub fn describe(&self) -> String {
        let mut out = format!("{}: {}", self.op, self.target);
        if let Some(field) = &self.field {
            out.push('.');
            out.push_str(field);
        }
        if let Some(r#type) = &self.r#type {
            out.push_str(&format!(" ({})", r#type));
        }
        out
    }
}

/// Validate every entry up front, reporting the first bad one with its position.
pub fn validate_changes(changes: &[ChangeEntry]) -> Result<()> {
    for (index, change) in changes.iter().enumerate() {
        change
            .check()
            .map_err(|reason| SpecLedgerError::InvalidChange { index, reason })?;
    }
    Ok(())
}

/// Parse a list of CLI change specs, reporting the position of the first bad one.
pub fn parse_change_specs<S: AsRef<str>>(specs: &[S]) -> Result<Vec<ChangeEntry>> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            ChangeEntry::parse(spec.as_ref()).map_err(|e| SpecLedgerError::InvalidChange {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}
