use crate::domain::{ChangeEntry, SemanticVersion};
use serde::{Deserialize, Serialize};

/// One ledger entry, appended per bump and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub version: SemanticVersion,
    #[serde(rename = "basedOn", default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<SemanticVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub changes: Vec<ChangeEntry>,
}

impl HistoryEntry {
    pub fn new(version: SemanticVersion) -> Self {
        HistoryEntry {
            version,
            based_on: None,
            notes: None,
            changes: Vec::new(),
        }
    }
}

/// Where a released version sits in git. Resolved on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitAnchor {
    pub tag_name: String,
    pub commit_hash: String,
    pub commit_date: String,
    pub commit_message: String,
}

/// A ledger entry plus its git anchor, if the tag could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchoredEntry {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitAnchor>,
}

impl From<HistoryEntry> for AnchoredEntry {
    fn from(entry: HistoryEntry) -> Self {
        AnchoredEntry { entry, git: None }
    }
}

/// Anything ordered by a semantic version.
pub trait Versioned {
    fn version(&self) -> SemanticVersion;
}

impl Versioned for HistoryEntry {
    fn version(&self) -> SemanticVersion {
        self.version
    }
}

impl Versioned for AnchoredEntry {
    fn version(&self) -> SemanticVersion {
        self.entry.version
    }
}

/// Sort newest first by numeric version order. Stable for equal versions.
pub fn sort_newest_first<T: Versioned>(entries: &mut [T]) {
    entries.sort_by(|a, b| b.version().cmp(&a.version()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChangeOp;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn test_sort_is_numeric_not_lexical() {
        let mut entries = vec![
            HistoryEntry::new(v("2.9.0")),
            HistoryEntry::new(v("2.10.0")),
            HistoryEntry::new(v("1.0.0")),
        ];
        sort_newest_first(&mut entries);
        let order: Vec<String> = entries.iter().map(|e| e.version.to_string()).collect();
        assert_eq!(order, vec!["2.10.0", "2.9.0", "1.0.0"]);
    }

    #[test]
    fn test_entry_yaml_uses_based_on_key() {
        let mut entry = HistoryEntry::new(v("1.3.0"));
        entry.based_on = Some(v("1.2.3"));
        entry.notes = Some("add field".to_string());
        entry.changes.push(ChangeEntry::new(ChangeOp::Add, "entity.user"));

        let yaml = serde_yaml::to_string(&entry).unwrap();
        assert!(yaml.contains("basedOn: 1.2.3"));
        assert!(yaml.contains("notes: add field"));

        let back: HistoryEntry = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_entry_without_optional_fields() {
        let entry: HistoryEntry = serde_yaml::from_str("version: 1.0.0\n").unwrap();
        assert_eq!(entry.based_on, None);
        assert!(entry.changes.is_empty());
    }

    #[test]
    fn test_anchored_entry_json_is_flat() {
        let anchored = AnchoredEntry {
            entry: HistoryEntry::new(v("1.0.0")),
            git: Some(GitAnchor {
                tag_name: "v1.0.0".to_string(),
                commit_hash: "abc1234".to_string(),
                commit_date: "2026-01-01".to_string(),
                commit_message: "initial".to_string(),
            }),
        };
        let json = serde_json::to_value(&anchored).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["git"]["tagName"], "v1.0.0");
    }
}
