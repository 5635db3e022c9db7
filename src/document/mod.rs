//! The specification document and its on-disk handling.
//!
//! The document is YAML. Only the version field and the history ledger are
//! interpreted here; every other key is carried through untouched so that a
//! rewrite never loses or reorders domain content. A document parsed from
//! text is written back by editing that text, which also keeps comments and
//! formatting.

mod edit;
pub mod lock;
pub mod store;

pub use lock::DocumentLock;
pub use store::{DocumentStore, FsDocumentStore};

use crate::domain::{HistoryEntry, SemanticVersion};
use crate::error::{Result, SpecLedgerError};
use serde_yaml::{Mapping, Value};
use tracing::debug;

const PROJECT_KEY: &str = "project";
const VERSIONING_KEY: &str = "versioning";
const CURRENT_KEY: &str = "current";
const HISTORY_KEY: &str = "history";

/// Parsed specification document.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    root: Mapping,
    history: Vec<HistoryEntry>,
    /// Text the document was parsed from.
    source: Option<String>,
    /// Ledger length in `source`.
    recorded: usize,
}

impl PartialEq for SpecDocument {
    fn eq(&self, other: &Self) -> bool {
        self.history == other.history
            && without_history(&self.root) == without_history(&other.root)
    }
}

impl SpecDocument {
    /// Parse a document from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content)?;
        let mut root = match value {
            Value::Mapping(map) => map,
            Value::Null => {
                return Err(SpecLedgerError::document("document is empty"));
            }
            _ => {
                return Err(SpecLedgerError::document(
                    "document root must be a YAML mapping",
                ));
            }
        };

        let history: Vec<HistoryEntry> = match root.get_mut(HISTORY_KEY) {
            None => Vec::new(),
            // Keep the key's position; its value is rebuilt on serialization.
            Some(slot) => match std::mem::replace(slot, Value::Null) {
                Value::Null => Vec::new(),
                ledger => serde_yaml::from_value(ledger).map_err(|e| {
                    SpecLedgerError::document(format!("invalid history ledger: {}", e))
                })?,
            },
        };

        Ok(SpecDocument {
            root,
            recorded: history.len(),
            history,
            source: Some(content.to_string()),
        })
    }

    /// Serialize back to YAML, ledger included.
    ///
    /// Edits the source text in place when it can, so only the version line
    /// and the appended ledger entries differ from what was read.
    pub fn to_yaml_string(&self) -> Result<String> {
        if let Some(text) = self.edit_source()? {
            return Ok(text);
        }
        let mut root = self.root.clone();
        root.insert(key(HISTORY_KEY), serde_yaml::to_value(&self.history)?);
        Ok(serde_yaml::to_string(&Value::Mapping(root))?)
    }

    fn edit_source(&self) -> Result<Option<String>> {
        let source = match &self.source {
            Some(source) => source,
            None => return Ok(None),
        };

        let mut text = source.clone();
        if let Some(version) = self.version_raw() {
            text = match edit::replace_current_version(&text, &version) {
                Some(edited) => edited,
                None => return Ok(None),
            };
        }

        let appended = &self.history[self.recorded.min(self.history.len())..];
        if !appended.is_empty() {
            let items = serde_yaml::to_string(appended)?;
            text = match edit::append_history(&text, &items) {
                Some(edited) => edited,
                None => return Ok(None),
            };
        }

        match SpecDocument::from_yaml_str(&text) {
            Ok(reparsed) if reparsed == *self => Ok(Some(text)),
            _ => {
                debug!("In-place edit did not read back as the document; rewriting it whole");
                Ok(None)
            }
        }
    }

    /// The declared version exactly as written, if there is a scalar there.
    pub fn version_raw(&self) -> Option<String> {
        let current = self
            .root
            .get(PROJECT_KEY)?
            .get(VERSIONING_KEY)?
            .get(CURRENT_KEY)?;
        match current {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The declared version, strictly parsed.
    pub fn version(&self) -> Result<SemanticVersion> {
        let raw = self.version_raw().ok_or_else(|| {
            SpecLedgerError::format(format!(
                "document has no {}.{}.{} version",
                PROJECT_KEY, VERSIONING_KEY, CURRENT_KEY
            ))
        })?;
        SemanticVersion::parse(&raw)
    }

    /// Ledger in append order.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The most recently appended entry.
    pub fn latest_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    pub fn records_version(&self, version: &SemanticVersion) -> bool {
        self.history.iter().any(|e| &e.version == version)
    }

    /// Record a bump: append the entry and move the declared version to it.
    ///
    /// Refuses an entry whose version is already in the ledger.
    pub fn apply_entry(&mut self, entry: HistoryEntry) -> Result<()> {
        if self.records_version(&entry.version) {
            return Err(SpecLedgerError::document(format!(
                "history already records version {}",
                entry.version
            )));
        }
        self.set_version(&entry.version);
        self.history.push(entry);
        Ok(())
    }

    fn set_version(&mut self, version: &SemanticVersion) {
        let project = child_mapping(&mut self.root, PROJECT_KEY);
        let versioning = child_mapping(project, VERSIONING_KEY);
        versioning.insert(key(CURRENT_KEY), Value::String(version.to_string()));
    }
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn without_history(root: &Mapping) -> Mapping {
    let mut root = root.clone();
    root.remove(HISTORY_KEY);
    root
}

/// Get the mapping under `name`, replacing anything that is not a mapping.
fn child_mapping<'a>(parent: &'a mut Mapping, name: &str) -> &'a mut Mapping {
    let needs_reset = !matches!(parent.get(name), Some(Value::Mapping(_)));
    if needs_reset {
        parent.insert(key(name), Value::Mapping(Mapping::new()));
    }
    match parent.get_mut(name) {
        Some(Value::Mapping(map)) => map,
        _ => unreachable!("mapping inserted above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"spec: spec-ledger/v1
project:
  id: myapp
  versioning:
    strategy: semver
    current: "1.2.3"
domain:
  nodes:
    - kind: Entity
      id: entity.user
history:
  - version: 1.2.3
    notes: Initial version
    changes: []
"#;

    #[test]
    fn test_parse_sample() {
        let doc = SpecDocument::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(doc.version().unwrap(), SemanticVersion::new(1, 2, 3));
        assert_eq!(doc.history().len(), 1);
        assert_eq!(
            doc.latest_entry().unwrap().version,
            SemanticVersion::new(1, 2, 3)
        );
    }

    #[test]
    fn test_apply_entry_updates_version_and_ledger() {
        let mut doc = SpecDocument::from_yaml_str(SAMPLE).unwrap();
        let mut entry = HistoryEntry::new(SemanticVersion::new(1, 3, 0));
        entry.based_on = Some(SemanticVersion::new(1, 2, 3));
        doc.apply_entry(entry).unwrap();

        assert_eq!(doc.version().unwrap(), SemanticVersion::new(1, 3, 0));
        assert_eq!(doc.history().len(), 2);

        let reparsed = SpecDocument::from_yaml_str(&doc.to_yaml_string().unwrap()).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn test_apply_entry_rejects_duplicate_version() {
        let mut doc = SpecDocument::from_yaml_str(SAMPLE).unwrap();
        let result = doc.apply_entry(HistoryEntry::new(SemanticVersion::new(1, 2, 3)));
        assert!(result.is_err());
        assert_eq!(doc.history().len(), 1);
    }

    #[test]
    fn test_unknown_content_is_preserved_in_order() {
        let doc = SpecDocument::from_yaml_str(SAMPLE).unwrap();
        let out = doc.to_yaml_string().unwrap();
        let spec_pos = out.find("spec:").unwrap();
        let domain_pos = out.find("domain:").unwrap();
        let history_pos = out.find("history:").unwrap();
        assert!(spec_pos < domain_pos && domain_pos < history_pos);
        assert!(out.contains("entity.user"));
    }

    #[test]
    fn test_bad_version_is_readable_but_not_parseable() {
        let doc = SpecDocument::from_yaml_str(&SAMPLE.replace("\"1.2.3\"", "\"1.2\"")).unwrap();
        assert_eq!(doc.version_raw().as_deref(), Some("1.2"));
        assert!(doc.version().is_err());
    }

    #[test]
    fn test_missing_history_is_empty() {
        let doc = SpecDocument::from_yaml_str(
            "project:\n  versioning:\n    current: \"0.1.0\"\n",
        )
        .unwrap();
        assert!(doc.history().is_empty());
    }

    #[test]
    fn test_invalid_documents() {
        assert!(SpecDocument::from_yaml_str("").is_err());
        assert!(SpecDocument::from_yaml_str("- a\n- b\n").is_err());
        assert!(SpecDocument::from_yaml_str("history:\n  - version: nope\n").is_err());
    }

    const ANNOTATED: &str = r#"# Shop specification, owned by the platform team
spec: spec-ledger/v1
project:
  id: shop
  versioning:
    strategy: semver
    current: "1.0.0" # bumped by tooling
domain:
  tags: [a, b]
  nodes: [{kind: Entity, id: entity.order}]
history:
  - version: 1.0.0
    notes: Initial version
    changes: []

# end of ledger
"#;

    #[test]
    fn test_bump_keeps_comments_and_flow_style() {
        let mut doc = SpecDocument::from_yaml_str(ANNOTATED).unwrap();
        let mut entry = HistoryEntry::new(SemanticVersion::new(1, 0, 1));
        entry.based_on = Some(SemanticVersion::new(1, 0, 0));
        doc.apply_entry(entry).unwrap();

        let out = doc.to_yaml_string().unwrap();
        assert!(out.starts_with("# Shop specification, owned by the platform team\n"));
        assert!(out.contains("    current: \"1.0.1\" # bumped by tooling\n"));
        assert!(out.contains("  tags: [a, b]\n"));
        assert!(out.contains("  nodes: [{kind: Entity, id: entity.order}]\n"));
        assert!(out.ends_with("\n# end of ledger\n"), "{}", out);

        let initial = out.find("  - version: 1.0.0").unwrap();
        let appended = out.find("  - version: 1.0.1").unwrap();
        assert!(initial < appended && appended < out.find("# end of ledger").unwrap());

        let reparsed = SpecDocument::from_yaml_str(&out).unwrap();
        assert_eq!(reparsed, doc);
        assert_eq!(reparsed.history().len(), 2);
    }

    #[test]
    fn test_unchanged_document_is_written_back_verbatim() {
        let doc = SpecDocument::from_yaml_str(ANNOTATED).unwrap();
        assert_eq!(doc.to_yaml_string().unwrap(), ANNOTATED);
    }

    #[test]
    fn test_uneditable_layout_falls_back_to_full_rewrite() {
        let mut doc = SpecDocument::from_yaml_str(
            "project: {id: app, versioning: {current: \"0.1.0\"}}\nhistory: []\n",
        )
        .unwrap();
        doc.apply_entry(HistoryEntry::new(SemanticVersion::new(0, 2, 0)))
            .unwrap();

        let reparsed = SpecDocument::from_yaml_str(&doc.to_yaml_string().unwrap()).unwrap();
        assert_eq!(reparsed.version().unwrap(), SemanticVersion::new(0, 2, 0));
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn test_first_entry_creates_ledger() {
        let mut doc = SpecDocument::from_yaml_str(
            "project:\n  versioning:\n    current: \"0.1.0\" # seed\n",
        )
        .unwrap();
        doc.apply_entry(HistoryEntry::new(SemanticVersion::new(0, 1, 1)))
            .unwrap();

        let out = doc.to_yaml_string().unwrap();
        assert!(out.contains("current: \"0.1.1\" # seed"));
        let reparsed = SpecDocument::from_yaml_str(&out).unwrap();
        assert_eq!(reparsed.history().len(), 1);
        assert_eq!(reparsed, doc);
    }
}
