//! Domain logic - pure types and rules independent of git and the filesystem

pub mod change;
pub mod history;
pub mod reference;
pub mod tag;
pub mod version;

pub use change::{parse_change_specs, validate_changes, ChangeEntry, ChangeOp};
pub use history::{sort_newest_first, AnchoredEntry, GitAnchor, HistoryEntry, Versioned};
pub use reference::VersionReference;
pub use tag::TagPattern;
pub use version::{BumpType, SemanticVersion};
