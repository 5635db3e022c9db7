use crate::document::{DocumentStore, SpecDocument};
use crate::domain::{ChangeEntry, HistoryEntry, SemanticVersion, TagPattern, VersionReference};
use crate::engine::ContentResolver;
use crate::error::{Result, SpecLedgerError};
use crate::git::Repository;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// One line of a text diff. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineChange {
    Unchanged {
        old_line: usize,
        new_line: usize,
        text: String,
    },
    Added {
        new_line: usize,
        text: String,
    },
    Removed {
        old_line: usize,
        text: String,
    },
    /// A removal paired with the addition that took its place.
    Replaced {
        old_line: usize,
        new_line: usize,
        old: String,
        new: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub unchanged: usize,
    pub added: usize,
    pub removed: usize,
    pub replaced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextDiff {
    pub lines: Vec<LineChange>,
}

impl TextDiff {
    pub fn has_changes(&self) -> bool {
        self.lines
            .iter()
            .any(|l| !matches!(l, LineChange::Unchanged { .. }))
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for line in &self.lines {
            match line {
                LineChange::Unchanged { .. } => stats.unchanged += 1,
                LineChange::Added { .. } => stats.added += 1,
                LineChange::Removed { .. } => stats.removed += 1,
                LineChange::Replaced { .. } => stats.replaced += 1,
            }
        }
        stats
    }
}

/// Largest table, in cells, the exact diff will build.
const MAX_LCS_CELLS: usize = 4_000_000;

enum Edit {
    Keep(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Line diff based on the longest common subsequence.
///
/// Common leading and trailing lines are matched directly before the
/// quadratic table is built over what remains. When what remains is too
/// large for the table, lines are compared by position instead.
pub fn diff_lines(old: &str, new: &str) -> TextDiff {
    diff_lines_within(old, new, MAX_LCS_CELLS)
}

fn diff_lines_within(old: &str, new: &str, max_cells: usize) -> TextDiff {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut edits: Vec<Edit> = (0..prefix).map(|i| Edit::Keep(i, i)).collect();
    let (a_end, b_end) = (a.len() - suffix, b.len() - suffix);
    let cells = (a_end - prefix + 1).saturating_mul(b_end - prefix + 1);
    if cells > max_cells {
        debug!("Diff region needs {} cells; comparing lines by position", cells);
        aligned_edits(&a, &b, prefix, a_end, b_end, &mut edits);
    } else {
        lcs_edits(&a, &b, prefix, a_end, b_end, &mut edits);
    }
    edits.extend((0..suffix).map(|k| Edit::Keep(a.len() - suffix + k, b.len() - suffix + k)));

    TextDiff {
        lines: pair_edits(&a, &b, edits),
    }
}

/// Append edits for `a[start..a_end]` against `b[start..b_end]`.
fn lcs_edits(a: &[&str], b: &[&str], start: usize, a_end: usize, b_end: usize, edits: &mut Vec<Edit>) {
    let a_mid = &a[start..a_end];
    let b_mid = &b[start..b_end];
    let (n, m) = (a_mid.len(), b_mid.len());
    let width = m + 1;

    // table[i * width + j] = LCS length of a_mid[i..] and b_mid[j..]
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if a_mid[i] == b_mid[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a_mid[i] == b_mid[j] {
            edits.push(Edit::Keep(start + i, start + j));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            edits.push(Edit::Delete(start + i));
            i += 1;
        } else {
            edits.push(Edit::Insert(start + j));
            j += 1;
        }
    }
    edits.extend((i..n).map(|i| Edit::Delete(start + i)));
    edits.extend((j..m).map(|j| Edit::Insert(start + j)));
}

/// Position-by-position edits for `a[start..a_end]` against `b[start..b_end]`.
fn aligned_edits(a: &[&str], b: &[&str], start: usize, a_end: usize, b_end: usize, edits: &mut Vec<Edit>) {
    let common = (a_end - start).min(b_end - start);
    for k in start..start + common {
        if a[k] == b[k] {
            edits.push(Edit::Keep(k, k));
        } else {
            edits.push(Edit::Delete(k));
            edits.push(Edit::Insert(k));
        }
    }
    edits.extend((start + common..a_end).map(Edit::Delete));
    edits.extend((start + common..b_end).map(Edit::Insert));
}

/// Collapse each run of deletions/insertions into replaced lines, leftovers
/// staying plain removals or additions.
fn pair_edits(a: &[&str], b: &[&str], edits: Vec<Edit>) -> Vec<LineChange> {
    let mut lines = Vec::with_capacity(edits.len());
    let mut removed: Vec<usize> = Vec::new();
    let mut added: Vec<usize> = Vec::new();

    let flush = |lines: &mut Vec<LineChange>, removed: &mut Vec<usize>, added: &mut Vec<usize>| {
        let paired = removed.len().min(added.len());
        for (&r, &n) in removed.iter().zip(added.iter()) {
            lines.push(LineChange::Replaced {
                old_line: r + 1,
                new_line: n + 1,
                old: a[r].to_string(),
                new: b[n].to_string(),
            });
        }
        for &r in &removed[paired..] {
            lines.push(LineChange::Removed {
                old_line: r + 1,
                text: a[r].to_string(),
            });
        }
        for &n in &added[paired..] {
            lines.push(LineChange::Added {
                new_line: n + 1,
                text: b[n].to_string(),
            });
        }
        removed.clear();
        added.clear();
    };

    for edit in edits {
        match edit {
            Edit::Delete(i) => removed.push(i),
            Edit::Insert(j) => added.push(j),
            Edit::Keep(i, j) => {
                flush(&mut lines, &mut removed, &mut added);
                lines.push(LineChange::Unchanged {
                    old_line: i + 1,
                    new_line: j + 1,
                    text: a[i].to_string(),
                });
            }
        }
    }
    flush(&mut lines, &mut removed, &mut added);
    lines
}

/// A ledger change tagged with the version that introduced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedChange {
    pub version: SemanticVersion,
    #[serde(flatten)]
    pub change: ChangeEntry,
}

/// Changes recorded for versions in `(from, to]`, oldest version first.
///
/// Entries sharing a version keep their ledger order.
pub fn changes_between(
    history: &[HistoryEntry],
    from: &SemanticVersion,
    to: &SemanticVersion,
) -> Vec<VersionedChange> {
    let mut selected: Vec<&HistoryEntry> = history
        .iter()
        .filter(|e| e.version > *from && e.version <= *to)
        .collect();
    selected.sort_by_key(|e| e.version);

    selected
        .into_iter()
        .flat_map(|entry| {
            entry.changes.iter().map(move |change| VersionedChange {
                version: entry.version,
                change: change.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    Full,
    ChangesOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DiffResult {
    Full {
        from: String,
        to: String,
        diff: TextDiff,
    },
    ChangesOnly {
        from: SemanticVersion,
        to: SemanticVersion,
        changes: Vec<VersionedChange>,
    },
}

pub struct DiffEngine<'a> {
    store: &'a dyn DocumentStore,
    vcs: Option<&'a dyn Repository>,
    tags: TagPattern,
}

impl<'a> DiffEngine<'a> {
    pub fn new(store: &'a dyn DocumentStore, vcs: Option<&'a dyn Repository>, tags: TagPattern) -> Self {
        DiffEngine { store, vcs, tags }
    }

    /// Compare two references. Both sides are resolved before anything is
    /// computed, so a bad reference never yields a partial result.
    pub fn diff(
        &self,
        from: &VersionReference,
        to: &VersionReference,
        mode: DiffMode,
        path: &Path,
    ) -> Result<DiffResult> {
        match mode {
            DiffMode::Full => {
                let resolver = ContentResolver::new(self.store, self.vcs, self.tags.clone());
                let old = resolver.resolve_content(from, path)?;
                let new = resolver.resolve_content(to, path)?;
                debug!("Diffing {} ({} bytes) against {} ({} bytes)", from, old.len(), to, new.len());

                Ok(DiffResult::Full {
                    from: from.to_string(),
                    to: to.to_string(),
                    diff: diff_lines(&old, &new),
                })
            }
            DiffMode::ChangesOnly => {
                let document = self.store.read_document(path)?;
                let lower = match from {
                    VersionReference::Semantic(version) => {
                        self.require_known(&document, version)?;
                        *version
                    }
                    other => {
                        return Err(SpecLedgerError::format(format!(
                            "--changes-only needs a version to start from, got {}",
                            other
                        )))
                    }
                };
                let upper = match to {
                    VersionReference::Semantic(version) => {
                        self.require_known(&document, version)?;
                        *version
                    }
                    VersionReference::WorkingCopy => document.version()?,
                    VersionReference::VcsRef(reference) => {
                        return Err(SpecLedgerError::format(format!(
                            "--changes-only needs a version, got '{}'",
                            reference
                        )))
                    }
                };

                Ok(DiffResult::ChangesOnly {
                    from: lower,
                    to: upper,
                    changes: changes_between(document.history(), &lower, &upper),
                })
            }
        }
    }

    /// A version bound must be in the ledger or, with git, tagged.
    fn require_known(&self, document: &SpecDocument, version: &SemanticVersion) -> Result<()> {
        if document.records_version(version) {
            return Ok(());
        }
        let tag = self.tags.tag_for(version);
        if let Some(vcs) = self.vcs {
            if vcs.resolve_tag(&tag)?.is_some() {
                return Ok(());
            }
        }
        Err(SpecLedgerError::not_found(format!(
            "version {} (no history entry and no tag {})",
            version, tag
        )))
    }
}
