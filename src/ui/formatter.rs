//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from the
//! command workflows. Functions here only print; the string builders they rely
//! on are pure and tested.

use crate::boundary::BoundaryWarning;
use crate::domain::{AnchoredEntry, SemanticVersion};
use crate::engine::{
    BumpOutcome, BumpResult, CheckoutResult, CheckoutState, ConsistencyReport, LineChange, TextDiff,
    VersionedChange,
};
use crate::git::short_hash;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print a remediation hint under an error.
pub fn display_suggestion(suggestion: &str) {
    eprintln!("  {} {}", style("Try:").cyan(), suggestion);
}

/// Note under an error that the command was rejected before touching anything.
pub fn display_nothing_changed() {
    eprintln!("  {}", style("Nothing was changed.").dim());
}

/// Display a boundary warning to the user.
///
/// Shows a yellow warning icon followed by the warning message.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

fn display_heading(title: &str) {
    println!();
    println!("{}", style(title).bold());
    println!("{}", style("=".repeat(title.chars().count())).dim());
    println!();
}

/// Display the outcome of a bump, including every step that failed.
pub fn display_bump_result(result: &BumpResult) {
    match result.outcome {
        BumpOutcome::DryRun => {
            println!("{}", style("Dry run - no changes made").yellow());
            display_status(&format!(
                "Would bump {} → {}",
                result.previous_version, result.new_version
            ));
            return;
        }
        BumpOutcome::Applied => display_success(&format!(
            "Version bumped: {} → {}",
            result.previous_version, result.new_version
        )),
        BumpOutcome::RolledBack => {
            display_error("Version bump failed; the document was restored");
        }
        BumpOutcome::PartiallyApplied => {
            display_error(&format!(
                "Version bump to {} was only partially applied",
                result.new_version
            ));
        }
    }

    if let Some(hash) = &result.commit_hash {
        println!("  {}", style(format!("Commit: {}", short_hash(hash))).dim());
    }
    if let Some(tag) = &result.tag_name {
        println!("  {}", style(format!("Tag: {}", tag)).dim());
    }
    for error in &result.errors {
        eprintln!("  {} {}", style("•").red(), error);
    }
    if let Some(suggestion) = &result.suggestion {
        display_suggestion(suggestion);
    }
}

/// Display every consistency check with its verdict.
pub fn display_consistency_report(report: &ConsistencyReport) {
    display_heading("Version Consistency Check");

    for check in &report.checks {
        let icon = if check.passed {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("{} {}: {}", icon, check.name, check.message);
        if let Some(suggestion) = &check.suggestion {
            println!("  {}", style(format!("Run: {}", suggestion)).cyan());
        }
    }

    println!();
    if report.ok {
        println!("{}", style("All checks passed!").green());
    } else {
        let failed = report.failures().count();
        println!("{}", style(format!("{} check(s) failed", failed)).red());
    }
}

/// Title line for one history entry: `v1.2.0`, marked when it is current.
pub fn format_history_title(version: &SemanticVersion, current: Option<&SemanticVersion>) -> String {
    if current == Some(version) {
        format!("v{} (current)", version)
    } else {
        format!("v{}", version)
    }
}

/// Display ledger entries in the order given.
pub fn display_history(
    entries: &[AnchoredEntry],
    current: Option<&SemanticVersion>,
    show_git: bool,
    show_changes: bool,
) {
    display_heading("Version History");

    for anchored in entries {
        let entry = &anchored.entry;
        println!("{}", style(format_history_title(&entry.version, current)).bold());

        if let Some(based_on) = &entry.based_on {
            println!("  {}", style(format!("Based on: v{}", based_on)).dim());
        }
        if let Some(notes) = &entry.notes {
            println!("  {}", style(format!("Notes: {}", notes)).dim());
        }
        if show_git {
            if let Some(git) = &anchored.git {
                println!(
                    "  {}",
                    style(format!(
                        "Git: {} {} - {}",
                        git.tag_name,
                        short_hash(&git.commit_hash),
                        git.commit_message
                    ))
                    .dim()
                );
                println!("  {}", style(format!("Date: {}", git.commit_date)).dim());
            }
        }
        if show_changes && !entry.changes.is_empty() {
            println!("  {}", style("Changes:").dim());
            for change in &entry.changes {
                println!("    {}", style(format!("- {}", change.describe())).dim());
            }
        }
        println!();
    }

    if entries.is_empty() {
        println!("{}", style("No history entries found").dim());
    }
}

/// Display the changed lines of a text diff.
pub fn display_text_diff(from: &str, to: &str, diff: &TextDiff) {
    display_heading(&format!("Diff: {} → {}", from, to));

    if !diff.has_changes() {
        println!("{}", style("No differences found").dim());
        return;
    }

    for line in &diff.lines {
        match line {
            LineChange::Unchanged { .. } => {}
            LineChange::Removed { text, .. } => println!("{}", style(format!("- {}", text)).red()),
            LineChange::Added { text, .. } => println!("{}", style(format!("+ {}", text)).green()),
            LineChange::Replaced { old, new, .. } => {
                println!("{}", style(format!("- {}", old)).red());
                println!("{}", style(format!("+ {}", new)).green());
            }
        }
    }

    let stats = diff.stats();
    println!();
    println!(
        "{}",
        style(format!(
            "{} added, {} removed, {} changed",
            stats.added, stats.removed, stats.replaced
        ))
        .dim()
    );
}

/// `[v1.1.0] add: entity.user.email (string)`
pub fn format_versioned_change(change: &VersionedChange) -> String {
    format!("[v{}] {}", change.version, change.change.describe())
}

/// Display ledger changes between two versions.
pub fn display_changes(from: &SemanticVersion, to: &SemanticVersion, changes: &[VersionedChange]) {
    display_heading(&format!("Changes from v{} to v{}", from, to));

    if changes.is_empty() {
        println!("{}", style("No changes recorded").dim());
        return;
    }
    for change in changes {
        println!("{}", format_versioned_change(change));
    }
}

/// Display where a checkout left the working tree.
pub fn display_checkout_result(result: &CheckoutResult) {
    match &result.state {
        CheckoutState::OnBranch { branch } => {
            display_success(&format!(
                "Switched to new branch '{}' at {}",
                branch, result.tag_name
            ));
        }
        CheckoutState::Detached { commit_hash } => {
            display_success(&format!(
                "Checked out {} ({})",
                result.tag_name,
                short_hash(commit_hash)
            ));
            display_boundary_warning(&BoundaryWarning::DetachedHead {
                tag: result.tag_name.clone(),
                commit_hash: commit_hash.clone(),
            });
            println!(
                "  {}",
                style("To keep changes made here, create a branch: spec-ledger checkout <version> --branch <name>")
                    .dim()
            );
        }
    }
}

/// Display tags the user may have meant.
pub fn display_tag_hint(available: &[String]) {
    if available.is_empty() {
        eprintln!("  {}", style("No version tags exist yet").dim());
        return;
    }
    eprintln!("  {}", style("Available versions:").bold());
    for tag in available {
        eprintln!("    - {}", tag);
    }
}
