//! Command workflow orchestration
//!
//! Each `run_*` function carries out one command against an opened
//! [`Workspace`]. They are decoupled from clap so they can be driven
//! programmatically, and return `Ok(false)` when the command ran but reported
//! a failure the user must act on (exit code 1).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::boundary::BoundaryWarning;
use crate::config::{find_spec_file, load_config, Config};
use crate::document::{DocumentStore, FsDocumentStore};
use crate::domain::{
    parse_change_specs, sort_newest_first, AnchoredEntry, BumpType, TagPattern, VersionReference,
};
use crate::engine::{
    BumpEngine, BumpOutcome, BumpRequest, CheckoutController, CheckoutRequest, DiffEngine,
    DiffMode, DiffResult, HistoryLedger,
};
use crate::error::{ErrorKind, SpecLedgerError};
use crate::git::{Git2Repository, Repository};
use crate::ui;

/// Options shared by every command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalArgs {
    /// Path to custom config file
    pub config_path: Option<String>,

    /// Explicit specification document
    pub file: Option<String>,
}

/// Arguments for `version bump`
#[derive(Debug, Clone, PartialEq)]
pub struct BumpWorkflowArgs {
    pub bump_type: BumpType,
    pub message: String,
    /// Raw `op:target[:field[:type]]` specs, validated before anything is written
    pub changes: Vec<String>,
    pub no_commit: bool,
    pub no_tag: bool,
    pub dry_run: bool,
}

/// Arguments for `history`
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryWorkflowArgs {
    pub limit: usize,
    pub git: bool,
    pub changes: bool,
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for `diff`
#[derive(Debug, Clone, PartialEq)]
pub struct DiffWorkflowArgs {
    pub from: String,
    /// `None` compares against the working copy
    pub to: Option<String>,
    pub changes_only: bool,
    pub format: OutputFormat,
}

/// Arguments for `checkout`
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutWorkflowArgs {
    pub version: String,
    pub branch: Option<String>,
    pub force: bool,
}

/// Configuration, document location and git handle for one invocation.
pub struct Workspace {
    pub config: Config,
    pub document_path: PathBuf,
    store: FsDocumentStore,
    repo: Option<Git2Repository>,
    repo_error: Option<String>,
}

impl Workspace {
    /// Load configuration, locate the document and open its repository.
    ///
    /// A missing repository is not an error here; commands that need git
    /// report it themselves.
    pub fn open(args: &GlobalArgs) -> Result<Self> {
        let config = load_config(args.config_path.as_deref())?;
        let cwd = std::env::current_dir().context("cannot determine working directory")?;
        let document_path = find_spec_file(&cwd, args.file.as_deref(), &config)?;
        if !document_path.is_file() {
            return Err(SpecLedgerError::not_found(format!(
                "specification document {}",
                document_path.display()
            ))
            .into());
        }

        let repo_root = match document_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => cwd,
        };
        let (repo, repo_error) = match Git2Repository::open(&repo_root) {
            Ok(repo) => (Some(repo), None),
            Err(e) => {
                debug!("No git repository for {:?}: {}", repo_root, e);
                (None, Some(e.to_string()))
            }
        };

        Ok(Workspace {
            config,
            document_path,
            store: FsDocumentStore::new(),
            repo,
            repo_error,
        })
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn store(&self) -> &dyn DocumentStore {
        &self.store
    }

    pub fn vcs(&self) -> Option<&dyn Repository> {
        self.repo.as_ref().map(|repo| repo as &dyn Repository)
    }

    pub fn tags(&self) -> TagPattern {
        self.config.tag_pattern()
    }

    fn warn_if_vcs_missing(&self) {
        if let Some(reason) = &self.repo_error {
            ui::display_boundary_warning(&BoundaryWarning::VcsUnavailable {
                reason: reason.clone(),
            });
        }
    }
}

/// `version`: print the declared version.
pub fn run_show(workspace: &Workspace) -> Result<bool> {
    let document = workspace.store().read_document(workspace.document_path())?;
    match document.version_raw() {
        Some(version) => {
            println!("{}", version);
            Ok(true)
        }
        None => {
            ui::display_error("Cannot read version from the specification document");
            Ok(false)
        }
    }
}

/// `version bump`
pub fn run_bump(workspace: &Workspace, args: &BumpWorkflowArgs) -> Result<bool> {
    let changes = parse_change_specs(&args.changes)?;
    let versioning = &workspace.config.versioning;

    let mut request = BumpRequest::new(workspace.document_path(), args.bump_type, args.message.clone());
    request.changes = changes;
    request.skip_commit = args.no_commit || !versioning.auto_commit;
    // Without a commit from config there is nothing for a tag to point at.
    request.skip_tag = args.no_tag || !versioning.auto_tag || !versioning.auto_commit;
    request.dry_run = args.dry_run;

    let engine = BumpEngine::new(workspace.store(), workspace.vcs(), workspace.tags());
    let result = engine.bump(&request)?;
    ui::display_bump_result(&result);

    if result.outcome == BumpOutcome::PartiallyApplied {
        ui::display_boundary_warning(&BoundaryWarning::PartialBump {
            version: result.new_version.to_string(),
            detail: result.errors.join("; "),
        });
    }
    Ok(result.success)
}

/// `version check`
pub fn run_check(workspace: &Workspace) -> Result<bool> {
    let ledger = HistoryLedger::new(workspace.store(), workspace.vcs(), workspace.tags());
    let report = ledger.check_version_consistency(workspace.document_path())?;
    ui::display_consistency_report(&report);
    Ok(report.ok)
}

/// `version tag`
pub fn run_tag(workspace: &Workspace) -> Result<bool> {
    let engine = BumpEngine::new(workspace.store(), workspace.vcs(), workspace.tags());
    let tag_name = engine.tag_current(workspace.document_path())?;
    ui::display_success(&format!("Created tag: {}", tag_name));
    Ok(true)
}

/// `history`
pub fn run_history(workspace: &Workspace, args: &HistoryWorkflowArgs) -> Result<bool> {
    let ledger = HistoryLedger::new(workspace.store(), workspace.vcs(), workspace.tags());
    let path = workspace.document_path();

    let mut entries: Vec<AnchoredEntry> = if args.git {
        workspace.warn_if_vcs_missing();
        ledger.get_history_with_git(path)?
    } else {
        ledger
            .get_history(path)?
            .into_iter()
            .map(AnchoredEntry::from)
            .collect()
    };
    sort_newest_first(&mut entries);
    entries.truncate(args.limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(true);
    }

    let current = workspace.store().read_document(path)?.version().ok();
    ui::display_history(&entries, current.as_ref(), args.git, args.changes);
    Ok(true)
}

/// `diff`
pub fn run_diff(workspace: &Workspace, args: &DiffWorkflowArgs) -> Result<bool> {
    let tags = workspace.tags();
    let from = VersionReference::parse(&args.from, &tags);
    let to = VersionReference::parse_optional(args.to.as_deref(), &tags);
    let mode = if args.changes_only {
        DiffMode::ChangesOnly
    } else {
        DiffMode::Full
    };

    let engine = DiffEngine::new(workspace.store(), workspace.vcs(), tags);
    let result = engine.diff(&from, &to, mode, workspace.document_path())?;

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(true);
    }

    match &result {
        DiffResult::Full { from, to, diff } => ui::display_text_diff(from, to, diff),
        DiffResult::ChangesOnly { from, to, changes } => ui::display_changes(from, to, changes),
    }
    Ok(true)
}

/// `checkout`
pub fn run_checkout(workspace: &Workspace, args: &CheckoutWorkflowArgs) -> Result<bool> {
    let controller = CheckoutController::new(workspace.store(), workspace.vcs(), workspace.tags())
        .with_document(workspace.document_path());

    let request = CheckoutRequest {
        version: args.version.clone(),
        branch: args.branch.clone(),
        force: args.force,
    };

    let result = match controller.checkout(&request) {
        Ok(result) => result,
        Err(SpecLedgerError::TagNotFound { tag, available }) => {
            ui::display_error(&format!("Tag {} not found", tag));
            ui::display_tag_hint(&available);
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    if result.discarded_changes {
        ui::display_boundary_warning(&BoundaryWarning::DiscardedChanges);
    }
    ui::display_checkout_result(&result);
    if let Some(drift) = &result.drift {
        ui::display_boundary_warning(&BoundaryWarning::DocumentVersionDrift {
            tag: result.tag_name.clone(),
            expected: drift.expected.to_string(),
            found: drift.found.clone(),
        });
    }
    Ok(true)
}

/// Print an error and its remediation hint, if it has one.
pub fn report_error(error: &anyhow::Error) {
    ui::display_error(&format!("{:#}", error));
    let error = match error.downcast_ref::<SpecLedgerError>() {
        Some(error) => error,
        None => return,
    };
    if let Some(suggestion) = error.suggestion() {
        ui::display_suggestion(&suggestion);
    }
    if error.kind() == ErrorKind::Format {
        ui::display_nothing_changed();
    }
}
