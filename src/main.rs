use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use spec_ledger::cli::{
    self, BumpWorkflowArgs, CheckoutWorkflowArgs, DiffWorkflowArgs, GlobalArgs,
    HistoryWorkflowArgs, OutputFormat, Workspace,
};
use spec_ledger::domain::BumpType;

#[derive(Parser)]
#[command(
    name = "spec-ledger",
    version,
    about = "Keep a specification's version, history ledger and git tags in agreement"
)]
struct Args {
    #[arg(long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, global = true, help = "Specification document (default: discovered)")]
    file: Option<String>,

    #[arg(short, long, action = ArgAction::Count, global = true, help = "More diagnostics (-v, -vv, -vvv)")]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current version, or bump, check or tag it
    Version {
        #[command(subcommand)]
        action: Option<VersionAction>,
    },
    /// Show version history, newest first
    History {
        #[arg(short = 'n', long, default_value_t = 10, help = "Number of versions to show")]
        limit: usize,

        #[arg(long, help = "Include git commit info")]
        git: bool,

        #[arg(long, help = "Show change details")]
        changes: bool,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Compare the document between two versions or revisions
    Diff {
        /// Version (1.2.0, v1.2.0) or git revision (HEAD~1, a hash)
        from: String,

        /// Defaults to the working copy
        to: Option<String>,

        #[arg(long, help = "Only list recorded ledger changes")]
        changes_only: bool,

        #[arg(long, value_enum, default_value_t = FormatArg::Text)]
        format: FormatArg,
    },
    /// Switch the working tree to a released version
    Checkout {
        version: String,

        #[arg(short, long, help = "Create and switch to a new branch at the tag")]
        branch: Option<String>,

        #[arg(long, help = "Discard uncommitted changes")]
        force: bool,
    },
}

#[derive(Subcommand)]
enum VersionAction {
    /// Bump the version and record it in the history ledger
    Bump {
        #[arg(value_enum)]
        bump_type: BumpTypeArg,

        #[arg(short, long, help = "Reason for the change (required)")]
        message: String,

        #[arg(short = 'c', long = "change", help = "Change entry op:target[:field[:type]] (repeatable)")]
        changes: Vec<String>,

        #[arg(long, help = "Do not create a git commit")]
        no_commit: bool,

        #[arg(long, help = "Do not create a git tag")]
        no_tag: bool,

        #[arg(long, help = "Show the new version without changing anything")]
        dry_run: bool,
    },
    /// Verify that document, history and tags agree
    Check,
    /// Tag HEAD with the current version
    Tag,
}

#[derive(Clone, Copy, ValueEnum)]
enum BumpTypeArg {
    Major,
    Minor,
    Patch,
}

impl From<BumpTypeArg> for BumpType {
    fn from(arg: BumpTypeArg) -> Self {
        match arg {
            BumpTypeArg::Major => BumpType::Major,
            BumpTypeArg::Minor => BumpType::Minor,
            BumpTypeArg::Patch => BumpType::Patch,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose >= 2),
        )
        .init();
}

fn run(args: Args) -> anyhow::Result<bool> {
    let global = GlobalArgs {
        config_path: args.config,
        file: args.file,
    };
    let workspace = Workspace::open(&global)?;

    match args.command {
        Command::Version { action: None } => cli::run_show(&workspace),
        Command::Version {
            action:
                Some(VersionAction::Bump {
                    bump_type,
                    message,
                    changes,
                    no_commit,
                    no_tag,
                    dry_run,
                }),
        } => cli::run_bump(
            &workspace,
            &BumpWorkflowArgs {
                bump_type: bump_type.into(),
                message,
                changes,
                no_commit,
                no_tag,
                dry_run,
            },
        ),
        Command::Version {
            action: Some(VersionAction::Check),
        } => cli::run_check(&workspace),
        Command::Version {
            action: Some(VersionAction::Tag),
        } => cli::run_tag(&workspace),
        Command::History {
            limit,
            git,
            changes,
            json,
        } => cli::run_history(
            &workspace,
            &HistoryWorkflowArgs {
                limit,
                git,
                changes,
                json,
            },
        ),
        Command::Diff {
            from,
            to,
            changes_only,
            format,
        } => cli::run_diff(
            &workspace,
            &DiffWorkflowArgs {
                from,
                to,
                changes_only,
                format: match format {
                    FormatArg::Text => OutputFormat::Text,
                    FormatArg::Json => OutputFormat::Json,
                },
            },
        ),
        Command::Checkout {
            version,
            branch,
            force,
        } => cli::run_checkout(
            &workspace,
            &CheckoutWorkflowArgs {
                version,
                branch,
                force,
            },
        ),
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            cli::report_error(&e);
            std::process::exit(1);
        }
    }
}
