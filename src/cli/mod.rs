pub mod orchestration;

pub use orchestration::{
    report_error, run_bump, run_check, run_checkout, run_diff, run_history, run_show, run_tag,
    BumpWorkflowArgs, CheckoutWorkflowArgs, DiffWorkflowArgs, GlobalArgs, HistoryWorkflowArgs,
    OutputFormat, Workspace,
};
