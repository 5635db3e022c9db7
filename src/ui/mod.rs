//! User interface module.
//!
//! Everything user-facing is printed from here; diagnostics go through
//! `tracing` instead.
//! - `formatter` - Formatting and printing of every result type

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_bump_result, display_changes, display_checkout_result,
    display_consistency_report, display_error, display_history, display_nothing_changed,
    display_status, display_success, display_suggestion, display_tag_hint, display_text_diff,
};
