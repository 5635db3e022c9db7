//! Version lifecycle operations.
//!
//! Each engine borrows a [`DocumentStore`](crate::document::DocumentStore) and
//! an optional [`Repository`](crate::git::Repository); `None` means git is not
//! available and every operation decides for itself whether that is fatal.

pub mod bump;
pub mod checkout;
pub mod diff;
pub mod history;
pub mod resolve;

pub use bump::{BumpEngine, BumpOutcome, BumpRequest, BumpResult};
pub use checkout::{CheckoutController, CheckoutRequest, CheckoutResult, CheckoutState, VersionDrift};
pub use diff::{
    changes_between, diff_lines, DiffEngine, DiffMode, DiffResult, DiffStats, LineChange, TextDiff,
    VersionedChange,
};
pub use history::{ConsistencyCheck, ConsistencyReport, HistoryLedger};
pub use resolve::ContentResolver;
