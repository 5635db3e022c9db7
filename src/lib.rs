pub mod boundary;
pub mod cli;
pub mod config;
pub mod document;
pub mod domain;
pub mod engine;
pub mod error;
pub mod git;
pub mod ui;

pub use error::{ErrorKind, Result, SpecLedgerError};
