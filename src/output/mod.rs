//! Output module for the harvest result set and run reports
//!
//! This module handles:
//! - Writing the result set as a JSON file
//! - Summarising a finished run for the terminal

mod json;
pub mod stats;
mod traits;

pub use json::{to_entries, write_results, BookEntry};
pub use stats::{print_summary, RunSummary};
pub use traits::{OutputError, OutputResult};
