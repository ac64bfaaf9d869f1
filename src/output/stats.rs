//! Run summary
//!
//! This module condenses a finished [`HarvestReport`] into counts and prints
//! them for the operator, including every skipped item and why.

use crate::crawler::{HarvestReport, WalkEnd};
use std::collections::BTreeMap;

/// Harvest statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Catalog pages that listed items
    pub pages_walked: u32,

    /// Books written to the result set
    pub books_saved: usize,

    /// Books saved without a cover image
    pub books_without_image: usize,

    /// Skipped items per skip kind
    pub skips_by_kind: BTreeMap<&'static str, usize>,

    /// Human-readable reason the catalog walk ended
    pub walk_end: String,

    /// Wall-clock duration of the run
    pub elapsed_seconds: f64,
}

impl RunSummary {
    pub fn from_report(report: &HarvestReport) -> Self {
        let mut skips_by_kind = BTreeMap::new();
        for skipped in &report.skipped {
            *skips_by_kind.entry(skipped.reason.kind()).or_insert(0) += 1;
        }

        let books_without_image = report.books.iter().filter(|b| b.image.is_none()).count();

        let elapsed = report.finished_at - report.started_at;

        Self {
            pages_walked: report.pages_walked,
            books_saved: report.books.len(),
            books_without_image,
            skips_by_kind,
            walk_end: describe_walk_end(report.walk_end.as_ref()),
            elapsed_seconds: elapsed.num_milliseconds() as f64 / 1000.0,
        }
    }

    pub fn total_skipped(&self) -> usize {
        self.skips_by_kind.values().sum()
    }

    /// Share of processed items that ended up in the result set
    pub fn success_rate(&self) -> f64 {
        let processed = self.books_saved + self.total_skipped();
        if processed == 0 {
            0.0
        } else {
            (self.books_saved as f64 / processed as f64) * 100.0
        }
    }
}

fn describe_walk_end(end: Option<&WalkEnd>) -> String {
    match end {
        None => "not finished".to_string(),
        Some(WalkEnd::EndPage) => "reached the requested end page".to_string(),
        Some(WalkEnd::NotFound { page }) => format!("page {} does not exist", page),
        Some(WalkEnd::FetchFailed { page, failure }) => {
            format!("page {} could not be fetched: {}", page, failure)
        }
        Some(WalkEnd::InvalidUrl { page, error }) => {
            format!("page {} has no valid URL: {}", page, error)
        }
    }
}

/// Prints a summary of the run to stdout
pub fn print_summary(report: &HarvestReport) {
    let summary = RunSummary::from_report(report);

    println!("=== Harvest Summary ===\n");

    println!("Catalog:");
    println!("  Pages walked: {}", summary.pages_walked);
    println!("  Walk ended: {}", summary.walk_end);
    println!();

    println!("Books:");
    println!("  Saved: {}", summary.books_saved);
    println!("  Saved without cover: {}", summary.books_without_image);
    println!("  Skipped: {}", summary.total_skipped());
    println!();

    if !report.skipped.is_empty() {
        println!("Skips by reason:");
        for (kind, count) in &summary.skips_by_kind {
            println!("  {}: {}", kind, count);
        }
        println!();

        println!("Skipped items:");
        for skipped in &report.skipped {
            println!("  - {}: {}", skipped.item_url, skipped.reason);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% in {:.1}s",
        summary.success_rate(),
        summary.elapsed_seconds
    );
}
