//! Per-run crawl counters
//!
//! The crawler owns one `CrawlReport` per run and hands it back when the run
//! ends; nothing here is global.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Counters accumulated during a single crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    /// Page URLs taken on by `crawl` (each counted once, when first visited)
    pub total_links: u64,

    /// Pages whose text was written to disk
    pub pages_saved: u64,

    /// Documents downloaded completely
    pub downloads_succeeded: u64,

    /// Pages or documents that could not be fetched or stored
    pub failures: u64,

    /// Page texts that were fetched but could not be written
    pub write_errors: u64,

    /// Links skipped because they were already visited
    pub duplicates_skipped: u64,

    /// Links skipped because the depth budget was spent
    pub depth_exhausted: u64,

    /// Links to other hosts that were ignored
    pub external_ignored: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self {
            total_links: 0,
            pages_saved: 0,
            downloads_succeeded: 0,
            failures: 0,
            write_errors: 0,
            duplicates_skipped: 0,
            depth_exhausted: 0,
            external_ignored: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run, if it has finished
    pub fn elapsed(&self) -> Option<Duration> {
        self.finished_at
            .and_then(|finished| (finished - self.started_at).to_std().ok())
    }

    /// Share of download/page outcomes that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let succeeded = self.pages_saved + self.downloads_succeeded;
        let total = succeeded + self.failures;
        if total == 0 {
            0.0
        } else {
            (succeeded as f64 / total as f64) * 100.0
        }
    }
}

impl Default for CrawlReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the run summary to stdout
pub fn print_report(report: &CrawlReport) {
    print!("{}", format_report(report));
}

/// Renders the run summary printed by [`print_report`]
pub fn format_report(report: &CrawlReport) -> String {
    let mut out = String::from("=== Crawl Summary ===\n\n");

    out.push_str("Overview:\n");
    out += &format!("  Total links crawled: {}\n", report.total_links);
    out += &format!("  Pages saved: {}\n", report.pages_saved);
    out += &format!("  Successful downloads: {}\n", report.downloads_succeeded);
    out += &format!("  Failures: {}\n\n", report.failures);

    out.push_str("Skipped:\n");
    out += &format!("  Already visited: {}\n", report.duplicates_skipped);
    out += &format!("  Depth exhausted: {}\n", report.depth_exhausted);
    out += &format!("  External links: {}\n", report.external_ignored);
    if report.write_errors > 0 {
        out += &format!("  Write errors: {}\n", report.write_errors);
    }
    out.push('\n');

    if let Some(elapsed) = report.elapsed() {
        out += &format!("Elapsed: {:.1}s\n", elapsed.as_secs_f64());
    }

    out += &format!("Success Rate: {:.1}%\n", report.success_rate());
    out
}
