//! Output module for writing harvested content and reporting results
//!
//! This module handles:
//! - The flat output directory (page texts and downloaded documents)
//! - The per-run crawl report and its printed summary

mod files;
pub mod stats;

pub use files::OutputDir;
pub use stats::{format_report, print_report, CrawlReport};
