//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing, text and link extraction
//! - The recursive, depth-bounded crawl and document downloads

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{run_crawl, Crawler};
pub use fetcher::{
    build_http_client, fetch_page_with_retry, fetch_with_retry, FetchFailure, FetchResult,
    FetchedPage, RetryPolicy,
};
pub use parser::{parse_html, ParsedPage};
