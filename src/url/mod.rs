//! URL handling module for ton-harvest
//!
//! This module provides link resolution, same-host comparison, document
//! detection and the filename rules used for saved pages and downloads.

mod domain;
mod filename;
mod links;

// Re-export main functions
pub use domain::{extract_domain, network_location, same_host};
pub use filename::{document_file_name, page_file_stem, sanitize_filename};
pub use links::{is_document_link, parse_seed, resolve_link, DOCUMENT_EXTENSIONS};

use ::url::Url;

/// How the crawler treats a link found on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// PDF/DOC/DOCX file - downloaded directly, never parsed
    Document,
    /// Page on the same network host - crawled recursively
    SameHost,
    /// Anything else - ignored
    External,
}

/// Classifies a link relative to the page it was found on
///
/// Document detection wins over host comparison, so documents on other hosts
/// are still downloaded.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ton_harvest::url::{classify_link, LinkKind};
///
/// let page = Url::parse("https://ton.org/docs").unwrap();
/// let pdf = Url::parse("https://cdn.example.com/ton.pdf").unwrap();
/// let next = Url::parse("https://ton.org/ru/mini-apps").unwrap();
/// let away = Url::parse("https://github.com/ton-blockchain").unwrap();
///
/// assert_eq!(classify_link(&pdf, &page), LinkKind::Document);
/// assert_eq!(classify_link(&next, &page), LinkKind::SameHost);
/// assert_eq!(classify_link(&away, &page), LinkKind::External);
/// ```
pub fn classify_link(link: &Url, page: &Url) -> LinkKind {
    if is_document_link(link) {
        LinkKind::Document
    } else if same_host(link, page) {
        LinkKind::SameHost
    } else {
        LinkKind::External
    }
}
